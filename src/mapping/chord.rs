//! Note tokens and chord transposition

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::tables::HEIGHT_TONE;
use super::Classifier;

/// Failure to parse a note token such as `"Bb4"`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteParseError {
    #[error("empty note token")]
    Empty,
    #[error("invalid note letter in '{0}'")]
    Letter(String),
    #[error("missing or invalid octave in '{0}'")]
    Octave(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    Sharp,
    Flat,
}

/// A pitch class plus octave, e.g. `F#4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    letter: char,
    accidental: Option<Accidental>,
    octave: i32,
}

impl Note {
    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn accidental(&self) -> Option<Accidental> {
        self.accidental
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Shift by whole octaves
    pub fn transpose(self, octaves: i32) -> Self {
        Self {
            octave: self.octave + octaves,
            ..self
        }
    }

    /// MIDI note number with C4 = 60, if it fits in 0..=127
    pub fn midi_number(&self) -> Option<u8> {
        let base = match self.letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let alter = match self.accidental {
            Some(Accidental::Sharp) => 1,
            Some(Accidental::Flat) => -1,
            None => 0,
        };
        let n = (self.octave + 1) * 12 + base + alter;
        u8::try_from(n).ok().filter(|n| *n <= 127)
    }
}

impl FromStr for Note {
    type Err = NoteParseError;

    /// Accepts `[A-Ga-g](#|b)?[0-9]+`; the letter is normalised to upper case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let first = chars.next().ok_or(NoteParseError::Empty)?;
        let letter = first.to_ascii_uppercase();
        if !('A'..='G').contains(&letter) {
            return Err(NoteParseError::Letter(s.to_string()));
        }

        let rest = chars.as_str();
        let (accidental, digits) = match rest.chars().next() {
            Some('#') => (Some(Accidental::Sharp), &rest[1..]),
            Some('b') => (Some(Accidental::Flat), &rest[1..]),
            _ => (None, rest),
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(NoteParseError::Octave(s.to_string()));
        }
        let octave = digits
            .parse::<i32>()
            .map_err(|_| NoteParseError::Octave(s.to_string()))?;

        Ok(Self {
            letter,
            accidental,
            octave,
        })
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let acc = match self.accidental {
            Some(Accidental::Sharp) => "#",
            Some(Accidental::Flat) => "b",
            None => "",
        };
        write!(f, "{}{}{}", self.letter, acc, self.octave)
    }
}

/// Transpose every token by `octaves`; tokens that fail to parse pass through unchanged
pub fn transpose_chord<S: AsRef<str>>(chord: &[S], octaves: i32) -> Vec<String> {
    chord
        .iter()
        .map(|token| {
            let token = token.as_ref();
            match token.parse::<Note>() {
                Ok(note) => note.transpose(octaves).to_string(),
                Err(_) => token.to_string(),
            }
        })
        .collect()
}

/// Chord shifted by the height class, plus the resolved loudness
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedChord {
    pub notes: Vec<String>,
    pub volume: f64,
}

/// Apply the height table's octave shift and volume to `chord`
pub fn height_adjusted_chord<S: AsRef<str>>(chord: &[S], height: f64) -> AdjustedChord {
    let tone = HEIGHT_TONE.classify(height);
    AdjustedChord {
        notes: transpose_chord(chord, tone.octave_shift),
        volume: tone.volume,
    }
}

/// Owned chord from a static table row
pub fn chord_of(notes: &[&str]) -> Vec<String> {
    notes.iter().map(|n| n.to_string()).collect()
}
