//! Instruments and their sample maps

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical sound source on the audio backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    // Sampled
    Bass,
    Bassoon,
    Flute,
    Glockens,
    Oboe,
    Piano,
    Trumpet,
    Violin,
    Xylo,
    Hangdrum,
    Organ,
    // Synthesised
    Melodic,
    Fm,
    Membrane,
    Bip,
}

impl Instrument {
    pub const ALL: [Instrument; 15] = [
        Instrument::Bass,
        Instrument::Bassoon,
        Instrument::Flute,
        Instrument::Glockens,
        Instrument::Oboe,
        Instrument::Piano,
        Instrument::Trumpet,
        Instrument::Violin,
        Instrument::Xylo,
        Instrument::Hangdrum,
        Instrument::Organ,
        Instrument::Melodic,
        Instrument::Fm,
        Instrument::Membrane,
        Instrument::Bip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Bass => "bass",
            Instrument::Bassoon => "bassoon",
            Instrument::Flute => "flute",
            Instrument::Glockens => "glockens",
            Instrument::Oboe => "oboe",
            Instrument::Piano => "piano",
            Instrument::Trumpet => "trumpet",
            Instrument::Violin => "violin",
            Instrument::Xylo => "xylo",
            Instrument::Hangdrum => "hangdrum",
            Instrument::Organ => "organ",
            Instrument::Melodic => "melodic",
            Instrument::Fm => "fm",
            Instrument::Membrane => "membrane",
            Instrument::Bip => "bip",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }

    /// Note-to-file table for sampled instruments
    pub fn samples(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Instrument::Bass => &[("Db4", "db4.wav"), ("G4", "g4.wav")],
            Instrument::Bassoon => &[("C4", "c4.wav"), ("E4", "e4.wav"), ("C5", "c5.wav")],
            Instrument::Flute => &[("C4", "c4.wav"), ("E5", "e5.wav")],
            Instrument::Glockens => &[("G4", "g4.wav"), ("C5", "c5.wav"), ("C6", "c6.wav")],
            Instrument::Oboe => &[("D4", "d4.wav"), ("F5", "f5.wav")],
            Instrument::Piano => &[("C4", "c4.wav"), ("G5", "g5.wav")],
            Instrument::Trumpet => &[("D5", "d5.wav"), ("C6", "c6.wav")],
            Instrument::Violin => &[("C4", "c4.wav"), ("G4", "g4.wav"), ("E5", "e5.wav")],
            Instrument::Xylo => &[("C4", "c4.wav"), ("G5", "g5.wav")],
            Instrument::Hangdrum => &[("C4", "c4.wav"), ("Eb4", "eb4.wav"), ("B4", "b4.wav")],
            Instrument::Organ => &[("C4", "c4.wav"), ("Eb5", "eb5.wav")],
            Instrument::Melodic | Instrument::Fm | Instrument::Membrane | Instrument::Bip => &[],
        }
    }

    pub fn is_sampled(&self) -> bool {
        !self.samples().is_empty()
    }

    /// Relative sample URLs, `sounds/<instrument>/<file>`
    pub fn sample_urls(&self) -> Vec<(&'static str, String)> {
        self.samples()
            .iter()
            .map(|(note, file)| (*note, format!("sounds/{}/{}", self.name(), file)))
            .collect()
    }

    /// General MIDI program used when rendering through MIDI
    pub fn gm_program(&self) -> u8 {
        match self {
            Instrument::Piano => 0,
            Instrument::Fm => 4,
            Instrument::Bip => 8,
            Instrument::Glockens => 9,
            Instrument::Xylo => 13,
            Instrument::Organ => 19,
            Instrument::Bass => 32,
            Instrument::Violin => 40,
            Instrument::Trumpet => 56,
            Instrument::Oboe => 68,
            Instrument::Bassoon => 70,
            Instrument::Flute => 73,
            Instrument::Melodic => 80,
            Instrument::Hangdrum => 114,
            Instrument::Membrane => 0,
        }
    }

    /// MIDI channel; the membrane synth goes to the GM percussion channel
    pub fn midi_channel(&self) -> u8 {
        if *self == Instrument::Membrane {
            return 9;
        }
        let idx = Self::ALL
            .iter()
            .filter(|i| **i != Instrument::Membrane)
            .position(|i| i == self)
            .unwrap_or(0) as u8;
        if idx >= 9 {
            idx + 1
        } else {
            idx
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_name_round_trip() {
        for i in Instrument::ALL {
            assert_eq!(Instrument::from_name(i.name()), Some(i));
        }
        assert_eq!(Instrument::from_name("kazoo"), None);
    }

    #[test]
    fn test_sample_urls() {
        let urls = Instrument::Bass.sample_urls();
        assert_eq!(urls[0], ("Db4", "sounds/bass/db4.wav".to_string()));
        assert!(!Instrument::Melodic.is_sampled());
        assert!(Instrument::Hangdrum.is_sampled());
    }

    #[test]
    fn test_midi_channels_unique() {
        let channels: HashSet<u8> = Instrument::ALL.iter().map(|i| i.midi_channel()).collect();
        assert_eq!(channels.len(), Instrument::ALL.len());
        assert!(channels.iter().all(|c| *c < 16));
        assert_eq!(Instrument::Membrane.midi_channel(), 9);
    }

    #[test]
    fn test_serde_lowercase() {
        let i: Instrument = serde_yaml::from_str("glockens").unwrap();
        assert_eq!(i, Instrument::Glockens);
    }
}
