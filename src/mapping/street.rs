//! Street-network types and dominance

use serde::{Deserialize, Serialize};
use std::fmt;

use super::chord::chord_of;
use super::visual::{DotPosition, Orientation, ShapeKind};
use crate::feature::FeatureAttributes;

/// Chord played when the street metric is switched off
pub const FLAT_CHORD: [&str; 4] = ["C4", "C4", "C4", "C4"];

/// Chord for a street type without its own design
pub const FALLBACK_CHORD: [&str; 3] = ["C4", "E4", "G4"];

/// Street-network morphology class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreetType {
    T12,
    T22,
    T23,
    T24,
    T25,
    T31,
    T41,
    T42,
}

impl StreetType {
    /// Declaration order; dominance ties resolve to the earliest entry
    pub const ALL: [StreetType; 8] = [
        StreetType::T12,
        StreetType::T22,
        StreetType::T23,
        StreetType::T24,
        StreetType::T25,
        StreetType::T31,
        StreetType::T41,
        StreetType::T42,
    ];

    /// Block attribute carrying this type's score
    pub fn key(&self) -> &'static str {
        match self {
            StreetType::T12 => "t12",
            StreetType::T22 => "t22",
            StreetType::T23 => "t23",
            StreetType::T24 => "t24",
            StreetType::T25 => "t25",
            StreetType::T31 => "t31",
            StreetType::T41 => "t41",
            StreetType::T42 => "t42",
        }
    }

    /// Legend label, e.g. `"Type 2-3"`
    pub fn label(&self) -> &'static str {
        match self {
            StreetType::T12 => "Type 1-2",
            StreetType::T22 => "Type 2-2",
            StreetType::T23 => "Type 2-3",
            StreetType::T24 => "Type 2-4",
            StreetType::T25 => "Type 2-5",
            StreetType::T31 => "Type 3-1",
            StreetType::T41 => "Type 4-1",
            StreetType::T42 => "Type 4-2",
        }
    }

    /// Resolve a free-form type string such as `"Type 2-2"`
    ///
    /// Matches on the `a-b` fragment; anything unrecognised is `T12`.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| {
                let fragment = &t.label()["Type ".len()..];
                label.contains(fragment)
            })
            .unwrap_or(StreetType::T12)
    }

    /// Chord design for this type, if it has one
    pub fn chord_design(&self) -> Option<&'static [&'static str]> {
        match self {
            StreetType::T12 => Some(&["C4", "E4", "G4", "C5"] as &[&str]),
            StreetType::T22 => Some(&["F4", "A4", "D5", "Bb4"] as &[&str]),
            StreetType::T23 => Some(&["Eb4", "G4", "Bb4", "C5"] as &[&str]),
            StreetType::T24 => Some(&["E4", "C4", "F#4", "A4"] as &[&str]),
            StreetType::T25 => None,
            StreetType::T31 => Some(&["D4", "Bb4", "F#4", "G4"] as &[&str]),
            StreetType::T41 => Some(&["Bb3", "D4", "G4", "A4"] as &[&str]),
            StreetType::T42 => Some(&["C5", "A4", "F#4", "D4"] as &[&str]),
        }
    }

    pub fn chord(&self) -> Vec<String> {
        chord_of(self.chord_design().unwrap_or(&FALLBACK_CHORD))
    }

    pub fn shape(&self) -> ShapeKind {
        match self {
            StreetType::T12 => ShapeKind::Rect,
            StreetType::T22 => ShapeKind::Circle(Some(DotPosition::Top)),
            StreetType::T23 => ShapeKind::Circle(Some(DotPosition::Right)),
            StreetType::T24 => ShapeKind::Circle(Some(DotPosition::Bottom)),
            StreetType::T25 => ShapeKind::Circle(Some(DotPosition::Left)),
            StreetType::T31 => ShapeKind::Parallelogram,
            StreetType::T41 => ShapeKind::Triangle(Orientation::Up),
            StreetType::T42 => ShapeKind::Triangle(Orientation::Down),
        }
    }
}

impl fmt::Display for StreetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Street-type scores of one block
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreetScores {
    scores: [f64; 8],
}

impl StreetScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a score (builder pattern)
    pub fn with(mut self, street: StreetType, score: f64) -> Self {
        self.set(street, score);
        self
    }

    pub fn set(&mut self, street: StreetType, score: f64) {
        if let Some(i) = StreetType::ALL.iter().position(|t| *t == street) {
            self.scores[i] = score;
        }
    }

    pub fn get(&self, street: StreetType) -> f64 {
        StreetType::ALL
            .iter()
            .position(|t| *t == street)
            .map(|i| self.scores[i])
            .unwrap_or(0.0)
    }

    /// Read the `t12`..`t42` attributes; missing or malformed scores are zero
    pub fn from_attributes(attrs: &FeatureAttributes) -> Self {
        let mut scores = Self::new();
        for street in StreetType::ALL {
            scores.set(street, attrs.number_or(street.key(), 0.0));
        }
        scores
    }

    /// Highest-scoring type; ties go to the earliest declared
    pub fn dominant(&self) -> StreetType {
        let mut best = StreetType::T12;
        let mut best_score = -1.0;
        for (street, score) in StreetType::ALL.iter().zip(self.scores) {
            if score > best_score {
                best_score = score;
                best = *street;
            }
        }
        best
    }

    /// Chord of the dominant type
    pub fn chord(&self) -> Vec<String> {
        self.dominant().chord()
    }
}
