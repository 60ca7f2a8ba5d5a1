//! Age-driven rhythm patterns for arpeggios

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inter-note spacing in seconds, indexed by pattern
pub const ARPEGGIO_INTERVALS: [f64; 5] = [0.214, 0.316, 0.5, 0.75, 1.2];

/// Spacing used for an index outside the table
pub const DEFAULT_INTERVAL: f64 = 0.5;

/// Shortest note an arpeggio will emit, in seconds
pub const MIN_NOTE_SECS: f64 = 0.1;

/// Rhythm pattern selected from a building age class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmPattern(usize);

impl RhythmPattern {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }

    /// Seconds between consecutive arpeggio notes
    pub fn interval(&self) -> f64 {
        ARPEGGIO_INTERVALS
            .get(self.0)
            .copied()
            .unwrap_or(DEFAULT_INTERVAL)
    }

    /// Length of each arpeggio note in seconds
    pub fn note_duration(&self) -> f64 {
        (self.interval() * 0.8).max(MIN_NOTE_SECS)
    }

    /// Offset of the `n`th note from the arpeggio start
    pub fn offset(&self, n: usize) -> f64 {
        n as f64 * self.interval()
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            0 => "rapid staccato",
            1 => "sparse staccato",
            2 => "stable pulse",
            3 => "semi-sustained flow",
            4 => "sustained drone",
            _ => "stable pulse",
        }
    }
}

impl fmt::Display for RhythmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3}s)", self.label(), self.interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals() {
        assert_eq!(RhythmPattern::new(0).interval(), 0.214);
        assert_eq!(RhythmPattern::new(2).interval(), 0.5);
        assert_eq!(RhythmPattern::new(4).interval(), 1.2);
        assert_eq!(RhythmPattern::new(9).interval(), DEFAULT_INTERVAL);
    }

    #[test]
    fn test_note_duration_has_floor() {
        let fast = RhythmPattern::new(0);
        assert!((fast.note_duration() - 0.1712).abs() < 1e-9);
        assert!((RhythmPattern::new(4).note_duration() - 0.96).abs() < 1e-9);
        assert!(fast.note_duration() >= MIN_NOTE_SECS);
    }

    #[test]
    fn test_offsets() {
        let p = RhythmPattern::new(3);
        assert_eq!(p.offset(0), 0.0);
        assert_eq!(p.offset(2), 1.5);
    }
}
