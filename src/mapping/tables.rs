//! Compiled-in bucket tables for height and age

use super::classifier::{Bucket, BucketTable};

const INF: f64 = f64::INFINITY;

/// Octave shift and loudness derived from building height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightTone {
    pub octave_shift: i32,
    /// Relative loudness; values above 1.0 are boosts, log-mapped at the backend
    pub volume: f64,
}

impl HeightTone {
    pub const fn new(octave_shift: i32, volume: f64) -> Self {
        Self {
            octave_shift,
            volume,
        }
    }
}

/// Building height (m) to glyph size in viewport units
pub const HEIGHT_SIZE: BucketTable<f64> = BucketTable::new(
    "height_size",
    &[
        Bucket::new(0.0, 6.0, 16.5),
        Bucket::new(6.0, 15.0, 31.0),
        Bucket::new(15.0, 27.0, 46.0),
        Bucket::new(27.0, 50.0, 62.0),
        Bucket::new(50.0, INF, 78.0),
    ],
    24.0,
);

/// Building height (m) to octave shift and volume
pub const HEIGHT_TONE: BucketTable<HeightTone> = BucketTable::new(
    "height_tone",
    &[
        Bucket::new(0.0, 6.0, HeightTone::new(-1, 0.3)),
        Bucket::new(6.0, 15.0, HeightTone::new(-1, 0.9)),
        Bucket::new(15.0, 27.0, HeightTone::new(0, 0.9)),
        Bucket::new(27.0, 50.0, HeightTone::new(0, 2.2)),
        Bucket::new(50.0, INF, HeightTone::new(1, 3.0)),
    ],
    HeightTone::new(0, 0.9),
);

/// Building height (m) to the single note played on the height layer
pub const HEIGHT_NOTE: BucketTable<&'static str> = BucketTable::new(
    "height_note",
    &[
        Bucket::new(0.0, 6.0, "C3"),
        Bucket::new(6.0, 15.0, "E3"),
        Bucket::new(15.0, 27.0, "G3"),
        Bucket::new(27.0, 50.0, "B3"),
        Bucket::new(50.0, INF, "C4"),
    ],
    "C4",
);

/// Building height (m) to vertical panning
///
/// Two of the steps sit outside `-1..1`; callers clamp when building a descriptor.
pub const HEIGHT_PANNING: BucketTable<f64> = BucketTable::new(
    "height_panning",
    &[
        Bucket::new(0.0, 3.0, -2.0),
        Bucket::new(3.0, 6.0, -0.6),
        Bucket::new(6.0, 10.0, -0.2),
        Bucket::new(10.0, 14.5, 0.0),
        Bucket::new(14.5, 20.0, 0.2),
        Bucket::new(20.0, 30.0, 0.65),
        Bucket::new(30.0, 50.0, 2.0),
        Bucket::new(50.0, INF, 1.0),
    ],
    1.0,
);

/// Building height (m) to a tempo in bpm
pub const HEIGHT_TEMPO: BucketTable<f64> = BucketTable::new(
    "height_tempo",
    &[
        Bucket::new(0.0, 6.0, 75.0),
        Bucket::new(6.0, 15.0, 85.0),
        Bucket::new(15.0, 27.0, 90.0),
        Bucket::new(27.0, 50.0, 95.0),
        Bucket::new(50.0, INF, 100.0),
    ],
    100.0,
);

/// Building age (years) to glyph alpha
pub const AGE_ALPHA: BucketTable<f64> = BucketTable::new(
    "age_alpha",
    &[
        Bucket::new(0.0, 25.0, 0.28),
        Bucket::new(25.0, 65.0, 0.46),
        Bucket::new(65.0, 135.0, 0.64),
        Bucket::new(135.0, 190.0, 0.82),
        Bucket::new(190.0, INF, 1.0),
    ],
    0.44,
);

/// Building age (years) to rhythm pattern index
pub const AGE_PATTERN: BucketTable<usize> = BucketTable::new(
    "age_pattern",
    &[
        Bucket::new(0.0, 25.0, 0),
        Bucket::new(25.0, 65.0, 1),
        Bucket::new(65.0, 135.0, 2),
        Bucket::new(135.0, 190.0, 3),
        Bucket::new(190.0, INF, 4),
    ],
    0,
);

/// Building age (years) to the single note played on the age layer
pub const AGE_NOTE: BucketTable<&'static str> = BucketTable::new(
    "age_note",
    &[
        Bucket::new(0.0, 25.0, "C4"),
        Bucket::new(25.0, 65.0, "E4"),
        Bucket::new(65.0, 135.0, "G4"),
        Bucket::new(135.0, 190.0, "B4"),
        Bucket::new(190.0, INF, "C5"),
    ],
    "C5",
);

/// Gain in dB for a single building on the height layer
pub fn height_gain_db(height: f64) -> f64 {
    (-20.0 + height / 2.0).min(-5.0)
}

/// Reverb wetness for a single building on the age layer
pub fn age_reverb_wet(age: f64) -> f64 {
    (0.2 + age / 100.0).min(0.9)
}

/// Street segment length (m) to tempo in bpm
pub fn street_tempo(length: f64) -> f64 {
    (140.0 - length / 2.0).max(80.0)
}
