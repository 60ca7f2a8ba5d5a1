//! Mapping system for turning feature attributes into sound and glyph parameters
//!
//! Classifiers bucket scalar attributes; mappers combine their outputs into
//! chords, instrument voices and visual descriptors.

mod chord;
mod classifier;
mod cluster;
mod instrument;
mod land_use;
mod metrics;
mod rhythm;
mod street;
mod tables;
mod visual;

pub use chord::{
    chord_of, height_adjusted_chord, transpose_chord, Accidental, AdjustedChord, Note,
    NoteParseError,
};
pub use classifier::{Bucket, BucketTable, Classifier};
pub use cluster::{cluster_chord, cluster_color, FALLBACK_CLUSTER_COLOR};
pub use instrument::Instrument;
pub use land_use::{InstrumentVoice, LandUse, LandUseMix, LandUseShare};
pub use metrics::MetricSet;
pub use rhythm::{RhythmPattern, ARPEGGIO_INTERVALS};
pub use street::{StreetScores, StreetType, FALLBACK_CHORD, FLAT_CHORD};
pub use tables::{
    age_reverb_wet, height_gain_db, street_tempo, HeightTone, AGE_ALPHA, AGE_NOTE, AGE_PATTERN,
    HEIGHT_NOTE, HEIGHT_PANNING, HEIGHT_SIZE, HEIGHT_TEMPO, HEIGHT_TONE,
};
pub use visual::{
    ColorSlice, DotPosition, FillMode, Orientation, ShapeKind, VisualDescriptor, STROKE_WIDTH,
};
