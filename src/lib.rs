//! mapsonic - Sonify and glyph-annotate urban map features
//!
//! Turns map exploration into sound and small symbolic glyphs. Heights become
//! octaves and loudness, ages become rhythm, land-use mixes become
//! instruments, street types become chords and glyph shapes.

pub mod config;
pub mod feature;
pub mod mapping;
pub mod engine;
pub mod glyph;
pub mod gate;

pub use config::MapsonicConfig;
pub use gate::Session;
