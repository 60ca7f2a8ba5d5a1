//! Audio collaborator interface

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::mapping::Instrument;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio backend is not ready")]
    NotReady,
    #[error("no sampler loaded for {0}")]
    NotLoaded(Instrument),
    #[error("failed to play {note} on {instrument}: {reason}")]
    Trigger {
        instrument: Instrument,
        note: String,
        reason: String,
    },
    #[error("MIDI error: {0}")]
    Midi(String),
}

/// A single attack-release request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTrigger {
    pub instrument: Instrument,
    /// One note, or several sounding together
    pub notes: Vec<String>,
    /// Seconds between attack and release
    pub duration: f64,
    /// Absolute backend time in seconds; `None` plays immediately
    pub at: Option<f64>,
    /// Velocity, 1.0 is nominal
    pub velocity: f64,
    /// Instrument gain override in dB for this note
    pub gain_db: Option<f64>,
}

impl NoteTrigger {
    pub fn new(instrument: Instrument, notes: Vec<String>, duration: f64) -> Self {
        Self {
            instrument,
            notes,
            duration,
            at: None,
            velocity: 1.0,
            gain_db: None,
        }
    }

    pub fn at(mut self, time: f64) -> Self {
        self.at = Some(time);
        self
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_gain_db(mut self, gain_db: f64) -> Self {
        self.gain_db = Some(gain_db);
        self
    }
}

/// The synthesis side of the system
///
/// Implementations own the instruments; the dispatcher only requests notes
/// and sets a few global parameters.
pub trait AudioBackend {
    /// Current backend time in seconds
    fn now(&self) -> f64;

    /// The audio context has started
    fn is_ready(&self) -> bool;

    /// Samples for `instrument` have finished loading
    fn is_loaded(&self, instrument: Instrument) -> bool;

    fn trigger(&mut self, note: &NoteTrigger) -> Result<(), AudioError>;

    /// Vertical listener position, `-1..1`
    fn set_panning(&mut self, y: f64) -> Result<(), AudioError>;

    /// Reverb wetness on the melodic synth, `0..1`
    fn set_reverb_wet(&mut self, wet: f64) -> Result<(), AudioError>;

    /// Transport tempo in bpm
    fn set_tempo(&mut self, bpm: f64) -> Result<(), AudioError>;

    /// Release every sounding note
    fn stop_all(&mut self);

    /// Align the backend clock with session time
    fn sync(&mut self, _elapsed: Duration) {}
}
