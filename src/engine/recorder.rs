//! Cue sheet recorder
//!
//! An audio backend that plays nothing and records every request instead.
//! The cue sheet can be written as JSON lines for offline inspection.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use super::backend::{AudioBackend, AudioError, NoteTrigger};
use crate::mapping::Instrument;

/// A scheduled note as recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteCue {
    /// Backend time in seconds
    pub time: f64,
    pub instrument: Instrument,
    pub notes: Vec<String>,
    pub duration: f64,
    pub velocity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_db: Option<f64>,
}

/// One line of the cue sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Cue {
    Note(NoteCue),
    Panning { time: f64, y: f64 },
    Reverb { time: f64, wet: f64 },
    Tempo { time: f64, bpm: f64 },
    Stop { time: f64 },
}

/// Recording audio backend driven by a manual clock
#[derive(Debug, Clone)]
pub struct CueRecorder {
    clock: f64,
    ready: bool,
    unloaded: HashSet<Instrument>,
    failing: HashSet<String>,
    cues: Vec<Cue>,
}

impl Default for CueRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CueRecorder {
    /// A started backend with every sampler loaded
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            ready: true,
            unloaded: HashSet::new(),
            failing: HashSet::new(),
            cues: Vec::new(),
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn set_loaded(&mut self, instrument: Instrument, loaded: bool) {
        if loaded {
            self.unloaded.remove(&instrument);
        } else {
            self.unloaded.insert(instrument);
        }
    }

    /// Make every trigger containing `note` fail
    pub fn fail_note(&mut self, note: &str) {
        self.failing.insert(note.to_string());
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Recorded notes in scheduling order
    pub fn notes(&self) -> Vec<NoteCue> {
        self.cues
            .iter()
            .filter_map(|c| match c {
                Cue::Note(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last tempo set, if any
    pub fn tempo(&self) -> Option<f64> {
        self.cues.iter().rev().find_map(|c| match c {
            Cue::Tempo { bpm, .. } => Some(*bpm),
            _ => None,
        })
    }

    /// Last panning set, if any
    pub fn panning(&self) -> Option<f64> {
        self.cues.iter().rev().find_map(|c| match c {
            Cue::Panning { y, .. } => Some(*y),
            _ => None,
        })
    }

    pub fn reverb_wet(&self) -> Option<f64> {
        self.cues.iter().rev().find_map(|c| match c {
            Cue::Reverb { wet, .. } => Some(*wet),
            _ => None,
        })
    }

    pub fn stop_count(&self) -> usize {
        self.cues
            .iter()
            .filter(|c| matches!(c, Cue::Stop { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }

    /// Write the cue sheet, one JSON object per line
    pub fn write_jsonl(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create cue sheet: {:?}", path))?;
        let mut writer = BufWriter::new(file);
        for cue in &self.cues {
            serde_json::to_writer(&mut writer, cue).context("failed to encode cue")?;
            writer.write_all(b"\n").context("failed to write cue")?;
        }
        writer.flush().context("failed to flush cue sheet")?;
        Ok(())
    }
}

impl AudioBackend for CueRecorder {
    fn now(&self) -> f64 {
        self.clock
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn is_loaded(&self, instrument: Instrument) -> bool {
        !self.unloaded.contains(&instrument)
    }

    fn trigger(&mut self, note: &NoteTrigger) -> Result<(), AudioError> {
        if let Some(bad) = note.notes.iter().find(|n| self.failing.contains(*n)) {
            return Err(AudioError::Trigger {
                instrument: note.instrument,
                note: bad.clone(),
                reason: "no buffer for note".to_string(),
            });
        }
        self.cues.push(Cue::Note(NoteCue {
            time: note.at.unwrap_or(self.clock),
            instrument: note.instrument,
            notes: note.notes.clone(),
            duration: note.duration,
            velocity: note.velocity,
            gain_db: note.gain_db,
        }));
        Ok(())
    }

    fn set_panning(&mut self, y: f64) -> Result<(), AudioError> {
        self.cues.push(Cue::Panning { time: self.clock, y });
        Ok(())
    }

    fn set_reverb_wet(&mut self, wet: f64) -> Result<(), AudioError> {
        self.cues.push(Cue::Reverb { time: self.clock, wet });
        Ok(())
    }

    fn set_tempo(&mut self, bpm: f64) -> Result<(), AudioError> {
        self.cues.push(Cue::Tempo { time: self.clock, bpm });
        Ok(())
    }

    fn stop_all(&mut self) {
        self.cues.push(Cue::Stop { time: self.clock });
    }

    fn sync(&mut self, elapsed: Duration) {
        self.clock = elapsed.as_secs_f64();
    }
}
