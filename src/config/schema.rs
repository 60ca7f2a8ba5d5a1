//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gate::ToggleSnapshot;
use crate::mapping::ARPEGGIO_INTERVALS;

/// Main configuration for mapsonic
///
/// Every section is optional; an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapsonicConfig {
    /// Debounce, recheck and display windows
    #[serde(default)]
    pub timing: TimingConfig,

    /// Sound dispatch settings
    #[serde(default)]
    pub audio: AudioSettings,

    /// MIDI output
    #[serde(default)]
    pub midi: MidiSettings,

    /// UI toggles at startup
    #[serde(default)]
    pub toggles: ToggleSnapshot,
}

impl MapsonicConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if t.hover_interval_ms == 0 {
            bail!("Hover interval must be greater than 0 ms");
        }
        if t.glyph_visible_ms == 0 {
            bail!("Glyph display window must be greater than 0 ms");
        }
        if t.retry_delay_ms == 0 && t.max_retries > 0 {
            bail!("Retry delay must be greater than 0 ms when retries are enabled");
        }

        let a = &self.audio;
        if a.tempo_bpm < 20.0 || a.tempo_bpm > 300.0 {
            bail!("Tempo must be between 20 and 300 bpm");
        }
        if a.layer_stagger < 0.0 {
            bail!("Layer stagger must not be negative");
        }
        if a.fallback_volume < 0.0 || a.fallback_volume > 1.0 {
            bail!("Fallback volume must be between 0.0 and 1.0");
        }
        if a.sample_duration <= 0.0 {
            bail!("Sample duration must be greater than 0");
        }
        if a.age_disabled_pattern >= ARPEGGIO_INTERVALS.len() {
            bail!(
                "Age-disabled pattern must be below {}, got {}",
                ARPEGGIO_INTERVALS.len(),
                a.age_disabled_pattern
            );
        }

        if self.midi.velocity_scale <= 0.0 || self.midi.velocity_scale > 1.0 {
            bail!("MIDI velocity scale must be in (0.0, 1.0]");
        }

        Ok(())
    }
}

/// Timer windows, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Hover throttle window (default: 200)
    #[serde(default = "default_hover_interval")]
    pub hover_interval_ms: u64,

    /// Delay between the throttle firing and the feature lookup (default: 50)
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Delay before re-querying a layer the pointer left (default: 50)
    #[serde(default = "default_exit_recheck")]
    pub exit_recheck_ms: u64,

    /// How long a glyph stays fully visible (default: 3500)
    #[serde(default = "default_glyph_visible")]
    pub glyph_visible_ms: u64,

    /// Glyph fade-out length (default: 800)
    #[serde(default = "default_glyph_fade")]
    pub glyph_fade_ms: u64,

    /// Sound indicator display time (default: 1000)
    #[serde(default = "default_indicator")]
    pub indicator_ms: u64,

    /// Retry delay while the map style is loading (default: 200)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Retries before a deferred update is dropped (default: 25)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_hover_interval() -> u64 { 200 }
fn default_settle_delay() -> u64 { 50 }
fn default_exit_recheck() -> u64 { 50 }
fn default_glyph_visible() -> u64 { 3500 }
fn default_glyph_fade() -> u64 { 800 }
fn default_indicator() -> u64 { 1000 }
fn default_retry_delay() -> u64 { 200 }
fn default_max_retries() -> u32 { 25 }

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hover_interval_ms: default_hover_interval(),
            settle_delay_ms: default_settle_delay(),
            exit_recheck_ms: default_exit_recheck(),
            glyph_visible_ms: default_glyph_visible(),
            glyph_fade_ms: default_glyph_fade(),
            indicator_ms: default_indicator(),
            retry_delay_ms: default_retry_delay(),
            max_retries: default_max_retries(),
        }
    }
}

impl TimingConfig {
    pub fn hover_interval(&self) -> Duration {
        Duration::from_millis(self.hover_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn exit_recheck(&self) -> Duration {
        Duration::from_millis(self.exit_recheck_ms)
    }

    pub fn glyph_visible(&self) -> Duration {
        Duration::from_millis(self.glyph_visible_ms)
    }

    pub fn glyph_fade(&self) -> Duration {
        Duration::from_millis(self.glyph_fade_ms)
    }

    pub fn indicator(&self) -> Duration {
        Duration::from_millis(self.indicator_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Sound dispatch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Tempo used for note-value durations such as eighth notes (default: 120)
    #[serde(default = "default_tempo")]
    pub tempo_bpm: f64,

    /// Seconds between land-use instrument entrances (default: 0.3)
    #[serde(default = "default_layer_stagger")]
    pub layer_stagger: f64,

    /// Block volume when the height metric is off (default: 0.8)
    #[serde(default = "default_fallback_volume")]
    pub fallback_volume: f64,

    /// Play a short bip when entering a new city block (default: true)
    #[serde(default = "default_hover_bip")]
    pub hover_bip: bool,

    /// Rhythm pattern used when the age metric is off (default: 3)
    #[serde(default = "default_age_disabled_pattern")]
    pub age_disabled_pattern: usize,

    /// Length of a sampled one-shot in seconds (default: 0.8)
    #[serde(default = "default_sample_duration")]
    pub sample_duration: f64,
}

fn default_tempo() -> f64 { 120.0 }
fn default_layer_stagger() -> f64 { 0.3 }
fn default_fallback_volume() -> f64 { 0.8 }
fn default_hover_bip() -> bool { true }
fn default_age_disabled_pattern() -> usize { 3 }
fn default_sample_duration() -> f64 { 0.8 }

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            tempo_bpm: default_tempo(),
            layer_stagger: default_layer_stagger(),
            fallback_volume: default_fallback_volume(),
            hover_bip: default_hover_bip(),
            age_disabled_pattern: default_age_disabled_pattern(),
            sample_duration: default_sample_duration(),
        }
    }
}

/// MIDI output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiSettings {
    /// Output port name fragment (None = first port)
    #[serde(default)]
    pub port: Option<String>,

    /// Multiplier applied to every note velocity (default: 1.0)
    #[serde(default = "default_velocity_scale")]
    pub velocity_scale: f64,
}

fn default_velocity_scale() -> f64 { 1.0 }

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            port: None,
            velocity_scale: default_velocity_scale(),
        }
    }
}
