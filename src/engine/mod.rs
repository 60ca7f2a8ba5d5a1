//! Sound dispatch for mapsonic
//!
//! Routes a feature's layer and attributes to a sound plan and plays it on
//! an [`AudioBackend`]. Every backend failure is caught and logged here so
//! nothing propagates back into the pointer pipeline.

mod backend;
mod midi;
mod recorder;
mod sound;

pub use backend::{AudioBackend, AudioError, NoteTrigger};
pub use midi::{default_port_name, list_midi_ports, velocity_byte, MidiBackend, MidiMessage};
pub use recorder::{Cue, CueRecorder, NoteCue};
pub use sound::{
    bip, cluster, plan, sample_gain_db, NoteLength, Playback, SoundDescriptor,
    CLUSTER_CHORD_SECS, FALLBACK_NOTES, SAMPLE_NOTE,
};

use tracing::{debug, error, warn};

use crate::config::AudioSettings;
use crate::feature::{FeatureAttributes, LayerKind};
use crate::mapping::MetricSet;

/// Plays sound plans on an audio backend
pub struct SoundDispatcher<A: AudioBackend> {
    backend: A,
    settings: AudioSettings,
    active: bool,
    tempo_bpm: f64,
}

impl<A: AudioBackend> SoundDispatcher<A> {
    pub fn new(backend: A, settings: AudioSettings) -> Self {
        let tempo_bpm = settings.tempo_bpm;
        Self {
            backend,
            settings,
            active: true,
            tempo_bpm,
        }
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut A {
        &mut self.backend
    }

    pub fn into_backend(self) -> A {
        self.backend
    }

    /// Current transport tempo; street segments change it
    pub fn tempo(&self) -> f64 {
        self.tempo_bpm
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or silence the dispatcher; silencing stops every sounding note
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.backend.stop_all();
        }
    }

    pub fn stop_all(&mut self) {
        self.backend.stop_all();
    }

    /// Sounds a feature on `layer` would make, without playing them
    pub fn plan(
        &self,
        layer: LayerKind,
        attrs: &FeatureAttributes,
        metrics: &MetricSet,
    ) -> Vec<SoundDescriptor> {
        plan(layer, attrs, metrics, &self.settings)
    }

    /// Sonify a feature; returns the layer for logging
    pub fn dispatch(
        &mut self,
        layer: LayerKind,
        attrs: &FeatureAttributes,
        metrics: &MetricSet,
    ) -> LayerKind {
        let sounds = self.plan(layer, attrs, metrics);
        if sounds.is_empty() {
            debug!(layer = %layer, "layer has no sound");
            return layer;
        }
        debug!(layer = %layer, sounds = sounds.len(), "dispatching");
        self.play_all(&sounds);
        layer
    }

    /// Sonify a feature by map layer identifier; unknown ids are ignored
    pub fn dispatch_id(
        &mut self,
        layer_id: &str,
        attrs: &FeatureAttributes,
        metrics: &MetricSet,
    ) -> Option<LayerKind> {
        match LayerKind::from_id(layer_id) {
            Some(layer) => Some(self.dispatch(layer, attrs, metrics)),
            None => {
                debug!(layer = layer_id, "no sonification for layer");
                None
            }
        }
    }

    /// Cluster triad for `id`
    pub fn play_cluster(&mut self, id: &str) {
        self.play_all(&[cluster(id)]);
    }

    /// Block-entry tick
    pub fn play_bip(&mut self) {
        self.play_all(&[bip()]);
    }

    /// Play each descriptor, logging failures; returns how many played
    pub fn play_all(&mut self, sounds: &[SoundDescriptor]) -> usize {
        let mut played = 0;
        for sound in sounds {
            match self.play(sound) {
                Ok(true) => played += 1,
                Ok(false) => {}
                Err(e) => warn!(instrument = %sound.instrument, "sound failed: {}", e),
            }
        }
        played
    }

    /// Play one descriptor
    ///
    /// Returns `Ok(false)` when the sound was skipped because the dispatcher
    /// is inactive, the backend has not started, or the sampler is still
    /// loading.
    pub fn play(&mut self, sound: &SoundDescriptor) -> Result<bool, AudioError> {
        if !self.active {
            return Ok(false);
        }
        if !self.backend.is_ready() {
            debug!("audio backend not started, skipping sound");
            return Ok(false);
        }
        if sound.instrument.is_sampled() && !self.backend.is_loaded(sound.instrument) {
            warn!(instrument = %sound.instrument, "sampler not loaded yet");
            return Ok(false);
        }

        if let Some(bpm) = sound.tempo_bpm {
            self.backend.set_tempo(bpm)?;
            self.tempo_bpm = bpm;
        }
        if let Some(y) = sound.panning {
            self.backend.set_panning(y)?;
        }
        if let Some(wet) = sound.reverb_wet {
            self.backend.set_reverb_wet(wet)?;
        }

        let start = self.backend.now() + sound.delay;
        match sound.playback {
            Playback::Block => self.play_block(sound, start)?,
            Playback::Arpeggio => self.play_arpeggio(sound, start),
            Playback::Sample => self.play_sample(sound, start)?,
        }
        Ok(true)
    }

    fn play_block(&mut self, sound: &SoundDescriptor, start: f64) -> Result<(), AudioError> {
        let mut trigger = NoteTrigger::new(
            sound.instrument,
            sound.chord.clone(),
            sound.duration.to_secs(self.tempo_bpm),
        )
        .at(start)
        .with_velocity(sound.velocity.unwrap_or(sound.volume));
        if let Some(db) = sound.gain_db {
            trigger = trigger.with_gain_db(db);
        }
        self.backend.trigger(&trigger)
    }

    /// One note per chord tone at the pattern spacing; a failed note does
    /// not stop the rest
    fn play_arpeggio(&mut self, sound: &SoundDescriptor, start: f64) {
        let Some(pattern) = sound.pattern else {
            warn!(instrument = %sound.instrument, "arpeggio without a rhythm pattern");
            return;
        };
        let duration = sound.duration.to_secs(self.tempo_bpm);
        for (n, note) in sound.chord.iter().enumerate() {
            let trigger = NoteTrigger::new(sound.instrument, vec![note.clone()], duration)
                .at(start + pattern.offset(n))
                .with_velocity(sound.volume);
            if let Err(e) = self.backend.trigger(&trigger) {
                warn!(instrument = %sound.instrument, note = %note, "arpeggio note failed: {}", e);
            }
        }
    }

    /// Sampled one-shot, retrying the fallback notes in order on failure
    fn play_sample(&mut self, sound: &SoundDescriptor, start: f64) -> Result<(), AudioError> {
        let duration = sound.duration.to_secs(self.tempo_bpm);
        let gain = sample_gain_db(sound.volume);
        let first = sound.chord.first().map(String::as_str).unwrap_or(SAMPLE_NOTE);

        let mut last_err = None;
        for note in std::iter::once(first).chain(FALLBACK_NOTES) {
            let trigger = NoteTrigger::new(sound.instrument, vec![note.to_string()], duration)
                .at(start)
                .with_gain_db(gain);
            match self.backend.trigger(&trigger) {
                Ok(()) => {
                    if note != first {
                        debug!(instrument = %sound.instrument, note, "played fallback note");
                    }
                    return Ok(());
                }
                Err(e) => {
                    debug!(instrument = %sound.instrument, note, "sample note failed: {}", e);
                    last_err = Some(e);
                }
            }
        }

        error!(instrument = %sound.instrument, "all fallback notes failed");
        Err(last_err.unwrap_or(AudioError::NotLoaded(sound.instrument)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{Instrument, LandUse};

    fn dispatcher() -> SoundDispatcher<CueRecorder> {
        SoundDispatcher::new(CueRecorder::new(), AudioSettings::default())
    }

    fn block_attrs() -> FeatureAttributes {
        FeatureAttributes::new()
            .with("w_height_mean", 20.0)
            .with("w_age_mean", 10.0)
            .with("prop_residential", 0.5)
            .with("prop_water", 0.25)
            .with("t12", 1.0)
    }

    #[test]
    fn test_composite_arpeggio_timing() {
        let mut d = dispatcher();
        d.dispatch(LayerKind::CityBlocks, &block_attrs(), &MetricSet::all());

        let notes = d.backend().notes();
        // two voices, four chord tones each
        assert_eq!(notes.len(), 8);

        let piano: Vec<_> = notes
            .iter()
            .filter(|n| n.instrument == LandUse::Residential.instrument())
            .collect();
        assert_eq!(piano.len(), 4);
        // age 10 -> pattern 0, 0.214s apart
        assert!((piano[1].time - 0.214).abs() < 1e-9);
        assert!((piano[3].time - 0.642).abs() < 1e-9);
        assert_eq!(piano[0].velocity, 0.9);

        let water: Vec<_> = notes
            .iter()
            .filter(|n| n.instrument == LandUse::Water.instrument())
            .collect();
        assert!((water[0].time - 0.3).abs() < 1e-9);
        assert!((water[0].velocity - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_dispatcher_is_silent() {
        let mut d = dispatcher();
        d.set_active(false);
        d.dispatch(LayerKind::Boundary, &FeatureAttributes::new(), &MetricSet::all());
        assert!(d.backend().notes().is_empty());
        assert!(d.backend().stop_count() >= 1);
    }

    #[test]
    fn test_not_ready_backend_is_tolerated() {
        let mut backend = CueRecorder::new();
        backend.set_ready(false);
        let mut d = SoundDispatcher::new(backend, AudioSettings::default());
        d.play_cluster("2");
        assert!(d.backend().notes().is_empty());
    }

    #[test]
    fn test_unloaded_sampler_is_a_no_op() {
        let mut backend = CueRecorder::new();
        backend.set_loaded(Instrument::Piano, false);
        let mut d = SoundDispatcher::new(backend, AudioSettings::default());
        let attrs = FeatureAttributes::new().with("new_lu_class", "Residential");
        d.dispatch(LayerKind::LandUse, &attrs, &MetricSet::all());
        assert!(d.backend().notes().is_empty());
    }

    #[test]
    fn test_sample_fallback_notes() {
        let mut backend = CueRecorder::new();
        backend.fail_note("C4");
        backend.fail_note("C3");
        let mut d = SoundDispatcher::new(backend, AudioSettings::default());
        d.dispatch(LayerKind::LandUse, &FeatureAttributes::new(), &MetricSet::all());

        let notes = d.backend().notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notes, vec!["C5"]);
        assert_eq!(notes[0].gain_db, Some(0.0));
        assert_eq!(notes[0].duration, 0.8);
    }

    #[test]
    fn test_sample_all_fallbacks_fail() {
        let mut backend = CueRecorder::new();
        for note in std::iter::once(SAMPLE_NOTE).chain(FALLBACK_NOTES) {
            backend.fail_note(note);
        }
        let mut d = SoundDispatcher::new(backend, AudioSettings::default());
        let sound = SoundDescriptor::sample(Instrument::Flute, 1.0, 0.8);
        assert!(d.play(&sound).is_err());
        // play_all swallows it
        assert_eq!(d.play_all(&[sound]), 0);
    }

    #[test]
    fn test_street_tempo_changes_note_values() {
        let mut d = dispatcher();
        let attrs = FeatureAttributes::new().with("length", 120.0);
        d.dispatch(LayerKind::Street, &attrs, &MetricSet::all());
        assert_eq!(d.tempo(), 80.0);

        let notes = d.backend().notes();
        let note = &notes[0];
        // sixteenth at 80 bpm
        assert!((note.duration - 0.1875).abs() < 1e-9);
        assert_eq!(d.backend().tempo(), Some(80.0));

        d.dispatch(LayerKind::Boundary, &FeatureAttributes::new(), &MetricSet::all());
        let boundary = d.backend().notes()[1].clone();
        assert!((boundary.duration - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_height_sets_panning_and_gain() {
        let mut d = dispatcher();
        let attrs = FeatureAttributes::new().with("height", 4.0);
        d.dispatch(LayerKind::BuildingHeight, &attrs, &MetricSet::all());
        assert_eq!(d.backend().panning(), Some(-0.6));
        assert_eq!(d.backend().notes()[0].gain_db, Some(-18.0));
    }

    #[test]
    fn test_unknown_layer_id() {
        let mut d = dispatcher();
        assert_eq!(
            d.dispatch_id("parking", &FeatureAttributes::new(), &MetricSet::all()),
            None
        );
        assert_eq!(
            d.dispatch_id("clusters", &FeatureAttributes::new(), &MetricSet::all()),
            Some(LayerKind::Clusters)
        );
        assert_eq!(d.backend().notes().len(), 1);
    }

    #[test]
    fn test_bip() {
        let mut d = dispatcher();
        d.play_bip();
        let notes = d.backend().notes();
        let note = &notes[0];
        assert_eq!(note.instrument, Instrument::Bip);
        assert_eq!(note.notes, vec!["C6"]);
        assert_eq!(note.velocity, 0.1);
        // thirty-second note at 120 bpm
        assert!((note.duration - 0.0625).abs() < 1e-9);
    }

    #[test]
    fn test_notes_follow_backend_clock() {
        let mut d = dispatcher();
        d.backend_mut().sync(std::time::Duration::from_millis(1500));
        d.play_cluster("1");
        let notes = d.backend().notes();
        let note = &notes[0];
        assert_eq!(note.time, 1.5);
        assert_eq!(note.notes, vec!["D4", "F4", "A4"]);
    }
}
