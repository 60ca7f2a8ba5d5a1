//! Sound descriptors and the per-layer routing table
//!
//! [`plan`] is pure: it turns a layer and its attributes into the list of
//! descriptors the dispatcher will play. Nothing here touches a backend.

use serde::{Deserialize, Serialize};

use crate::config::AudioSettings;
use crate::feature::{
    BlockProperties, BuildingProperties, FeatureAttributes, LandUseParcel, LayerKind,
    StreetSegment,
};
use crate::mapping::{
    age_reverb_wet, chord_of, cluster_chord, height_adjusted_chord, height_gain_db,
    street_tempo, Classifier, Instrument, LandUse, MetricSet, RhythmPattern, AGE_NOTE,
    AGE_PATTERN, FLAT_CHORD, HEIGHT_NOTE, HEIGHT_PANNING,
};

/// Note played by the sample path
pub const SAMPLE_NOTE: &str = "C4";

/// Notes tried in order when a sampled note fails to play
pub const FALLBACK_NOTES: [&str; 5] = ["C3", "C5", "C2", "C6", "C1"];

/// Length of a cluster triad in seconds
pub const CLUSTER_CHORD_SECS: f64 = 0.2;

/// A note length, either absolute or a fraction of a whole note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteLength {
    Secs(f64),
    /// `8` is an eighth note
    Division(u32),
}

impl NoteLength {
    /// Resolve to seconds at `bpm`; a whole note lasts four beats
    pub fn to_secs(&self, bpm: f64) -> f64 {
        match *self {
            NoteLength::Secs(s) => s,
            NoteLength::Division(d) => 240.0 / bpm / d.max(1) as f64,
        }
    }
}

/// How a descriptor's chord is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Playback {
    /// All notes at once
    Block,
    /// Notes in sequence at the rhythm pattern's spacing
    Arpeggio,
    /// A sampled one-shot with log gain and fallback notes
    Sample,
}

/// Everything needed to play one sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundDescriptor {
    pub instrument: Instrument,
    pub chord: Vec<String>,
    /// Normalised loudness, `0..1` for most sounds; height boosts exceed 1
    pub volume: f64,
    pub playback: Playback,
    pub duration: NoteLength,
    /// Rhythm pattern for arpeggios
    pub pattern: Option<RhythmPattern>,
    /// Seconds after the trigger time
    pub delay: f64,
    /// Vertical panning, `-1..1`
    pub panning: Option<f64>,
    pub reverb_wet: Option<f64>,
    pub gain_db: Option<f64>,
    pub tempo_bpm: Option<f64>,
    /// Velocity override; defaults to `volume`
    pub velocity: Option<f64>,
}

impl SoundDescriptor {
    pub fn new(instrument: Instrument, chord: Vec<String>, duration: NoteLength) -> Self {
        Self {
            instrument,
            chord,
            volume: 1.0,
            playback: Playback::Block,
            duration,
            pattern: None,
            delay: 0.0,
            panning: None,
            reverb_wet: None,
            gain_db: None,
            tempo_bpm: None,
            velocity: None,
        }
    }

    /// Arpeggio of `chord` in `pattern`
    pub fn arpeggio(instrument: Instrument, chord: Vec<String>, pattern: RhythmPattern) -> Self {
        let mut d = Self::new(instrument, chord, NoteLength::Secs(pattern.note_duration()));
        d.playback = Playback::Arpeggio;
        d.pattern = Some(pattern);
        d
    }

    /// Sampled one-shot of [`SAMPLE_NOTE`]
    pub fn sample(instrument: Instrument, volume: f64, secs: f64) -> Self {
        let mut d = Self::new(instrument, vec![SAMPLE_NOTE.to_string()], NoteLength::Secs(secs));
        d.playback = Playback::Sample;
        d.volume = volume;
        d
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_panning(mut self, panning: f64) -> Self {
        self.panning = Some(panning.clamp(-1.0, 1.0));
        self
    }

    pub fn with_reverb_wet(mut self, wet: f64) -> Self {
        self.reverb_wet = Some(wet);
        self
    }

    pub fn with_gain_db(mut self, gain_db: f64) -> Self {
        self.gain_db = Some(gain_db);
        self
    }

    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo_bpm = Some(bpm);
        self
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

/// Gain in dB for a sampled one-shot
pub fn sample_gain_db(volume: f64) -> f64 {
    if volume <= 0.0 {
        return -30.0;
    }
    (10.0 * volume.log10()).clamp(-30.0, 0.0)
}

/// Resolve the sounds a feature on `layer` should make
///
/// `metrics` are the audio metric toggles; only the composite city-block
/// sound consults them. Layers without a sound return an empty plan.
pub fn plan(
    layer: LayerKind,
    attrs: &FeatureAttributes,
    metrics: &MetricSet,
    settings: &AudioSettings,
) -> Vec<SoundDescriptor> {
    match layer {
        LayerKind::BuildingHeight => {
            vec![height_note(BuildingProperties::from_attributes(attrs).height)]
        }
        LayerKind::BuildingHeightBlock => {
            vec![height_note(BlockProperties::from_attributes(attrs).audio_height())]
        }
        LayerKind::BuildingAge => vec![age_note(BuildingProperties::from_attributes(attrs).age)],
        LayerKind::BuildingAgeBlock => {
            vec![age_note(BlockProperties::from_attributes(attrs).audio_age())]
        }
        LayerKind::LandUse => {
            let parcel = LandUseParcel::from_attributes(attrs);
            let instrument = parcel
                .sound_class()
                .map(|class| class.instrument())
                .unwrap_or(Instrument::Piano);
            vec![SoundDescriptor::sample(instrument, 1.0, settings.sample_duration)]
        }
        LayerKind::LandUseBlock => {
            let block = BlockProperties::from_attributes(attrs);
            let class = block.land_use.dominant().unwrap_or(LandUse::Residential);
            vec![SoundDescriptor::sample(
                class.instrument(),
                1.0,
                settings.sample_duration,
            )]
        }
        LayerKind::Street => {
            let segment = StreetSegment::from_attributes(attrs);
            vec![SoundDescriptor::new(
                Instrument::Membrane,
                chord_of(&["C2"]),
                NoteLength::Division(16),
            )
            .with_tempo(street_tempo(segment.length))]
        }
        LayerKind::StreetBlock => {
            let block = BlockProperties::from_attributes(attrs);
            vec![SoundDescriptor::new(
                Instrument::Melodic,
                block.streets.chord(),
                NoteLength::Division(8),
            )]
        }
        LayerKind::CityBlocks => composite(&BlockProperties::from_attributes(attrs), metrics, settings),
        LayerKind::Clusters => {
            let block = BlockProperties::from_attributes(attrs);
            vec![cluster(block.cluster_id())]
        }
        LayerKind::Boundary => vec![SoundDescriptor::new(
            Instrument::Melodic,
            chord_of(&["C3"]),
            NoteLength::Division(8),
        )],
        LayerKind::ClustersLabeled => Vec::new(),
    }
}

/// Triad for a cluster id on the melodic synth
pub fn cluster(id: &str) -> SoundDescriptor {
    SoundDescriptor::new(
        Instrument::Melodic,
        cluster_chord(id),
        NoteLength::Secs(CLUSTER_CHORD_SECS),
    )
}

/// Short high tick marking entry into a new block
pub fn bip() -> SoundDescriptor {
    SoundDescriptor::new(Instrument::Bip, chord_of(&["C6"]), NoteLength::Division(32))
        .with_velocity(0.1)
        .with_volume(0.1)
}

fn height_note(height: f64) -> SoundDescriptor {
    SoundDescriptor::new(
        Instrument::Fm,
        chord_of(&[HEIGHT_NOTE.classify(height)]),
        NoteLength::Division(8),
    )
    .with_gain_db(height_gain_db(height))
    .with_panning(HEIGHT_PANNING.classify(height))
}

fn age_note(age: f64) -> SoundDescriptor {
    SoundDescriptor::new(
        Instrument::Melodic,
        chord_of(&[AGE_NOTE.classify(age)]),
        NoteLength::Division(8),
    )
    .with_reverb_wet(age_reverb_wet(age))
}

/// All four block metrics combined into staggered arpeggios
fn composite(
    block: &BlockProperties,
    metrics: &MetricSet,
    settings: &AudioSettings,
) -> Vec<SoundDescriptor> {
    let base = if metrics.street {
        block.streets.chord()
    } else {
        chord_of(&FLAT_CHORD)
    };

    let (chord, volume) = if metrics.height {
        let adjusted = height_adjusted_chord(&base, block.audio_height());
        (adjusted.notes, adjusted.volume)
    } else {
        (base, settings.fallback_volume)
    };

    let pattern = if metrics.age {
        RhythmPattern::new(AGE_PATTERN.classify(block.audio_age()))
    } else {
        RhythmPattern::new(settings.age_disabled_pattern)
    };

    if !metrics.land_use || block.land_use.is_empty() {
        return vec![SoundDescriptor::arpeggio(Instrument::Melodic, chord, pattern).with_volume(volume)];
    }

    block
        .land_use
        .instrument_voices(volume)
        .into_iter()
        .enumerate()
        .map(|(i, voice)| {
            SoundDescriptor::arpeggio(voice.instrument, chord.clone(), pattern)
                .with_volume(voice.volume)
                .with_delay(i as f64 * settings.layer_stagger)
        })
        .collect()
}
