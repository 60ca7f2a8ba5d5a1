//! UI toggle reads
//!
//! The gate never owns toggle state; callers hand it a [`Toggles`] snapshot
//! each time it evaluates.

use serde::{Deserialize, Serialize};

use crate::feature::LayerKind;
use crate::mapping::MetricSet;

/// A single switch the gate consults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    /// Master sound switch
    Sound,
    /// Audio feedback checkbox
    AudioFeedback,
    /// Glyphs and block highlight
    Visual,
    /// Blocks play their cluster triad instead of the hover bip
    IdentifyClusters,
    AudioHeight,
    AudioAge,
    AudioLandUse,
    AudioStreet,
    VisualHeight,
    VisualAge,
    VisualLandUse,
    VisualStreet,
}

/// Read-only view of the UI toggles
pub trait Toggles {
    fn is_enabled(&self, toggle: Toggle) -> bool;

    /// Sound is on and audio feedback is checked
    fn sound_on(&self) -> bool {
        self.is_enabled(Toggle::Sound) && self.is_enabled(Toggle::AudioFeedback)
    }

    fn audio_metrics(&self) -> MetricSet {
        MetricSet {
            height: self.is_enabled(Toggle::AudioHeight),
            age: self.is_enabled(Toggle::AudioAge),
            land_use: self.is_enabled(Toggle::AudioLandUse),
            street: self.is_enabled(Toggle::AudioStreet),
        }
    }

    fn visual_metrics(&self) -> MetricSet {
        MetricSet {
            height: self.is_enabled(Toggle::VisualHeight),
            age: self.is_enabled(Toggle::VisualAge),
            land_use: self.is_enabled(Toggle::VisualLandUse),
            street: self.is_enabled(Toggle::VisualStreet),
        }
    }

    /// Per-category audio switch for a single-feature layer
    ///
    /// Buildings follow the height or age metric, parcels the land-use
    /// metric, segments the street metric. Blocks, clusters and the boundary
    /// have no category switch.
    fn layer_audio_enabled(&self, layer: LayerKind) -> bool {
        let metrics = self.audio_metrics();
        match layer {
            LayerKind::BuildingHeight | LayerKind::BuildingHeightBlock => metrics.height,
            LayerKind::BuildingAge | LayerKind::BuildingAgeBlock => metrics.age,
            LayerKind::LandUse | LayerKind::LandUseBlock => metrics.land_use,
            LayerKind::Street | LayerKind::StreetBlock => metrics.street,
            LayerKind::Clusters
            | LayerKind::ClustersLabeled
            | LayerKind::CityBlocks
            | LayerKind::Boundary => true,
        }
    }
}

/// Plain-data toggle state, as loaded from config or a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleSnapshot {
    #[serde(default = "default_on")]
    pub sound: bool,

    /// Audio feedback checkbox
    #[serde(default = "default_on")]
    pub audio: bool,

    #[serde(default = "default_on")]
    pub visual: bool,

    #[serde(default)]
    pub identify_clusters: bool,

    #[serde(default)]
    pub audio_metrics: MetricSet,

    #[serde(default)]
    pub visual_metrics: MetricSet,
}

fn default_on() -> bool { true }

impl Default for ToggleSnapshot {
    fn default() -> Self {
        Self {
            sound: true,
            audio: true,
            visual: true,
            identify_clusters: false,
            audio_metrics: MetricSet::all(),
            visual_metrics: MetricSet::all(),
        }
    }
}

impl ToggleSnapshot {
    /// Set one toggle
    pub fn set(&mut self, toggle: Toggle, on: bool) {
        match toggle {
            Toggle::Sound => self.sound = on,
            Toggle::AudioFeedback => self.audio = on,
            Toggle::Visual => self.visual = on,
            Toggle::IdentifyClusters => self.identify_clusters = on,
            Toggle::AudioHeight => self.audio_metrics.height = on,
            Toggle::AudioAge => self.audio_metrics.age = on,
            Toggle::AudioLandUse => self.audio_metrics.land_use = on,
            Toggle::AudioStreet => self.audio_metrics.street = on,
            Toggle::VisualHeight => self.visual_metrics.height = on,
            Toggle::VisualAge => self.visual_metrics.age = on,
            Toggle::VisualLandUse => self.visual_metrics.land_use = on,
            Toggle::VisualStreet => self.visual_metrics.street = on,
        }
    }

    /// Set one toggle (builder pattern)
    pub fn with(mut self, toggle: Toggle, on: bool) -> Self {
        self.set(toggle, on);
        self
    }
}

impl Toggles for ToggleSnapshot {
    fn is_enabled(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Sound => self.sound,
            Toggle::AudioFeedback => self.audio,
            Toggle::Visual => self.visual,
            Toggle::IdentifyClusters => self.identify_clusters,
            Toggle::AudioHeight => self.audio_metrics.height,
            Toggle::AudioAge => self.audio_metrics.age,
            Toggle::AudioLandUse => self.audio_metrics.land_use,
            Toggle::AudioStreet => self.audio_metrics.street,
            Toggle::VisualHeight => self.visual_metrics.height,
            Toggle::VisualAge => self.visual_metrics.age,
            Toggle::VisualLandUse => self.visual_metrics.land_use,
            Toggle::VisualStreet => self.visual_metrics.street,
        }
    }
}
