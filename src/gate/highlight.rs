//! Task-block overlays and the hovered-block highlight

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feature::{Feature, Highlight, LayerKind, MapError, MapView};
use crate::mapping::cluster_color;

/// A fixed set of study blocks drawn on its own overlay layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskBlockSet {
    Visual,
    Audio,
    AudioVisual,
}

impl TaskBlockSet {
    pub const ALL: [TaskBlockSet; 3] = [
        TaskBlockSet::Visual,
        TaskBlockSet::Audio,
        TaskBlockSet::AudioVisual,
    ];

    /// Overlay layer the set is drawn on
    pub fn layer_id(&self) -> &'static str {
        match self {
            TaskBlockSet::Visual => "visual-task-blocks-layer",
            TaskBlockSet::Audio => "audio-task-blocks-layer",
            TaskBlockSet::AudioVisual => "audio-visual-task-blocks-layer",
        }
    }

    pub fn codes(&self) -> &'static [&'static str] {
        match self {
            TaskBlockSet::Visual => &["TB19", "TD17", "KK23"],
            TaskBlockSet::Audio => &["RA01", "TC14", "TA16"],
            TaskBlockSet::AudioVisual => &["JB10", "HB14"],
        }
    }
}

/// Which task-block sets are switched on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBlocks {
    #[serde(default)]
    pub visual: bool,
    #[serde(default)]
    pub audio: bool,
    #[serde(default)]
    pub audio_visual: bool,
}

/// Outcome of pushing task-block filters to the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBlockUpdate {
    Applied,
    /// City blocks are hidden; nothing to mark
    Skipped,
    /// Style not loaded yet; try again later
    NotReady,
}

impl TaskBlocks {
    pub fn is_enabled(&self, set: TaskBlockSet) -> bool {
        match set {
            TaskBlockSet::Visual => self.visual,
            TaskBlockSet::Audio => self.audio,
            TaskBlockSet::AudioVisual => self.audio_visual,
        }
    }

    pub fn set(&mut self, set: TaskBlockSet, on: bool) {
        match set {
            TaskBlockSet::Visual => self.visual = on,
            TaskBlockSet::Audio => self.audio = on,
            TaskBlockSet::AudioVisual => self.audio_visual = on,
        }
    }

    /// Codes shown for `set`; a disabled set shows none
    pub fn shown(&self, set: TaskBlockSet) -> &'static [&'static str] {
        if self.is_enabled(set) {
            set.codes()
        } else {
            &[]
        }
    }

    /// Push the filters for all three sets
    pub fn apply(&self, map: &mut impl MapView) -> Result<TaskBlockUpdate, MapError> {
        if !map.is_style_loaded() {
            return Ok(TaskBlockUpdate::NotReady);
        }
        if !map.is_layer_visible(LayerKind::CityBlocks) {
            debug!("city blocks hidden, skipping task blocks");
            return Ok(TaskBlockUpdate::Skipped);
        }
        for set in TaskBlockSet::ALL {
            map.set_layer_filter(set.layer_id(), self.shown(set))?;
        }
        Ok(TaskBlockUpdate::Applied)
    }
}

/// Highlight for a hovered block
///
/// In identify-clusters mode the block is filled with its cluster colour.
/// Blocks without geometry get no highlight.
pub fn block_highlight(feature: &Feature, identify_clusters: bool) -> Option<Highlight> {
    let geometry = feature.geometry.clone()?;
    let fill = if identify_clusters {
        feature
            .properties
            .text("Cluster")
            .map(|id| cluster_color(&id).to_string())
    } else {
        None
    };
    Some(Highlight { geometry, fill })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureAttributes, Geometry, StaticMap};

    fn blocks_map() -> StaticMap {
        StaticMap::new().with_layer(LayerKind::CityBlocks, true, Vec::new())
    }

    #[test]
    fn test_apply_filters() {
        let mut map = blocks_map();
        let blocks = TaskBlocks {
            audio: true,
            ..TaskBlocks::default()
        };
        assert_eq!(blocks.apply(&mut map), Ok(TaskBlockUpdate::Applied));
        assert_eq!(
            map.filter("audio-task-blocks-layer").unwrap(),
            &["RA01".to_string(), "TC14".to_string(), "TA16".to_string()]
        );
        assert!(map.filter("visual-task-blocks-layer").unwrap().is_empty());
    }

    #[test]
    fn test_not_ready_and_hidden() {
        let mut map = blocks_map();
        map.set_style_loaded(false);
        assert_eq!(TaskBlocks::default().apply(&mut map), Ok(TaskBlockUpdate::NotReady));

        let mut hidden = StaticMap::new();
        assert_eq!(TaskBlocks::default().apply(&mut hidden), Ok(TaskBlockUpdate::Skipped));
        assert!(hidden.filter("audio-task-blocks-layer").is_none());
    }

    #[test]
    fn test_block_highlight_fill() {
        let block = Feature::new(
            LayerKind::CityBlocks,
            FeatureAttributes::new().with("Cluster", "2"),
        )
        .with_geometry(Geometry::Point([0.0, 0.0]));

        assert_eq!(block_highlight(&block, false).unwrap().fill, None);
        assert_eq!(
            block_highlight(&block, true).unwrap().fill.as_deref(),
            Some(cluster_color("2"))
        );

        let bare = Feature::new(LayerKind::CityBlocks, FeatureAttributes::new());
        assert!(block_highlight(&bare, true).is_none());
    }
}
