//! Legend entries: which one a feature highlights, and what a click on one plays

use serde::{Deserialize, Serialize};

use crate::feature::{BlockProperties, Feature, FeatureAttributes, LandUseParcel, LayerKind};
use crate::mapping::{BucketTable, StreetType, AGE_ALPHA, HEIGHT_SIZE};

use super::state::Channel;

/// Age played for the oldest legend class
const OLDEST_DEMO_AGE: f64 = 200.0;

/// A legend entry
///
/// Height and age classes share the `range` form; which one it means
/// depends on the active layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LegendItem {
    Cluster { id: String },
    Range { min: f64, max: f64 },
    LandUse { label: String },
    Street { label: String },
}

impl LegendItem {
    /// Every entry shown for `layer`
    pub fn entries(layer: LayerKind) -> Vec<LegendItem> {
        match layer {
            LayerKind::Clusters | LayerKind::ClustersLabeled | LayerKind::CityBlocks => (0..6)
                .map(|id| LegendItem::Cluster { id: id.to_string() })
                .collect(),
            LayerKind::BuildingHeight | LayerKind::BuildingHeightBlock => ranges(&HEIGHT_SIZE),
            LayerKind::BuildingAge | LayerKind::BuildingAgeBlock => ranges(&AGE_ALPHA),
            LayerKind::LandUse | LayerKind::LandUseBlock => crate::mapping::LandUse::SHARES
                .iter()
                .map(|lu| lu.label())
                .chain(std::iter::once("Others"))
                .map(|label| LegendItem::LandUse {
                    label: label.to_string(),
                })
                .collect(),
            LayerKind::Street | LayerKind::StreetBlock => StreetType::ALL
                .iter()
                .filter(|t| t.chord_design().is_some())
                .map(|t| LegendItem::Street {
                    label: t.label().to_string(),
                })
                .collect(),
            LayerKind::Boundary => Vec::new(),
        }
    }
}

fn ranges<T: Copy + 'static>(table: &BucketTable<T>) -> Vec<LegendItem> {
    table
        .buckets()
        .iter()
        .map(|b| LegendItem::Range {
            min: b.min,
            max: b.max,
        })
        .collect()
}

fn range_of<T: Copy + 'static>(table: &BucketTable<T>, value: f64) -> Option<LegendItem> {
    table.lookup(value).map(|b| LegendItem::Range {
        min: b.min,
        max: b.max,
    })
}

/// Legend entry a feature on `layer` lights up, if any
///
/// Height and age read the block means on block layers and missing values
/// as zero.
pub fn legend_target(layer: LayerKind, attrs: &FeatureAttributes) -> Option<LegendItem> {
    match layer {
        LayerKind::Clusters | LayerKind::CityBlocks => attrs
            .text("Cluster")
            .map(|id| LegendItem::Cluster { id }),
        LayerKind::BuildingHeight => range_of(&HEIGHT_SIZE, attrs.number_or("height", 0.0)),
        LayerKind::BuildingHeightBlock => {
            range_of(&HEIGHT_SIZE, attrs.number_or("w_height_mean", 0.0))
        }
        LayerKind::BuildingAge => range_of(&AGE_ALPHA, attrs.number_or("age", 0.0)),
        LayerKind::BuildingAgeBlock => range_of(&AGE_ALPHA, attrs.number_or("w_age_mean", 0.0)),
        LayerKind::LandUse | LayerKind::LandUseBlock => Some(LegendItem::LandUse {
            label: LandUseParcel::from_attributes(attrs).legend_label().to_string(),
        }),
        LayerKind::Street => attrs.text("Type").map(|label| LegendItem::Street { label }),
        LayerKind::StreetBlock => Some(LegendItem::Street {
            label: BlockProperties::from_attributes(attrs)
                .streets
                .dominant()
                .label()
                .to_string(),
        }),
        LayerKind::ClustersLabeled | LayerKind::Boundary => None,
    }
}

/// Synthetic feature played when a legend entry is clicked
#[derive(Debug, Clone, PartialEq)]
pub struct LegendDemo {
    pub feature: Feature,
    /// Dedup channel re-armed before playing
    pub rearm: Option<Channel>,
}

impl LegendDemo {
    /// Cluster entries play the triad directly
    pub fn is_cluster(&self) -> bool {
        self.feature.layer == LayerKind::Clusters
    }
}

/// Build the demo feature for a click on `item` while `active` is shown
///
/// `serial` makes the demo's identity unique so repeated clicks always
/// play. Returns `None` when the entry does not belong to the layer.
pub fn legend_demo(active: LayerKind, item: &LegendItem, serial: u64) -> Option<LegendDemo> {
    let demo_id = format!("demo-{}", serial);
    let (layer, attrs, rearm) = match (active, item) {
        (LayerKind::Clusters, LegendItem::Cluster { id }) => (
            LayerKind::Clusters,
            FeatureAttributes::new().with("Cluster", id.as_str()),
            None,
        ),
        (LayerKind::BuildingHeight, LegendItem::Range { min, max }) => (
            active,
            FeatureAttributes::new()
                .with("height", demo_height(*min, *max))
                .with("id", demo_id),
            Some(Channel::Building),
        ),
        (LayerKind::BuildingHeightBlock, LegendItem::Range { min, max }) => (
            active,
            FeatureAttributes::new()
                .with("w_height_mean", demo_height(*min, *max))
                .with("code", demo_id),
            Some(Channel::Building),
        ),
        (LayerKind::BuildingAge, LegendItem::Range { min, max }) => (
            active,
            FeatureAttributes::new()
                .with("age", demo_age(*min, *max))
                .with("id", demo_id),
            Some(Channel::Building),
        ),
        (LayerKind::BuildingAgeBlock, LegendItem::Range { min, max }) => (
            active,
            FeatureAttributes::new()
                .with("w_age_mean", demo_age(*min, *max))
                .with("code", demo_id),
            Some(Channel::Building),
        ),
        (LayerKind::LandUse | LayerKind::LandUseBlock, LegendItem::LandUse { label }) => (
            active,
            FeatureAttributes::new()
                .with("new_lu_class", label.as_str())
                .with("rowId", demo_id),
            Some(Channel::LandUse),
        ),
        (LayerKind::Street, LegendItem::Street { label }) => (
            active,
            FeatureAttributes::new()
                .with("Type", label.as_str())
                .with("rowId", demo_id),
            Some(Channel::Street),
        ),
        (LayerKind::StreetBlock, LegendItem::Street { label }) => {
            let selected = StreetType::from_label(label);
            let attrs = StreetType::ALL
                .iter()
                .filter(|t| t.chord_design().is_some())
                .fold(FeatureAttributes::new().with("code", demo_id), |attrs, t| {
                    attrs.with(t.key(), if *t == selected { 1.0 } else { 0.0 })
                });
            (active, attrs, Some(Channel::Street))
        }
        _ => return None,
    };
    Some(LegendDemo {
        feature: Feature::new(layer, attrs),
        rearm,
    })
}

/// Middle of the class; the open-ended top class plays its lower bound
fn demo_height(min: f64, max: f64) -> f64 {
    if max.is_finite() {
        min + (max - min) / 2.0
    } else {
        min
    }
}

fn demo_age(min: f64, max: f64) -> f64 {
    if !max.is_finite() || min >= 190.0 {
        OLDEST_DEMO_AGE
    } else {
        min + (max - min) / 2.0
    }
}
