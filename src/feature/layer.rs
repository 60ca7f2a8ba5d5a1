//! Map layer identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A map layer the sonification engine knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    #[serde(rename = "clusters")]
    Clusters,
    #[serde(rename = "clusters-labeled")]
    ClustersLabeled,
    #[serde(rename = "city-blocks")]
    CityBlocks,
    #[serde(rename = "building-height")]
    BuildingHeight,
    #[serde(rename = "building-height-block")]
    BuildingHeightBlock,
    #[serde(rename = "building-age")]
    BuildingAge,
    #[serde(rename = "building-age-block")]
    BuildingAgeBlock,
    #[serde(rename = "landuse")]
    LandUse,
    #[serde(rename = "landuse-block")]
    LandUseBlock,
    #[serde(rename = "street")]
    Street,
    #[serde(rename = "street-block")]
    StreetBlock,
    #[serde(rename = "amsterdam-boundary")]
    Boundary,
}

impl LayerKind {
    /// Layers considered under the pointer, highest priority first
    pub const PRIORITY: [LayerKind; 11] = [
        LayerKind::Clusters,
        LayerKind::CityBlocks,
        LayerKind::BuildingHeight,
        LayerKind::BuildingHeightBlock,
        LayerKind::BuildingAge,
        LayerKind::BuildingAgeBlock,
        LayerKind::LandUse,
        LayerKind::LandUseBlock,
        LayerKind::Street,
        LayerKind::StreetBlock,
        LayerKind::Boundary,
    ];

    /// Map layer identifier
    pub fn id(&self) -> &'static str {
        match self {
            LayerKind::Clusters => "clusters",
            LayerKind::ClustersLabeled => "clusters-labeled",
            LayerKind::CityBlocks => "city-blocks",
            LayerKind::BuildingHeight => "building-height",
            LayerKind::BuildingHeightBlock => "building-height-block",
            LayerKind::BuildingAge => "building-age",
            LayerKind::BuildingAgeBlock => "building-age-block",
            LayerKind::LandUse => "landuse",
            LayerKind::LandUseBlock => "landuse-block",
            LayerKind::Street => "street",
            LayerKind::StreetBlock => "street-block",
            LayerKind::Boundary => "amsterdam-boundary",
        }
    }

    /// Resolve a map layer identifier
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "clusters" => Some(LayerKind::Clusters),
            "clusters-labeled" => Some(LayerKind::ClustersLabeled),
            "city-blocks" => Some(LayerKind::CityBlocks),
            "building-height" => Some(LayerKind::BuildingHeight),
            "building-height-block" => Some(LayerKind::BuildingHeightBlock),
            "building-age" => Some(LayerKind::BuildingAge),
            "building-age-block" => Some(LayerKind::BuildingAgeBlock),
            "landuse" => Some(LayerKind::LandUse),
            "landuse-block" => Some(LayerKind::LandUseBlock),
            "street" => Some(LayerKind::Street),
            "street-block" => Some(LayerKind::StreetBlock),
            "amsterdam-boundary" => Some(LayerKind::Boundary),
            _ => None,
        }
    }

    /// Human-readable name shown by the sound indicator
    pub fn description(&self) -> &'static str {
        match self {
            LayerKind::Clusters | LayerKind::ClustersLabeled => "Urban Cluster",
            LayerKind::CityBlocks => "City Blocks",
            LayerKind::BuildingHeight | LayerKind::BuildingHeightBlock => "Building Height",
            LayerKind::BuildingAge | LayerKind::BuildingAgeBlock => "Building Age",
            LayerKind::LandUse | LayerKind::LandUseBlock => "Land Use Pattern",
            LayerKind::Street | LayerKind::StreetBlock => "Street Network",
            LayerKind::Boundary => "City Boundary",
        }
    }

    /// Position in [`LayerKind::PRIORITY`], if the layer takes part in hit selection
    pub fn priority(&self) -> Option<usize> {
        Self::PRIORITY.iter().position(|l| l == self)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
