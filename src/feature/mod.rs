//! Map features and the map collaborator
//!
//! A [`Feature`] is one rendered geographic entity: a layer, a bag of
//! attributes and an optional geometry. The [`MapView`] trait is everything
//! the trigger gate needs from the map renderer.

mod attributes;
mod geometry;
mod layer;
mod map;
mod properties;

pub use attributes::{AttrValue, FeatureAttributes};
pub use geometry::{Geometry, ScreenPoint, ScreenRect};
pub use layer::LayerKind;
pub use map::{Camera, Highlight, LayerSpec, MapError, MapView, StaticMap};
pub use properties::{
    BlockProperties, BuildingProperties, LandUseParcel, StreetSegment, DEFAULT_AGE,
    DEFAULT_HEIGHT, DEFAULT_STREET_LENGTH,
};

use serde::{Deserialize, Serialize};

/// A single map-rendered feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Renderer-assigned feature id
    #[serde(default)]
    pub id: Option<String>,

    pub layer: LayerKind,

    #[serde(default)]
    pub properties: FeatureAttributes,

    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Create a feature without geometry
    pub fn new(layer: LayerKind, properties: FeatureAttributes) -> Self {
        Self {
            id: None,
            layer,
            properties,
            geometry: None,
        }
    }

    /// Set the feature id (builder pattern)
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the geometry (builder pattern)
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Identity used for de-duplication
    ///
    /// Block `code`, then parcel/segment `rowId`, then building `id`, then the
    /// renderer's feature id.
    pub fn identity_key(&self) -> Option<String> {
        ["code", "rowId", "id"]
            .iter()
            .find_map(|key| self.properties.text(key))
            .or_else(|| self.id.clone())
    }

    /// Layer-qualified block id, e.g. `city-blocks-TB19`
    pub fn block_id(&self) -> String {
        let suffix = self
            .properties
            .text("code")
            .or_else(|| self.id.clone())
            .unwrap_or_default();
        format!("{}-{}", self.layer, suffix)
    }

    /// Centroid of the outer ring, for anchoring a glyph
    pub fn centroid(&self) -> Option<[f64; 2]> {
        self.geometry.as_ref().and_then(Geometry::centroid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_precedence() {
        let block = Feature::new(
            LayerKind::CityBlocks,
            FeatureAttributes::new().with("code", "JB10").with("id", 3i64),
        )
        .with_id("f1");
        assert_eq!(block.identity_key().as_deref(), Some("JB10"));

        let parcel = Feature::new(LayerKind::LandUse, FeatureAttributes::new().with("rowId", 88i64));
        assert_eq!(parcel.identity_key().as_deref(), Some("88"));

        let anonymous = Feature::new(LayerKind::Street, FeatureAttributes::new()).with_id("f7");
        assert_eq!(anonymous.identity_key().as_deref(), Some("f7"));

        let nothing = Feature::new(LayerKind::Street, FeatureAttributes::new());
        assert_eq!(nothing.identity_key(), None);
    }

    #[test]
    fn test_block_id() {
        let block = Feature::new(
            LayerKind::CityBlocks,
            FeatureAttributes::new().with("code", "HB14"),
        );
        assert_eq!(block.block_id(), "city-blocks-HB14");

        let unnamed = Feature::new(LayerKind::Clusters, FeatureAttributes::new()).with_id("12");
        assert_eq!(unnamed.block_id(), "clusters-12");
    }

    #[test]
    fn test_feature_from_json() {
        let json = r#"{
            "id": "b1",
            "layer": "building-height",
            "properties": {"height": 31.5, "id": "b1"},
            "geometry": {"type": "Point", "coordinates": [4.9, 52.37]}
        }"#;
        let f: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(f.layer, LayerKind::BuildingHeight);
        assert_eq!(f.properties.number("height"), Some(31.5));
        assert!(f.centroid().is_none());
    }
}
