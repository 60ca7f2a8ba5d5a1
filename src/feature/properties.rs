//! Typed property records per layer kind
//!
//! Each record documents the attributes it consumes and what a missing or
//! malformed value becomes. A zero reads as zero, not as missing.

use super::FeatureAttributes;
use crate::mapping::{LandUse, LandUseMix, StreetScores, StreetType};

/// Height assumed for a building without one, in metres
pub const DEFAULT_HEIGHT: f64 = 10.0;

/// Age assumed for a building without one, in years
pub const DEFAULT_AGE: f64 = 50.0;

/// Length assumed for a street segment without one, in metres
pub const DEFAULT_STREET_LENGTH: f64 = 10.0;

/// Single building on the `building-height` / `building-age` layers
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingProperties {
    /// `id`
    pub id: Option<String>,
    /// `height`, default [`DEFAULT_HEIGHT`]
    pub height: f64,
    /// `age`, default [`DEFAULT_AGE`]
    pub age: f64,
}

impl BuildingProperties {
    pub fn from_attributes(attrs: &FeatureAttributes) -> Self {
        Self {
            id: attrs.text("id"),
            height: attrs.number_or("height", DEFAULT_HEIGHT),
            age: attrs.number_or("age", DEFAULT_AGE),
        }
    }
}

/// City block (and cluster) record
#[derive(Debug, Clone, PartialEq)]
pub struct BlockProperties {
    /// `code`, the block code such as `"TB19"`
    pub code: Option<String>,
    /// `Cluster`, expected `"0"`..`"6"`
    pub cluster: Option<String>,
    /// `w_height_mean`
    pub height: Option<f64>,
    /// `w_age_mean`
    pub age: Option<f64>,
    /// `prop_*` shares
    pub land_use: LandUseMix,
    /// `t12`..`t42` scores
    pub streets: StreetScores,
}

impl BlockProperties {
    pub fn from_attributes(attrs: &FeatureAttributes) -> Self {
        Self {
            code: attrs.text("code"),
            cluster: attrs.text("Cluster"),
            height: attrs.number("w_height_mean"),
            age: attrs.number("w_age_mean"),
            land_use: LandUseMix::from_attributes(attrs),
            streets: StreetScores::from_attributes(attrs),
        }
    }

    /// Height for sonification, default [`DEFAULT_HEIGHT`]
    pub fn audio_height(&self) -> f64 {
        self.height.unwrap_or(DEFAULT_HEIGHT)
    }

    /// Age for sonification, default [`DEFAULT_AGE`]
    pub fn audio_age(&self) -> f64 {
        self.age.unwrap_or(DEFAULT_AGE)
    }

    /// Height for the glyph; a block without one draws in the smallest class
    pub fn visual_height(&self) -> f64 {
        self.height.unwrap_or(0.0)
    }

    /// Age for the glyph; a block without one draws in the faintest class
    pub fn visual_age(&self) -> f64 {
        self.age.unwrap_or(0.0)
    }

    /// Cluster id, `"0"` when absent
    pub fn cluster_id(&self) -> &str {
        self.cluster.as_deref().unwrap_or("0")
    }
}

/// Land-use parcel on the `landuse` layer
#[derive(Debug, Clone, PartialEq)]
pub struct LandUseParcel {
    /// `rowId`
    pub row_id: Option<String>,
    /// `new_lu_class` as written in the data
    pub class_label: Option<String>,
}

impl LandUseParcel {
    pub fn from_attributes(attrs: &FeatureAttributes) -> Self {
        Self {
            row_id: attrs.text("rowId"),
            class_label: attrs.text("new_lu_class"),
        }
    }

    /// Class used for sound; unlabelled parcels count as residential
    pub fn sound_class(&self) -> Option<LandUse> {
        match &self.class_label {
            Some(label) => LandUse::from_label(label),
            None => Some(LandUse::Residential),
        }
    }

    /// Label used for the legend; unlabelled parcels count as "Others"
    pub fn legend_label(&self) -> &str {
        self.class_label.as_deref().unwrap_or("Others")
    }
}

/// Street segment on the `street` layer
#[derive(Debug, Clone, PartialEq)]
pub struct StreetSegment {
    /// `rowId`
    pub row_id: Option<String>,
    /// `Type`, default `"Type 1-2"`
    pub type_label: String,
    /// `length`, default [`DEFAULT_STREET_LENGTH`]
    pub length: f64,
}

impl StreetSegment {
    pub fn from_attributes(attrs: &FeatureAttributes) -> Self {
        Self {
            row_id: attrs.text("rowId"),
            type_label: attrs
                .text("Type")
                .unwrap_or_else(|| StreetType::T12.label().to_string()),
            length: attrs.number_or("length", DEFAULT_STREET_LENGTH),
        }
    }

    pub fn street_type(&self) -> StreetType {
        StreetType::from_label(&self.type_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_defaults() {
        let b = BuildingProperties::from_attributes(&FeatureAttributes::new());
        assert_eq!(b.height, DEFAULT_HEIGHT);
        assert_eq!(b.age, DEFAULT_AGE);
        assert_eq!(b.id, None);
    }

    #[test]
    fn test_zero_height_is_kept() {
        let attrs = FeatureAttributes::new().with("height", 0.0).with("id", 17i64);
        let b = BuildingProperties::from_attributes(&attrs);
        assert_eq!(b.height, 0.0);
        assert_eq!(b.id.as_deref(), Some("17"));
    }

    #[test]
    fn test_block_properties() {
        let attrs = FeatureAttributes::new()
            .with("code", "TB19")
            .with("Cluster", 4i64)
            .with("w_height_mean", "22.5")
            .with("prop_residential", 0.8)
            .with("t41", 0.6);
        let block = BlockProperties::from_attributes(&attrs);

        assert_eq!(block.code.as_deref(), Some("TB19"));
        assert_eq!(block.cluster_id(), "4");
        assert_eq!(block.audio_height(), 22.5);
        assert_eq!(block.audio_age(), DEFAULT_AGE);
        assert_eq!(block.visual_age(), 0.0);
        assert_eq!(block.land_use.dominant(), Some(LandUse::Residential));
        assert_eq!(block.streets.dominant(), StreetType::T41);
    }

    #[test]
    fn test_parcel_classes() {
        let unlabelled = LandUseParcel::from_attributes(&FeatureAttributes::new());
        assert_eq!(unlabelled.sound_class(), Some(LandUse::Residential));
        assert_eq!(unlabelled.legend_label(), "Others");

        let unknown =
            LandUseParcel::from_attributes(&FeatureAttributes::new().with("new_lu_class", "Dock"));
        assert_eq!(unknown.sound_class(), None);
    }

    #[test]
    fn test_street_segment_defaults() {
        let s = StreetSegment::from_attributes(&FeatureAttributes::new().with("rowId", "r9"));
        assert_eq!(s.type_label, "Type 1-2");
        assert_eq!(s.length, DEFAULT_STREET_LENGTH);
        assert_eq!(s.street_type(), StreetType::T12);
        assert_eq!(s.row_id.as_deref(), Some("r9"));
    }
}
