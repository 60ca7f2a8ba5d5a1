//! Land-use classes and proportional blending
//!
//! A city block carries up to ten fractional land-use shares. Audio takes the
//! three largest and scales each instrument against the dominant share;
//! visuals turn every positive share into a coloured slice.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::instrument::Instrument;
use crate::feature::FeatureAttributes;

/// Shares at or below this total are treated as "no land use"
const EMPTY_TOTAL: f64 = 0.001;

/// Land-use class of a parcel or a share of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandUse {
    #[serde(rename = "Agricultural")]
    Agricultural,
    #[serde(rename = "Business & Industry")]
    Business,
    #[serde(rename = "Center & Mixed-Use")]
    Center,
    #[serde(rename = "Culture, Recreation & Sports")]
    Culture,
    #[serde(rename = "Retail & Services")]
    Retail,
    #[serde(rename = "Hospitality & Office")]
    Hospitality,
    #[serde(rename = "Social & Community")]
    Social,
    #[serde(rename = "Nature & Green Spaces")]
    Nature,
    #[serde(rename = "Residential")]
    Residential,
    #[serde(rename = "Water Bodies")]
    Water,
    #[serde(rename = "Others")]
    Others,
}

impl LandUse {
    /// Block share classes in property-declaration order
    pub const SHARES: [LandUse; 10] = [
        LandUse::Agricultural,
        LandUse::Business,
        LandUse::Center,
        LandUse::Culture,
        LandUse::Retail,
        LandUse::Hospitality,
        LandUse::Social,
        LandUse::Nature,
        LandUse::Residential,
        LandUse::Water,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LandUse::Agricultural => "Agricultural",
            LandUse::Business => "Business & Industry",
            LandUse::Center => "Center & Mixed-Use",
            LandUse::Culture => "Culture, Recreation & Sports",
            LandUse::Retail => "Retail & Services",
            LandUse::Hospitality => "Hospitality & Office",
            LandUse::Social => "Social & Community",
            LandUse::Nature => "Nature & Green Spaces",
            LandUse::Residential => "Residential",
            LandUse::Water => "Water Bodies",
            LandUse::Others => "Others",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::SHARES
            .into_iter()
            .chain(std::iter::once(LandUse::Others))
            .find(|l| l.label() == label)
    }

    /// Block attribute carrying this class's share
    pub fn property_key(&self) -> Option<&'static str> {
        match self {
            LandUse::Agricultural => Some("prop_agriculture"),
            LandUse::Business => Some("prop_business"),
            LandUse::Center => Some("prop_center"),
            LandUse::Culture => Some("prop_culture"),
            LandUse::Retail => Some("prop_retail"),
            LandUse::Hospitality => Some("prop_hospitality"),
            LandUse::Social => Some("prop_social"),
            LandUse::Nature => Some("prop_nature"),
            LandUse::Residential => Some("prop_residential"),
            LandUse::Water => Some("prop_water"),
            LandUse::Others => None,
        }
    }

    pub fn instrument(&self) -> Instrument {
        match self {
            LandUse::Agricultural => Instrument::Hangdrum,
            LandUse::Business => Instrument::Trumpet,
            LandUse::Center => Instrument::Violin,
            LandUse::Culture => Instrument::Xylo,
            LandUse::Retail => Instrument::Oboe,
            LandUse::Hospitality => Instrument::Bass,
            LandUse::Social => Instrument::Organ,
            LandUse::Nature => Instrument::Flute,
            LandUse::Residential => Instrument::Piano,
            LandUse::Water => Instrument::Glockens,
            LandUse::Others => Instrument::Melodic,
        }
    }

    /// Base colour as `#RRGGBB`
    pub fn color(&self) -> &'static str {
        match self {
            LandUse::Agricultural => "#A8D08D",
            LandUse::Business => "#1F4E79",
            LandUse::Center => "#FFB84D",
            LandUse::Culture => "#A4C9E1",
            LandUse::Retail => "#F1A7C3",
            LandUse::Hospitality => "#D9A0D1",
            LandUse::Social => "#D3A76D",
            LandUse::Nature => "#4C9F70",
            LandUse::Residential => "#FFEC8B",
            LandUse::Water => "#4A90E2",
            LandUse::Others => "#B0B0B0",
        }
    }
}

impl fmt::Display for LandUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One class's proportion of a block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandUseShare {
    pub class: LandUse,
    pub proportion: f64,
}

/// An instrument entrance for a land-use share
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentVoice {
    pub class: LandUse,
    pub instrument: Instrument,
    pub volume: f64,
}

/// Land-use shares of one block, kept in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandUseMix {
    shares: Vec<LandUseShare>,
}

impl LandUseMix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a share (builder pattern)
    pub fn with(mut self, class: LandUse, proportion: f64) -> Self {
        self.shares.push(LandUseShare { class, proportion });
        self
    }

    /// Read the ten `prop_*` attributes; missing or malformed ones count as zero
    pub fn from_attributes(attrs: &FeatureAttributes) -> Self {
        let shares = LandUse::SHARES
            .iter()
            .filter_map(|class| {
                let key = class.property_key()?;
                Some(LandUseShare {
                    class: *class,
                    proportion: attrs.number_or(key, 0.0),
                })
            })
            .collect();
        Self { shares }
    }

    /// Every share as supplied, zeros included
    pub fn shares(&self) -> &[LandUseShare] {
        &self.shares
    }

    /// Shares with a positive proportion, in declaration order
    pub fn positive(&self) -> Vec<LandUseShare> {
        self.shares
            .iter()
            .copied()
            .filter(|s| s.proportion > 0.0)
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.positive().iter().map(|s| s.proportion).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() < EMPTY_TOTAL
    }

    /// Up to `n` positive shares, largest first; ties keep declaration order
    pub fn top(&self, n: usize) -> Vec<LandUseShare> {
        let mut positive = self.positive();
        // sort_by is stable
        positive.sort_by(|a, b| b.proportion.total_cmp(&a.proportion));
        positive.truncate(n);
        positive
    }

    pub fn dominant(&self) -> Option<LandUse> {
        self.top(1).first().map(|s| s.class)
    }

    /// Instrument entrances for the top three shares
    ///
    /// The largest share plays at exactly `base_volume`; the rest scale
    /// linearly against it.
    pub fn instrument_voices(&self, base_volume: f64) -> Vec<InstrumentVoice> {
        let top = self.top(3);
        let Some(first) = top.first() else {
            return Vec::new();
        };
        let scale = base_volume / first.proportion;
        top.iter()
            .enumerate()
            .map(|(i, s)| InstrumentVoice {
                class: s.class,
                instrument: s.class.instrument(),
                // the leader is pinned so rounding never moves it off base
                volume: if i == 0 {
                    base_volume
                } else {
                    s.proportion * scale
                },
            })
            .collect()
    }

    /// Fractions of the positive total, for glyph slices
    ///
    /// Declaration order; a mix with no positive share becomes a single
    /// `Others` slice covering the whole glyph.
    pub fn visual_fractions(&self) -> Vec<LandUseShare> {
        let total = self.total();
        if total < EMPTY_TOTAL {
            return vec![LandUseShare {
                class: LandUse::Others,
                proportion: 1.0,
            }];
        }
        self.positive()
            .into_iter()
            .map(|s| LandUseShare {
                class: s.class,
                proportion: s.proportion / total,
            })
            .collect()
    }
}
