//! Visual descriptors for block glyphs

use serde::Serialize;

use super::land_use::{LandUse, LandUseMix};
use super::metrics::MetricSet;
use super::street::StreetScores;
use super::tables::{AGE_ALPHA, HEIGHT_SIZE};
use super::Classifier;

/// Outline stroke width in viewport units
pub const STROKE_WIDTH: f64 = 1.5;

/// Glyph size when the height metric is off
pub const NEUTRAL_SIZE: f64 = 48.0;

/// Glyph alpha when the age metric is off
pub const NEUTRAL_ALPHA: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DotPosition {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Up,
    Down,
}

/// Glyph shape family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Parallelogram,
    Triangle(Orientation),
    /// Circle with an optional street-subtype dot
    Circle(Option<DotPosition>),
}

/// Which parts of the glyph are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Coloured slices plus outline
    Sliced,
    /// Outline only
    OutlineOnly,
    /// Coloured slices without outline or dot
    FillOnly,
}

/// One coloured region of a glyph
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorSlice {
    pub class: LandUse,
    pub color: &'static str,
    pub fraction: f64,
}

/// Everything the glyph renderer needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualDescriptor {
    pub shape: ShapeKind,
    pub fill: FillMode,
    pub size: f64,
    pub stroke_width: f64,
    pub alpha: f64,
    pub slices: Vec<ColorSlice>,
}

impl VisualDescriptor {
    /// Describe a city block
    ///
    /// Slices follow declaration order, except on triangles where they are
    /// sorted largest first so the fan starts with the dominant class.
    pub fn describe(
        height: f64,
        age: f64,
        mix: &LandUseMix,
        streets: &StreetScores,
        metrics: MetricSet,
    ) -> Self {
        let size = if metrics.height {
            HEIGHT_SIZE.classify(height)
        } else {
            NEUTRAL_SIZE
        };
        let alpha = if metrics.age {
            AGE_ALPHA.classify(age)
        } else {
            NEUTRAL_ALPHA
        };

        let shares = if metrics.land_use {
            mix.visual_fractions()
        } else {
            LandUseMix::new().visual_fractions()
        };
        let mut slices: Vec<ColorSlice> = shares
            .into_iter()
            .map(|s| ColorSlice {
                class: s.class,
                color: s.class.color(),
                fraction: s.proportion,
            })
            .collect();

        let (shape, fill) = if !metrics.street {
            (ShapeKind::Circle(None), FillMode::FillOnly)
        } else if metrics.only_street() {
            (streets.dominant().shape(), FillMode::OutlineOnly)
        } else {
            (streets.dominant().shape(), FillMode::Sliced)
        };

        if matches!(shape, ShapeKind::Triangle(_)) {
            slices.sort_by(|a, b| b.fraction.total_cmp(&a.fraction));
        }

        Self {
            shape,
            fill,
            size,
            stroke_width: STROKE_WIDTH,
            alpha,
            slices,
        }
    }

    /// Top-left offset of the shape's bounding square in the 100x100 viewport
    pub fn offset(&self) -> f64 {
        (100.0 - self.size) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{DotPosition, StreetType};

    fn mix() -> LandUseMix {
        LandUseMix::new()
            .with(LandUse::Nature, 0.3)
            .with(LandUse::Residential, 0.6)
            .with(LandUse::Water, 0.1)
    }

    #[test]
    fn test_describe_all_metrics() {
        let streets = StreetScores::new().with(StreetType::T23, 0.9);
        let d = VisualDescriptor::describe(10.0, 100.0, &mix(), &streets, MetricSet::all());

        assert_eq!(d.size, 31.0);
        assert_eq!(d.alpha, 0.64);
        assert_eq!(d.stroke_width, 1.5);
        assert_eq!(d.shape, ShapeKind::Circle(Some(DotPosition::Right)));
        assert_eq!(d.fill, FillMode::Sliced);
        assert_eq!(d.slices[0].class, LandUse::Nature);
        assert!((d.offset() - 34.5).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_slices_sorted() {
        let streets = StreetScores::new().with(StreetType::T42, 1.0);
        let d = VisualDescriptor::describe(10.0, 100.0, &mix(), &streets, MetricSet::all());

        assert_eq!(d.shape, ShapeKind::Triangle(Orientation::Down));
        let classes: Vec<LandUse> = d.slices.iter().map(|s| s.class).collect();
        assert_eq!(
            classes,
            vec![LandUse::Residential, LandUse::Nature, LandUse::Water]
        );
    }

    #[test]
    fn test_street_off_is_plain_circle() {
        let metrics = MetricSet {
            street: false,
            ..MetricSet::all()
        };
        let streets = StreetScores::new().with(StreetType::T12, 1.0);
        let d = VisualDescriptor::describe(10.0, 100.0, &mix(), &streets, metrics);
        assert_eq!(d.shape, ShapeKind::Circle(None));
        assert_eq!(d.fill, FillMode::FillOnly);
    }

    #[test]
    fn test_only_street_is_outline() {
        let metrics = MetricSet {
            street: true,
            ..MetricSet::none()
        };
        let streets = StreetScores::new().with(StreetType::T31, 1.0);
        let d = VisualDescriptor::describe(80.0, 10.0, &mix(), &streets, metrics);
        assert_eq!(d.shape, ShapeKind::Parallelogram);
        assert_eq!(d.fill, FillMode::OutlineOnly);
        assert_eq!(d.size, NEUTRAL_SIZE);
        assert_eq!(d.alpha, NEUTRAL_ALPHA);
    }

    #[test]
    fn test_land_use_off_is_grey() {
        let metrics = MetricSet {
            land_use: false,
            ..MetricSet::all()
        };
        let d = VisualDescriptor::describe(10.0, 100.0, &mix(), &StreetScores::new(), metrics);
        assert_eq!(d.slices.len(), 1);
        assert_eq!(d.slices[0].class, LandUse::Others);
        assert_eq!(d.slices[0].color, "#B0B0B0");
        assert_eq!(d.slices[0].fraction, 1.0);
    }
}
