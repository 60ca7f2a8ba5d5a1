//! Glyph rendering
//!
//! Turns a [`VisualDescriptor`] into vector primitives in a 100x100
//! viewport, serialises them as SVG and keeps the on-map display state.

mod overlay;
mod shape;
mod svg;

pub use overlay::{GlyphOverlay, OverlayState};
pub use shape::{render, rgba, Element, Glyph, Stroke, CENTER, STROKE_COLOR};
pub use svg::to_svg;

use crate::feature::{BlockProperties, FeatureAttributes};
use crate::mapping::{MetricSet, VisualDescriptor};

/// Visual descriptor for a city block's attributes
///
/// Blocks without height or age data draw in the smallest, faintest class.
pub fn describe_block(attrs: &FeatureAttributes, metrics: MetricSet) -> VisualDescriptor {
    let block = BlockProperties::from_attributes(attrs);
    VisualDescriptor::describe(
        block.visual_height(),
        block.visual_age(),
        &block.land_use,
        &block.streets,
        metrics,
    )
}

/// Render a city block straight from its attributes
pub fn block_glyph(attrs: &FeatureAttributes, metrics: MetricSet) -> Glyph {
    render(&describe_block(attrs, metrics))
}
