//! Glyph geometry in a 100x100 viewport centred on (50, 50)

use serde::Serialize;
use std::f64::consts::PI;

use crate::mapping::{
    ColorSlice, DotPosition, FillMode, Orientation, ShapeKind, VisualDescriptor,
};

/// Viewport centre
pub const CENTER: f64 = 50.0;

/// Outline colour
pub const STROKE_COLOR: &str = "#000";

/// Parallelogram outline scale about the centre
const PARA_OUTLINE_SCALE: f64 = 1.02;

/// Dot radius and distance as fractions of the circle radius
const DOT_RADIUS: f64 = 0.15;
const DOT_DISTANCE: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: &'static str,
    pub width: f64,
}

impl Stroke {
    fn outline(width: f64) -> Self {
        Self {
            color: STROKE_COLOR,
            width,
        }
    }
}

/// A drawing primitive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<String>,
        stroke: Option<Stroke>,
    },
    Polygon {
        points: Vec<[f64; 2]>,
        fill: Option<String>,
        stroke: Option<Stroke>,
    },
    /// Pie slice from `start` to `end` radians, clockwise in screen space
    Sector {
        center: [f64; 2],
        radius: f64,
        start: f64,
        end: f64,
        fill: String,
    },
    Circle {
        center: [f64; 2],
        radius: f64,
        fill: Option<String>,
        stroke: Option<Stroke>,
    },
}

/// A rendered glyph, elements in paint order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Glyph {
    pub elements: Vec<Element>,
}

impl Glyph {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements carrying a fill colour
    pub fn filled(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| match e {
            Element::Sector { .. } => true,
            Element::Rect { fill, .. }
            | Element::Polygon { fill, .. }
            | Element::Circle { fill, .. } => fill.is_some(),
        })
    }
}

/// `#RRGGBB` (or `#RGB`) plus alpha as a CSS `rgba()` colour
///
/// Unparseable channels read as zero.
pub fn rgba(hex: &str, alpha: f64) -> String {
    let c = hex.trim_start_matches('#');
    let expanded: String = if c.len() == 3 {
        c.chars().flat_map(|ch| [ch, ch]).collect()
    } else {
        c.to_string()
    };
    let channel = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    format!("rgba({},{},{},{:.2})", channel(0), channel(2), channel(4), alpha)
}

/// Build the glyph for a visual descriptor
pub fn render(desc: &VisualDescriptor) -> Glyph {
    let mut elements = Vec::new();
    let size = desc.size;
    let sw = desc.stroke_width;

    let draw_slices = matches!(desc.fill, FillMode::Sliced | FillMode::FillOnly);
    let draw_outline = matches!(desc.fill, FillMode::Sliced | FillMode::OutlineOnly);

    match desc.shape {
        ShapeKind::Rect => {
            if draw_slices {
                rect_slices(&mut elements, desc);
            }
            if draw_outline {
                let offset = desc.offset();
                elements.push(Element::Rect {
                    x: offset - sw / 2.0,
                    y: offset - sw / 2.0,
                    width: size + sw,
                    height: size + sw,
                    fill: None,
                    stroke: Some(Stroke::outline(sw)),
                });
            }
        }
        ShapeKind::Parallelogram => {
            if draw_slices {
                para_slices(&mut elements, desc);
            }
            if draw_outline {
                let points = para_corners(size)
                    .iter()
                    .map(|&p| scale_about_center(p, PARA_OUTLINE_SCALE))
                    .collect();
                elements.push(Element::Polygon {
                    points,
                    fill: None,
                    stroke: Some(Stroke::outline(sw)),
                });
            }
        }
        ShapeKind::Triangle(orientation) => {
            if draw_slices {
                triangle_slices(&mut elements, desc, orientation);
            }
            if draw_outline {
                elements.push(Element::Polygon {
                    points: triangle_outline(size, orientation, sw / 2.0),
                    fill: None,
                    stroke: Some(Stroke::outline(sw)),
                });
            }
        }
        ShapeKind::Circle(dot) => {
            if draw_slices {
                circle_slices(&mut elements, desc);
            }
            if draw_outline {
                let r = size / 2.0;
                elements.push(Element::Circle {
                    center: [CENTER, CENTER],
                    radius: r + sw / 2.0,
                    fill: None,
                    stroke: Some(Stroke::outline(sw)),
                });
                // a bare circle in outline mode still marks the top
                let position = dot.unwrap_or(DotPosition::Top);
                elements.push(dot_element(r, position));
            }
        }
    }

    Glyph { elements }
}

fn fill(slice: &ColorSlice, alpha: f64) -> String {
    rgba(slice.color, alpha)
}

/// Vertical strips, left to right
fn rect_slices(out: &mut Vec<Element>, desc: &VisualDescriptor) {
    let offset = desc.offset();
    let mut x = offset;
    for slice in &desc.slices {
        let width = desc.size * slice.fraction;
        out.push(Element::Rect {
            x,
            y: offset,
            width,
            height: desc.size,
            fill: Some(fill(slice, desc.alpha)),
            stroke: None,
        });
        x += width;
    }
}

/// Corners of the parallelogram: top-left, top-right, bottom-right, bottom-left
///
/// The top edge is shifted right by a quarter of the size and the bottom
/// edge sits half a size left of it.
fn para_corners(size: f64) -> [[f64; 2]; 4] {
    let half = size / 2.0;
    let shift = size / 4.0;
    let top = CENTER - half;
    let bottom = CENTER + half;
    let left = CENTER - half + shift;
    [
        [left, top],
        [left + size, top],
        [left + size - half, bottom],
        [left - half, bottom],
    ]
}

fn para_slices(out: &mut Vec<Element>, desc: &VisualDescriptor) {
    let size = desc.size;
    let [top_left, _, _, _] = para_corners(size);
    let (left, top) = (top_left[0], top_left[1]);
    let bottom = top + size;
    let skew = size / 2.0;

    let mut start = 0.0;
    for slice in &desc.slices {
        let end = start + slice.fraction;
        let x1 = left + start * size;
        let x2 = left + end * size;
        out.push(Element::Polygon {
            points: vec![[x1, top], [x2, top], [x2 - skew, bottom], [x1 - skew, bottom]],
            fill: Some(fill(slice, desc.alpha)),
            stroke: None,
        });
        start = end;
    }
}

fn scale_about_center(p: [f64; 2], scale: f64) -> [f64; 2] {
    [
        CENTER + (p[0] - CENTER) * scale,
        CENTER + (p[1] - CENTER) * scale,
    ]
}

/// Apex, base y, left x and side length; height equals `size`
fn triangle_frame(size: f64, orientation: Orientation) -> ([f64; 2], f64, f64, f64) {
    let side = size / (3f64.sqrt() / 2.0);
    let top = CENTER - size / 2.0;
    let bottom = CENTER + size / 2.0;
    let left = CENTER - side / 2.0;
    match orientation {
        Orientation::Up => ([CENTER, top], bottom, left, side),
        Orientation::Down => ([CENTER, bottom], top, left, side),
    }
}

/// Fan of slices from the apex, each owning a stretch of the base
fn triangle_slices(out: &mut Vec<Element>, desc: &VisualDescriptor, orientation: Orientation) {
    let (apex, base_y, left, side) = triangle_frame(desc.size, orientation);
    let mut cum = 0.0;
    for slice in &desc.slices {
        let x_start = left + cum * side;
        let x_end = left + (cum + slice.fraction) * side;
        out.push(Element::Polygon {
            points: vec![apex, [x_start, base_y], [x_end, base_y]],
            fill: Some(fill(slice, desc.alpha)),
            stroke: None,
        });
        cum += slice.fraction;
    }
}

/// Triangle grown by `expand` on every side so the stroke sits outside
fn triangle_outline(size: f64, orientation: Orientation, expand: f64) -> Vec<[f64; 2]> {
    let side = size / (3f64.sqrt() / 2.0);
    let top = CENTER - size / 2.0 - expand;
    let bottom = CENTER + size / 2.0 + expand;
    let left = CENTER - side / 2.0 - expand;
    let right = CENTER + side / 2.0 + expand;
    match orientation {
        Orientation::Up => vec![[left, bottom], [right, bottom], [CENTER, top]],
        Orientation::Down => vec![[left, top], [right, top], [CENTER, bottom]],
    }
}

/// Angular sweep from 3 o'clock; a lone slice is a full disc
fn circle_slices(out: &mut Vec<Element>, desc: &VisualDescriptor) {
    let r = desc.size / 2.0;
    if let [only] = desc.slices.as_slice() {
        out.push(Element::Circle {
            center: [CENTER, CENTER],
            radius: r,
            fill: Some(fill(only, desc.alpha)),
            stroke: None,
        });
        return;
    }

    let mut start = 0.0;
    for slice in &desc.slices {
        let end = start + slice.fraction * 2.0 * PI;
        out.push(Element::Sector {
            center: [CENTER, CENTER],
            radius: r,
            start,
            end,
            fill: fill(slice, desc.alpha),
        });
        start = end;
    }
}

fn dot_element(r: f64, position: DotPosition) -> Element {
    let d = r * DOT_DISTANCE;
    let center = match position {
        DotPosition::Top => [CENTER, CENTER - d],
        DotPosition::Right => [CENTER + d, CENTER],
        DotPosition::Bottom => [CENTER, CENTER + d],
        DotPosition::Left => [CENTER - d, CENTER],
    };
    Element::Circle {
        center,
        radius: r * DOT_RADIUS,
        fill: Some(STROKE_COLOR.to_string()),
        stroke: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{LandUse, LandUseMix, MetricSet, StreetScores, StreetType};

    fn mix() -> LandUseMix {
        LandUseMix::new()
            .with(LandUse::Nature, 0.25)
            .with(LandUse::Residential, 0.75)
    }

    fn describe(street: StreetType, metrics: MetricSet) -> VisualDescriptor {
        let streets = StreetScores::new().with(street, 1.0);
        VisualDescriptor::describe(10.0, 100.0, &mix(), &streets, metrics)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rgba() {
        assert_eq!(rgba("#4C9F70", 0.64), "rgba(76,159,112,0.64)");
        assert_eq!(rgba("#000", 1.0), "rgba(0,0,0,1.00)");
        assert_eq!(rgba("#zzzzzz", 0.5), "rgba(0,0,0,0.50)");
    }

    #[test]
    fn test_rect_strips_and_outer_outline() {
        let glyph = render(&describe(StreetType::T12, MetricSet::all()));
        assert_eq!(glyph.len(), 3);

        // size 31 -> offset 34.5; nature first in insertion order
        match &glyph.elements[0] {
            Element::Rect { x, width, fill, .. } => {
                assert!(approx(*x, 34.5));
                assert!(approx(*width, 7.75));
                assert_eq!(fill.as_deref(), Some("rgba(76,159,112,0.64)"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match &glyph.elements[1] {
            Element::Rect { x, .. } => assert!(approx(*x, 42.25)),
            other => panic!("unexpected {:?}", other),
        }
        match &glyph.elements[2] {
            Element::Rect {
                x, width, stroke, fill, ..
            } => {
                assert!(approx(*x, 33.75));
                assert!(approx(*width, 32.5));
                assert!(fill.is_none());
                assert_eq!(stroke.map(|s| s.width), Some(1.5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parallelogram_geometry() {
        let glyph = render(&describe(StreetType::T31, MetricSet::all()));
        let Element::Polygon { points, .. } = &glyph.elements[0] else {
            panic!("expected polygon");
        };
        // size 31: left = 50 - 15.5 + 7.75
        assert!(approx(points[0][0], 42.25));
        assert!(approx(points[0][1], 34.5));
        assert!(approx(points[3][0], 42.25 - 15.5));
        assert!(approx(points[3][1], 65.5));

        let Element::Polygon { points, stroke, .. } = &glyph.elements[2] else {
            panic!("expected outline");
        };
        assert!(stroke.is_some());
        assert!(approx(points[0][0], 50.0 + (42.25 - 50.0) * 1.02));
    }

    #[test]
    fn test_triangle_slices_sorted_and_outline_expanded() {
        let glyph = render(&describe(StreetType::T41, MetricSet::all()));
        let Element::Polygon { points, fill, .. } = &glyph.elements[0] else {
            panic!("expected slice");
        };
        // residential (largest) first
        assert_eq!(fill.as_deref(), Some(rgba(LandUse::Residential.color(), 0.64).as_str()));
        assert_eq!(points[0], [50.0, 34.5]);
        assert!(approx(points[1][1], 65.5));

        for orientation in [StreetType::T41, StreetType::T42] {
            let glyph = render(&describe(orientation, MetricSet::all()));
            let Some(Element::Polygon { points, .. }) = glyph.elements.last() else {
                panic!("expected outline");
            };
            let ys: Vec<f64> = points.iter().map(|p| p[1]).collect();
            assert!(ys.iter().any(|y| approx(*y, 34.5 - 0.75)));
            assert!(ys.iter().any(|y| approx(*y, 65.5 + 0.75)));
        }
    }

    #[test]
    fn test_circle_sectors_and_dot() {
        let glyph = render(&describe(StreetType::T24, MetricSet::all()));
        // two sectors, outline, dot
        assert_eq!(glyph.len(), 4);
        let Element::Sector { start, end, .. } = &glyph.elements[0] else {
            panic!("expected sector");
        };
        assert_eq!(*start, 0.0);
        assert!(approx(*end, PI / 2.0));

        let Element::Circle { center, radius, .. } = &glyph.elements[3] else {
            panic!("expected dot");
        };
        assert!(approx(center[1], 50.0 + 15.5 * 0.85));
        assert!(approx(*radius, 15.5 * 0.15));
    }

    #[test]
    fn test_single_share_is_full_disc() {
        let streets = StreetScores::new().with(StreetType::T22, 1.0);
        let mix = LandUseMix::new().with(LandUse::Water, 0.4);
        let d = VisualDescriptor::describe(60.0, 10.0, &mix, &streets, MetricSet::all());
        let glyph = render(&d);
        assert!(matches!(
            glyph.elements[0],
            Element::Circle { fill: Some(_), .. }
        ));
    }

    #[test]
    fn test_street_off_draws_fill_only() {
        let mut metrics = MetricSet::all();
        metrics.street = false;
        let glyph = render(&describe(StreetType::T12, metrics));
        assert_eq!(glyph.len(), 2);
        assert!(glyph.elements.iter().all(|e| matches!(e, Element::Sector { .. })));
    }

    #[test]
    fn test_only_street_draws_outline() {
        let mut metrics = MetricSet::none();
        metrics.street = true;
        let glyph = render(&describe(StreetType::T12, metrics));
        assert_eq!(glyph.len(), 1);
        assert_eq!(glyph.filled().count(), 0);
    }
}
