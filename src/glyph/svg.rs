//! SVG serialisation

use std::fmt::Write;

use super::shape::{Element, Glyph, Stroke};

fn stroke_attrs(stroke: &Option<Stroke>) -> String {
    match stroke {
        Some(s) => format!(
            r#" stroke="{}" stroke-width="{}" paint-order="stroke""#,
            s.color, s.width
        ),
        None => String::new(),
    }
}

fn fill_attr(fill: &Option<String>) -> String {
    format!(r#" fill="{}""#, fill.as_deref().unwrap_or("none"))
}

fn element_svg(element: &Element) -> String {
    match element {
        Element::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"{}{}/>"#,
            x,
            y,
            width,
            height,
            fill_attr(fill),
            stroke_attrs(stroke)
        ),
        Element::Polygon {
            points,
            fill,
            stroke,
        } => {
            let mut d = String::new();
            for (i, [x, y]) in points.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{} {:.2} {:.2} ", cmd, x, y);
            }
            d.push('Z');
            format!(
                r#"<path d="{}"{}{}/>"#,
                d,
                fill_attr(fill),
                stroke_attrs(stroke)
            )
        }
        Element::Sector {
            center,
            radius,
            start,
            end,
            fill,
        } => {
            let [cx, cy] = *center;
            let (x1, y1) = (cx + radius * start.cos(), cy + radius * start.sin());
            let (x2, y2) = (cx + radius * end.cos(), cy + radius * end.sin());
            let large_arc = u8::from(end - start > std::f64::consts::PI);
            format!(
                r#"<path d="M {:.2},{:.2} L {:.2},{:.2} A {:.2},{:.2} 0 {} 1 {:.2},{:.2} Z" fill="{}"/>"#,
                cx, cy, x1, y1, radius, radius, large_arc, x2, y2, fill
            )
        }
        Element::Circle {
            center,
            radius,
            fill,
            stroke,
        } => format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}"{}{}/>"#,
            center[0],
            center[1],
            radius,
            fill_attr(fill),
            stroke_attrs(stroke)
        ),
    }
}

/// Standalone SVG document for a glyph
pub fn to_svg(glyph: &Glyph) -> String {
    let mut out = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100" preserveAspectRatio="xMidYMid meet"><g>"#,
    );
    for element in &glyph.elements {
        out.push_str(&element_svg(element));
    }
    out.push_str("</g></svg>");
    out
}
