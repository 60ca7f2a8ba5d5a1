//! Feature geometry and screen-space helpers

use serde::{Deserialize, Serialize};

/// A position on screen, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned screen rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl ScreenRect {
    /// Square of half-width `radius` centred on `center`
    pub fn around(center: ScreenPoint, radius: f64) -> Self {
        Self {
            min: ScreenPoint::new(center.x - radius, center.y - radius),
            max: ScreenPoint::new(center.x + radius, center.y + radius),
        }
    }

    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Centre plus the four corners
    pub fn probe_points(&self) -> [ScreenPoint; 5] {
        [
            ScreenPoint::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0),
            self.min,
            ScreenPoint::new(self.max.x, self.min.y),
            self.max,
            ScreenPoint::new(self.min.x, self.max.y),
        ]
    }
}

/// GeoJSON-style geometry in map coordinates (`[x, y]` pairs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

impl Geometry {
    /// Arithmetic mean of the outer ring's vertices
    ///
    /// Only polygons have a centroid; the closing vertex counts like any other.
    pub fn centroid(&self) -> Option<[f64; 2]> {
        let Geometry::Polygon(rings) = self else {
            return None;
        };
        let outer = rings.first()?;
        if outer.is_empty() {
            return None;
        }
        let (sx, sy) = outer
            .iter()
            .fold((0.0, 0.0), |(sx, sy), c| (sx + c[0], sy + c[1]));
        let n = outer.len() as f64;
        Some([sx / n, sy / n])
    }

    /// Hit test in map coordinates; lines and points use `tolerance`
    pub fn contains(&self, p: [f64; 2], tolerance: f64) -> bool {
        match self {
            Geometry::Point(c) => distance(*c, p) <= tolerance,
            Geometry::LineString(coords) => coords
                .windows(2)
                .any(|seg| segment_distance(seg[0], seg[1], p) <= tolerance),
            Geometry::Polygon(rings) => {
                let Some(outer) = rings.first() else {
                    return false;
                };
                if !ring_contains(outer, p) {
                    return false;
                }
                // holes
                !rings[1..].iter().any(|hole| ring_contains(hole, p))
            }
        }
    }
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn segment_distance(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return distance(a, p);
    }
    let t = (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len2).clamp(0.0, 1.0);
    distance([a[0] + t * dx, a[1] + t * dy], p)
}

/// Even-odd ray casting
fn ring_contains(ring: &[[f64; 2]], p: [f64; 2]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > p[1]) != (yj > p[1]) && p[0] < (xj - xi) * (p[1] - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
