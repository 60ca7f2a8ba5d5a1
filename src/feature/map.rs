//! Map collaborator trait and an in-memory map

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::{Feature, FeatureAttributes, Geometry, LayerKind, ScreenPoint, ScreenRect};

/// Pick radius for lines and points, in pixels
const PICK_RADIUS_PX: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("map style is not loaded yet")]
    StyleNotLoaded,
    #[error("unknown layer '{0}'")]
    UnknownLayer(String),
    #[error("feature query failed: {0}")]
    Query(String),
}

/// Block highlight pushed to the map's highlight source
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub geometry: Geometry,
    /// Solid fill colour (identify-clusters mode); `None` draws the default outline
    pub fill: Option<String>,
}

/// What the trigger gate needs from the map renderer
pub trait MapView {
    /// Style and layers are ready for queries
    fn is_style_loaded(&self) -> bool;

    /// Features under a screen point, topmost first
    fn features_at(&self, point: ScreenPoint) -> Result<Vec<Feature>, MapError>;

    /// Features of `layers` intersecting a screen rectangle
    fn features_in(&self, rect: ScreenRect, layers: &[LayerKind]) -> Result<Vec<Feature>, MapError>;

    /// Features of `layer` currently rendered anywhere in the viewport
    fn rendered_features(&self, layer: LayerKind) -> Result<Vec<Feature>, MapError>;

    fn is_layer_visible(&self, layer: LayerKind) -> bool;

    /// Map coordinate to screen position
    fn project(&self, coord: [f64; 2]) -> ScreenPoint;

    /// Replace (or clear) the block highlight
    fn set_highlight(&mut self, highlight: Option<Highlight>);

    /// Restrict an overlay layer to the given block codes (empty shows none)
    fn set_layer_filter(&mut self, layer: &str, codes: &[&str]) -> Result<(), MapError>;
}

/// Linear camera: `scale` pixels per map unit, north up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    #[serde(default)]
    pub center: [f64; 2],
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_scale() -> f64 { 1.0 }
fn default_width() -> f64 { 800.0 }
fn default_height() -> f64 { 600.0 }

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            scale: default_scale(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Camera {
    pub fn project(&self, coord: [f64; 2]) -> ScreenPoint {
        ScreenPoint::new(
            self.width / 2.0 + (coord[0] - self.center[0]) * self.scale,
            self.height / 2.0 - (coord[1] - self.center[1]) * self.scale,
        )
    }

    pub fn unproject(&self, p: ScreenPoint) -> [f64; 2] {
        [
            self.center[0] + (p.x - self.width / 2.0) / self.scale,
            self.center[1] - (p.y - self.height / 2.0) / self.scale,
        ]
    }

    /// Drag the map content by `(dx, dy)` pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.center[0] -= dx / self.scale;
        self.center[1] += dy / self.scale;
    }

    pub fn viewport(&self) -> ScreenRect {
        ScreenRect {
            min: ScreenPoint::new(0.0, 0.0),
            max: ScreenPoint::new(self.width, self.height),
        }
    }
}

/// A feature as written in a map file; its layer comes from the enclosing [`LayerSpec`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: FeatureAttributes,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// One layer of a [`StaticMap`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: LayerKind,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub features: Vec<FeatureRecord>,
}

fn default_visible() -> bool { true }

/// In-memory map used for replay and tests
///
/// Layers are drawn in declaration order, so later layers sit on top and
/// are returned first by point queries. Hidden layers are not rendered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticMap {
    #[serde(default = "default_visible")]
    pub style_loaded: bool,
    #[serde(default)]
    pub camera: Camera,
    #[serde(default)]
    pub layers: Vec<LayerSpec>,

    #[serde(skip)]
    highlight: Option<Highlight>,
    #[serde(skip)]
    filters: HashMap<String, Vec<String>>,
}

impl StaticMap {
    pub fn new() -> Self {
        Self {
            style_loaded: true,
            ..Self::default()
        }
    }

    /// Add a layer (builder pattern)
    pub fn with_layer(mut self, id: LayerKind, visible: bool, features: Vec<Feature>) -> Self {
        self.layers.push(LayerSpec {
            id,
            visible,
            features: features
                .into_iter()
                .map(|f| FeatureRecord {
                    id: f.id,
                    properties: f.properties,
                    geometry: f.geometry,
                })
                .collect(),
        });
        self
    }

    pub fn set_style_loaded(&mut self, loaded: bool) {
        self.style_loaded = loaded;
    }

    pub fn set_layer_visible(&mut self, layer: LayerKind, visible: bool) {
        for spec in self.layers.iter_mut().filter(|l| l.id == layer) {
            spec.visible = visible;
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    /// Codes currently shown on an overlay layer
    pub fn filter(&self, layer: &str) -> Option<&[String]> {
        self.filters.get(layer).map(Vec::as_slice)
    }

    fn ensure_loaded(&self) -> Result<(), MapError> {
        if self.style_loaded {
            Ok(())
        } else {
            Err(MapError::StyleNotLoaded)
        }
    }

    /// Visible features, topmost first
    fn rendered(&self) -> impl Iterator<Item = Feature> + '_ {
        self.layers
            .iter()
            .rev()
            .filter(|l| l.visible)
            .flat_map(|l| {
                l.features.iter().rev().map(move |r| Feature {
                    id: r.id.clone(),
                    layer: l.id,
                    properties: r.properties.clone(),
                    geometry: r.geometry.clone(),
                })
            })
    }

    fn hit(&self, feature: &Feature, point: ScreenPoint) -> bool {
        let Some(geometry) = &feature.geometry else {
            return false;
        };
        let tolerance = PICK_RADIUS_PX / self.camera.scale;
        geometry.contains(self.camera.unproject(point), tolerance)
    }

    fn intersects(&self, feature: &Feature, rect: ScreenRect) -> bool {
        let Some(geometry) = &feature.geometry else {
            return false;
        };
        vertices(geometry)
            .into_iter()
            .any(|c| rect.contains(self.camera.project(c)))
            || rect.probe_points().iter().any(|p| self.hit(feature, *p))
    }
}

fn vertices(geometry: &Geometry) -> Vec<[f64; 2]> {
    match geometry {
        Geometry::Point(c) => vec![*c],
        Geometry::LineString(coords) => coords.clone(),
        Geometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
    }
}

impl MapView for StaticMap {
    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn features_at(&self, point: ScreenPoint) -> Result<Vec<Feature>, MapError> {
        self.ensure_loaded()?;
        Ok(self.rendered().filter(|f| self.hit(f, point)).collect())
    }

    fn features_in(&self, rect: ScreenRect, layers: &[LayerKind]) -> Result<Vec<Feature>, MapError> {
        self.ensure_loaded()?;
        Ok(self
            .rendered()
            .filter(|f| layers.contains(&f.layer))
            .filter(|f| self.intersects(f, rect))
            .collect())
    }

    fn rendered_features(&self, layer: LayerKind) -> Result<Vec<Feature>, MapError> {
        self.ensure_loaded()?;
        let viewport = self.camera.viewport();
        Ok(self
            .rendered()
            .filter(|f| f.layer == layer)
            .filter(|f| self.intersects(f, viewport))
            .collect())
    }

    fn is_layer_visible(&self, layer: LayerKind) -> bool {
        self.layers.iter().any(|l| l.id == layer && l.visible)
    }

    fn project(&self, coord: [f64; 2]) -> ScreenPoint {
        self.camera.project(coord)
    }

    fn set_highlight(&mut self, highlight: Option<Highlight>) {
        self.highlight = highlight;
    }

    fn set_layer_filter(&mut self, layer: &str, codes: &[&str]) -> Result<(), MapError> {
        self.ensure_loaded()?;
        self.filters.insert(
            layer.to_string(),
            codes.iter().map(|c| c.to_string()).collect(),
        );
        Ok(())
    }
}
