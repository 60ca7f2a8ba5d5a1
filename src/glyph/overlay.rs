//! On-map glyph display window
//!
//! The overlay holds the current glyph, the map coordinate it is anchored
//! to and its screen position. Timing lives with the caller: it calls
//! [`GlyphOverlay::begin_fade`] and [`GlyphOverlay::hide`] when its timers
//! fire.

use serde::Serialize;

use super::shape::Glyph;
use crate::feature::{MapView, ScreenPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayState {
    Hidden,
    Visible,
    Fading,
}

#[derive(Debug, Clone)]
pub struct GlyphOverlay {
    state: OverlayState,
    glyph: Option<Glyph>,
    anchor: Option<[f64; 2]>,
    position: Option<ScreenPoint>,
}

impl Default for GlyphOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphOverlay {
    pub fn new() -> Self {
        Self {
            state: OverlayState::Hidden,
            glyph: None,
            anchor: None,
            position: None,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.state != OverlayState::Hidden
    }

    pub fn glyph(&self) -> Option<&Glyph> {
        self.glyph.as_ref()
    }

    pub fn anchor(&self) -> Option<[f64; 2]> {
        self.anchor
    }

    pub fn position(&self) -> Option<ScreenPoint> {
        self.position
    }

    /// Show `glyph` at `anchor`, or at `fallback` when the feature has no
    /// centroid
    pub fn show(
        &mut self,
        glyph: Glyph,
        anchor: Option<[f64; 2]>,
        fallback: ScreenPoint,
        map: &impl MapView,
    ) {
        self.glyph = Some(glyph);
        self.anchor = anchor;
        self.position = Some(anchor.map(|a| map.project(a)).unwrap_or(fallback));
        self.state = OverlayState::Visible;
    }

    /// Start the fade-out; only a visible glyph can fade
    pub fn begin_fade(&mut self) -> bool {
        if self.state == OverlayState::Visible {
            self.state = OverlayState::Fading;
            return true;
        }
        false
    }

    /// Swap the drawing of a shown glyph in place; timers and position stay
    pub fn redraw(&mut self, glyph: Glyph) -> bool {
        if !self.is_shown() {
            return false;
        }
        self.glyph = Some(glyph);
        true
    }

    pub fn hide(&mut self) {
        self.state = OverlayState::Hidden;
        self.glyph = None;
        self.anchor = None;
        self.position = None;
    }

    /// Track the anchor after the map moved; returns the new position
    pub fn reposition(&mut self, map: &impl MapView) -> Option<ScreenPoint> {
        if !self.is_shown() {
            return None;
        }
        if let Some(anchor) = self.anchor {
            self.position = Some(map.project(anchor));
        }
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::StaticMap;

    fn glyph() -> Glyph {
        Glyph {
            elements: Vec::new(),
        }
    }

    #[test]
    fn test_show_fade_hide() {
        let map = StaticMap::new();
        let mut overlay = GlyphOverlay::new();
        assert!(!overlay.begin_fade());

        overlay.show(glyph(), Some([10.0, 20.0]), ScreenPoint::new(0.0, 0.0), &map);
        assert_eq!(overlay.state(), OverlayState::Visible);
        assert_eq!(overlay.position(), Some(map.project([10.0, 20.0])));

        assert!(overlay.begin_fade());
        assert_eq!(overlay.state(), OverlayState::Fading);
        assert!(!overlay.begin_fade());
        assert!(overlay.redraw(glyph()));
        assert_eq!(overlay.state(), OverlayState::Fading);

        overlay.hide();
        assert!(!overlay.is_shown());
        assert!(overlay.glyph().is_none());
    }

    #[test]
    fn test_reposition_follows_pan() {
        let mut map = StaticMap::new();
        let mut overlay = GlyphOverlay::new();
        overlay.show(glyph(), Some([0.0, 0.0]), ScreenPoint::new(0.0, 0.0), &map);
        let before = overlay.position().unwrap();

        map.pan(25.0, -10.0);
        let after = overlay.reposition(&map).unwrap();
        assert!((after.x - before.x - 25.0).abs() < 1e-9);
        assert!((after.y - before.y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_without_anchor_uses_fallback() {
        let map = StaticMap::new();
        let mut overlay = GlyphOverlay::new();
        let pointer = ScreenPoint::new(120.0, 80.0);
        overlay.show(glyph(), None, pointer, &map);
        assert_eq!(overlay.position(), Some(pointer));
        assert_eq!(overlay.reposition(&map), Some(pointer));
    }

    #[test]
    fn test_hidden_overlay_does_not_move() {
        let map = StaticMap::new();
        let mut overlay = GlyphOverlay::new();
        assert_eq!(overlay.reposition(&map), None);
    }
}
