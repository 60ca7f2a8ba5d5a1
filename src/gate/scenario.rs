//! Scripted sessions
//!
//! A scenario is an in-memory map plus a list of timed UI events. Replaying
//! one drives a [`Session`] exactly as live pointer input would.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::highlight::TaskBlockSet;
use super::legend::LegendItem;
use super::session::{Session, SessionEvent};
use super::toggles::{Toggle, ToggleSnapshot};
use crate::config::MapsonicConfig;
use crate::engine::AudioBackend;
use crate::feature::{LayerKind, ScreenPoint, StaticMap};

/// One UI event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Move { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    /// Pointer left every feature of a layer
    Leave { layer: LayerKind },
    /// Pointer left the map
    Exit,
    /// Drag the map by screen pixels
    Pan { dx: f64, dy: f64 },
    Toggle { toggle: Toggle, on: bool },
    LegendClick { layer: LayerKind, item: LegendItem },
    TaskBlocks { set: TaskBlockSet, on: bool },
    StyleLoaded { loaded: bool },
    LayerVisible { layer: LayerKind, visible: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

impl TimedEvent {
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

/// A map and the events played against it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub map: StaticMap,

    /// Toggle state at the start; the config's toggles when absent
    #[serde(default)]
    pub toggles: Option<ToggleSnapshot>,

    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

impl Scenario {
    /// Load a YAML (or JSON) scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario: {:?}", path))?;
        let mut scenario: Scenario = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse scenario: {:?}", path))?;
        scenario.events.sort_by_key(|e| e.at_ms);
        Ok(scenario)
    }
}

/// Replays a scenario against a session
pub struct Replay<A: AudioBackend> {
    session: Session<StaticMap, A>,
    toggles: ToggleSnapshot,
    events: Vec<TimedEvent>,
    cursor: usize,
}

impl<A: AudioBackend> Replay<A> {
    pub fn new(scenario: Scenario, backend: A, config: &MapsonicConfig) -> Self {
        let toggles = scenario.toggles.unwrap_or(config.toggles);
        let config = MapsonicConfig {
            toggles,
            ..config.clone()
        };
        let mut events = scenario.events;
        events.sort_by_key(|e| e.at_ms);
        Self {
            session: Session::new(scenario.map, backend, &config),
            toggles,
            events,
            cursor: 0,
        }
    }

    pub fn session(&self) -> &Session<StaticMap, A> {
        &self.session
    }

    pub fn toggles(&self) -> &ToggleSnapshot {
        &self.toggles
    }

    pub fn into_session(self) -> Session<StaticMap, A> {
        self.session
    }

    /// Next instant at which an event or a timer is due
    pub fn next_instant(&self) -> Option<Duration> {
        let event = self.events.get(self.cursor).map(TimedEvent::at);
        match (event, self.session.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_done(&self) -> bool {
        self.next_instant().is_none()
    }

    /// Run every event and timer due at or before `now`
    pub fn step(&mut self, now: Duration) {
        while let Some(event) = self.events.get(self.cursor) {
            if event.at() > now {
                break;
            }
            let event = event.clone();
            self.cursor += 1;
            self.apply(&event);
        }
        self.session.advance(now, &self.toggles);
    }

    /// Replay everything without pacing
    pub fn run_to_end(&mut self) {
        while let Some(at) = self.next_instant() {
            self.step(at);
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.session.drain_events()
    }

    fn apply(&mut self, event: &TimedEvent) {
        let now = event.at();
        debug!(at_ms = event.at_ms, action = ?event.action, "replaying");
        let s = &mut self.session;
        match &event.action {
            Action::Move { x, y } => s.pointer_move(now, ScreenPoint::new(*x, *y), &self.toggles),
            Action::Click { x, y } => s.click(now, ScreenPoint::new(*x, *y), &self.toggles),
            Action::Leave { layer } => s.pointer_leave(now, *layer, &self.toggles),
            Action::Exit => s.pointer_exit(now, &self.toggles),
            Action::Pan { dx, dy } => {
                s.advance(now, &self.toggles);
                s.map_mut().pan(*dx, *dy);
                s.map_moved(now, &self.toggles);
            }
            Action::Toggle { toggle, on } => {
                self.toggles.set(*toggle, *on);
                match toggle {
                    Toggle::Sound => s.sound_toggled(now, *on, &self.toggles),
                    Toggle::Visual => s.visual_toggled(now, *on, &self.toggles),
                    Toggle::VisualHeight
                    | Toggle::VisualAge
                    | Toggle::VisualLandUse
                    | Toggle::VisualStreet => s.visual_metrics_changed(now, &self.toggles),
                    _ => s.advance(now, &self.toggles),
                }
            }
            Action::LegendClick { layer, item } => {
                s.legend_click(now, *layer, item, &self.toggles)
            }
            Action::TaskBlocks { set, on } => s.set_task_blocks(now, *set, *on, &self.toggles),
            Action::StyleLoaded { loaded } => {
                s.advance(now, &self.toggles);
                s.map_mut().set_style_loaded(*loaded);
            }
            Action::LayerVisible { layer, visible } => {
                s.advance(now, &self.toggles);
                s.map_mut().set_layer_visible(*layer, *visible);
                if *layer == LayerKind::CityBlocks && *visible {
                    s.refresh_task_blocks(now, &self.toggles);
                }
            }
        }
    }
}
