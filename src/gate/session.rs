//! The trigger gate
//!
//! A [`Session`] owns everything that happens between a pointer event and
//! a sound or glyph: the hover throttle, the settle delay, per-channel
//! de-duplication, exit re-checks and the display timers. Time is virtual:
//! every entry point takes the current instant, and [`Session::advance`]
//! runs whatever came due in between.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::highlight::{block_highlight, TaskBlockSet, TaskBlockUpdate, TaskBlocks};
use super::legend::{legend_demo, legend_target, LegendItem};
use super::scheduler::{Scheduler, TaskId};
use super::state::{Channel, TriggerState};
use super::throttle::Throttle;
use super::toggles::{Toggle, Toggles};
use crate::config::{MapsonicConfig, TimingConfig};
use crate::engine::{AudioBackend, SoundDispatcher};
use crate::feature::{
    BlockProperties, Feature, FeatureAttributes, LayerKind, MapError, MapView, ScreenPoint,
    ScreenRect,
};
use crate::glyph::{block_glyph, to_svg, GlyphOverlay};

/// Half-size of the box probed for the city boundary, in pixels
const BOUNDARY_PROBE_PX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Task {
    /// Trailing edge of the hover throttle
    Trailing(ScreenPoint),
    /// Feature lookup after the settle delay
    Evaluate(ScreenPoint),
    ExitRecheck(LayerKind),
    GlyphFade,
    GlyphHide,
    IndicatorOff,
    TaskBlocksRetry(u32),
}

/// Something the session did, for the UI or a replay log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// A hover lookup ran; `layer` is the selected feature's layer
    Evaluated { layer: Option<LayerKind> },
    Sounded {
        layer: LayerKind,
        channel: Channel,
        key: Option<String>,
    },
    IndicatorShown { label: &'static str },
    IndicatorHidden,
    Highlighted { block: Option<String> },
    LegendHighlighted { item: Option<LegendItem> },
    GlyphShown { svg: String, x: f64, y: f64 },
    GlyphMoved { x: f64, y: f64 },
    GlyphFading,
    GlyphHidden,
    ChannelReset { channel: Channel },
    TaskBlocksApplied,
    TaskBlocksDeferred { attempt: u32 },
    Failed { message: String },
}

/// Interactive sonification session over a map and an audio backend
pub struct Session<M: MapView, A: AudioBackend> {
    map: M,
    audio: SoundDispatcher<A>,
    timing: TimingConfig,
    state: TriggerState,
    throttle: Throttle,
    tasks: Scheduler<Task>,
    now: Duration,
    settle: Option<TaskId>,

    hovered: Vec<LayerKind>,
    highlighted: Option<String>,
    legend: Option<LegendItem>,

    glyph: GlyphOverlay,
    glyph_source: Option<Feature>,
    glyph_timer: Option<TaskId>,

    indicator: Option<&'static str>,
    indicator_timer: Option<TaskId>,

    task_blocks: TaskBlocks,
    task_retry: Option<TaskId>,

    demo_serial: u64,
    events: Vec<SessionEvent>,
}

impl<M: MapView, A: AudioBackend> Session<M, A> {
    pub fn new(map: M, backend: A, config: &MapsonicConfig) -> Self {
        let mut audio = SoundDispatcher::new(backend, config.audio.clone());
        audio.set_active(config.toggles.sound);
        Self {
            map,
            audio,
            timing: config.timing.clone(),
            state: TriggerState::new(),
            throttle: Throttle::new(config.timing.hover_interval()),
            tasks: Scheduler::new(),
            now: Duration::ZERO,
            settle: None,
            hovered: Vec::new(),
            highlighted: None,
            legend: None,
            glyph: GlyphOverlay::new(),
            glyph_source: None,
            glyph_timer: None,
            indicator: None,
            indicator_timer: None,
            task_blocks: TaskBlocks::default(),
            task_retry: None,
            demo_serial: 0,
            events: Vec::new(),
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// Mutable map access; call [`Session::map_moved`] after moving the camera
    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn audio(&self) -> &SoundDispatcher<A> {
        &self.audio
    }

    pub fn into_parts(self) -> (M, A) {
        (self.map, self.audio.into_backend())
    }

    pub fn state(&self) -> &TriggerState {
        &self.state
    }

    pub fn evaluations(&self) -> u64 {
        self.state.evaluations()
    }

    pub fn glyph(&self) -> &GlyphOverlay {
        &self.glyph
    }

    pub fn legend(&self) -> Option<&LegendItem> {
        self.legend.as_ref()
    }

    /// Label of the sound indicator, while shown
    pub fn indicator(&self) -> Option<&'static str> {
        self.indicator
    }

    pub fn task_blocks(&self) -> TaskBlocks {
        self.task_blocks
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// When the next timer fires
    pub fn next_due(&self) -> Option<Duration> {
        self.tasks.next_due()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run every timer due up to `now`
    pub fn advance(&mut self, now: Duration, toggles: &impl Toggles) {
        while let Some((at, _, task)) = self.tasks.pop_due(now) {
            self.set_clock(at);
            self.run(task, toggles);
        }
        self.set_clock(now);
    }

    /// Pointer moved over the map
    pub fn pointer_move(&mut self, now: Duration, point: ScreenPoint, toggles: &impl Toggles) {
        self.advance(now, toggles);
        self.track_layers(point);
        if self.throttle.call(self.now, &mut self.tasks, Task::Trailing(point)) {
            self.schedule_settle(point);
        }
    }

    /// Pointer left every feature of `layer`
    pub fn pointer_leave(&mut self, now: Duration, layer: LayerKind, toggles: &impl Toggles) {
        self.advance(now, toggles);
        self.hovered.retain(|l| *l != layer);
        self.leave(layer);
    }

    /// Pointer left the map altogether
    pub fn pointer_exit(&mut self, now: Duration, toggles: &impl Toggles) {
        self.advance(now, toggles);
        for layer in std::mem::take(&mut self.hovered) {
            self.leave(layer);
        }
    }

    /// Click at `point`; evaluated immediately
    pub fn click(&mut self, now: Duration, point: ScreenPoint, toggles: &impl Toggles) {
        self.advance(now, toggles);
        if let Err(e) = self.try_click(point, toggles) {
            warn!("click handling failed: {}", e);
            self.emit(EventKind::Failed {
                message: e.to_string(),
            });
        }
    }

    /// The camera moved; keep the glyph on its feature
    pub fn map_moved(&mut self, now: Duration, toggles: &impl Toggles) {
        self.advance(now, toggles);
        if let Some(p) = self.glyph.reposition(&self.map) {
            self.emit(EventKind::GlyphMoved { x: p.x, y: p.y });
        }
    }

    /// Master sound switch changed
    pub fn sound_toggled(&mut self, now: Duration, on: bool, toggles: &impl Toggles) {
        self.advance(now, toggles);
        info!("sound {}", if on { "enabled" } else { "disabled" });
        self.audio.set_active(on);
        if !on {
            self.hide_indicator();
            self.hide_glyph();
        }
    }

    /// Visual switch changed
    pub fn visual_toggled(&mut self, now: Duration, on: bool, toggles: &impl Toggles) {
        self.advance(now, toggles);
        info!("visual symbols {}", if on { "enabled" } else { "disabled" });
        if !on {
            self.hide_glyph();
        }
    }

    /// A visual metric changed; redraw the glyph on screen
    pub fn visual_metrics_changed(&mut self, now: Duration, toggles: &impl Toggles) {
        self.advance(now, toggles);
        let Some(source) = &self.glyph_source else {
            return;
        };
        let glyph = block_glyph(&source.properties, toggles.visual_metrics());
        let svg = to_svg(&glyph);
        if self.glyph.redraw(glyph) {
            if let Some(p) = self.glyph.position() {
                self.emit(EventKind::GlyphShown { svg, x: p.x, y: p.y });
            }
        }
    }

    /// Play the sound a legend entry stands for
    pub fn legend_click(
        &mut self,
        now: Duration,
        active: LayerKind,
        item: &LegendItem,
        toggles: &impl Toggles,
    ) {
        self.advance(now, toggles);
        self.demo_serial += 1;
        let Some(demo) = legend_demo(active, item, self.demo_serial) else {
            debug!(layer = %active, "legend entry does not belong to the active layer");
            return;
        };
        if !toggles.is_enabled(Toggle::Sound) {
            return;
        }

        if demo.is_cluster() {
            let cluster = BlockProperties::from_attributes(&demo.feature.properties);
            self.audio.play_cluster(cluster.cluster_id());
            self.record(demo.feature.layer, Channel::Cluster, None);
        } else {
            if let Some(channel) = demo.rearm {
                self.state.reset(channel);
            }
            self.sonify(&demo.feature, toggles);
        }
        self.show_indicator(demo.feature.layer);
    }

    /// Switch a task-block set on or off and push it to the map
    pub fn set_task_blocks(
        &mut self,
        now: Duration,
        set: TaskBlockSet,
        on: bool,
        toggles: &impl Toggles,
    ) {
        self.advance(now, toggles);
        self.task_blocks.set(set, on);
        info!(set = ?set, on, "task blocks changed");
        self.apply_task_blocks(0);
    }

    /// Push the task-block filters again, e.g. after city blocks were shown
    pub fn refresh_task_blocks(&mut self, now: Duration, toggles: &impl Toggles) {
        self.advance(now, toggles);
        self.apply_task_blocks(0);
    }

    fn set_clock(&mut self, at: Duration) {
        if at > self.now {
            self.now = at;
        }
        self.audio.backend_mut().sync(self.now);
    }

    fn emit(&mut self, kind: EventKind) {
        self.events.push(SessionEvent {
            at_ms: self.now.as_millis() as u64,
            kind,
        });
    }

    fn run(&mut self, task: Task, toggles: &impl Toggles) {
        match task {
            Task::Trailing(point) => {
                self.throttle.fire_trailing(self.now);
                self.schedule_settle(point);
            }
            Task::Evaluate(point) => {
                self.settle = None;
                self.evaluate(point, toggles);
            }
            Task::ExitRecheck(layer) => self.recheck_exit(layer),
            Task::GlyphFade => {
                self.glyph_timer = None;
                if self.glyph.begin_fade() {
                    self.emit(EventKind::GlyphFading);
                    let at = self.now + self.timing.glyph_fade();
                    self.glyph_timer = Some(self.tasks.schedule(at, Task::GlyphHide));
                }
            }
            Task::GlyphHide => {
                self.glyph_timer = None;
                self.hide_glyph();
            }
            Task::IndicatorOff => {
                self.indicator_timer = None;
                self.hide_indicator();
            }
            Task::TaskBlocksRetry(attempt) => {
                self.task_retry = None;
                self.apply_task_blocks(attempt);
            }
        }
    }

    fn schedule_settle(&mut self, point: ScreenPoint) {
        if let Some(id) = self.settle.take() {
            self.tasks.cancel(id);
        }
        let at = self.now + self.timing.settle_delay();
        self.settle = Some(self.tasks.schedule(at, Task::Evaluate(point)));
    }

    /// Turn layer changes under the pointer into leave events
    fn track_layers(&mut self, point: ScreenPoint) {
        let Ok(features) = self.map.features_at(point) else {
            return;
        };
        let mut under: Vec<LayerKind> = Vec::new();
        for f in &features {
            if !under.contains(&f.layer) {
                under.push(f.layer);
            }
        }
        let left: Vec<LayerKind> = self
            .hovered
            .iter()
            .filter(|l| !under.contains(l))
            .copied()
            .collect();
        self.hovered = under;
        for layer in left {
            self.leave(layer);
        }
    }

    fn leave(&mut self, layer: LayerKind) {
        match Channel::for_layer(layer) {
            Channel::Cluster | Channel::Block => {
                let at = self.now + self.timing.exit_recheck();
                self.tasks.schedule(at, Task::ExitRecheck(layer));
            }
            channel => self.reset_channel(channel),
        }
    }

    /// Re-arm once the layer has nothing rendered any more
    fn recheck_exit(&mut self, layer: LayerKind) {
        match self.map.rendered_features(layer) {
            Ok(features) if features.is_empty() => {
                self.reset_channel(Channel::Cluster);
                if layer == LayerKind::CityBlocks {
                    self.reset_channel(Channel::Block);
                }
            }
            Ok(_) => {}
            Err(e) => warn!(layer = %layer, "exit re-check failed: {}", e),
        }
    }

    fn reset_channel(&mut self, channel: Channel) {
        self.state.reset(channel);
        debug!(channel = ?channel, "channel re-armed");
        self.emit(EventKind::ChannelReset { channel });
    }

    fn evaluate(&mut self, point: ScreenPoint, toggles: &impl Toggles) {
        self.state.note_evaluation();
        match self.try_evaluate(point, toggles) {
            Ok(layer) => self.emit(EventKind::Evaluated { layer }),
            Err(e) => {
                warn!("hover evaluation failed: {}", e);
                self.emit(EventKind::Failed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn try_evaluate(
        &mut self,
        point: ScreenPoint,
        toggles: &impl Toggles,
    ) -> Result<Option<LayerKind>, MapError> {
        if !self.map.is_style_loaded() {
            debug!("map style not loaded, skipping hover");
            return Ok(None);
        }

        self.check_boundary(point, toggles)?;

        let features = self.map.features_at(point)?;
        let Some(feature) = self.select(features) else {
            self.clear_highlight();
            return Ok(None);
        };

        if toggles.sound_on() {
            self.hover_sound(&feature, toggles);
        }

        if toggles.is_enabled(Toggle::Visual) && feature.layer == LayerKind::CityBlocks {
            self.highlight(&feature, toggles.is_enabled(Toggle::IdentifyClusters));
        } else {
            self.clear_highlight();
        }

        self.set_legend(legend_target(feature.layer, &feature.properties));
        Ok(Some(feature.layer))
    }

    /// First candidate in priority order among visible layers
    fn select(&self, mut features: Vec<Feature>) -> Option<Feature> {
        let index = LayerKind::PRIORITY
            .iter()
            .filter(|layer| self.map.is_layer_visible(**layer))
            .find_map(|layer| features.iter().position(|f| f.layer == *layer))?;
        Some(features.swap_remove(index))
    }

    fn check_boundary(&mut self, point: ScreenPoint, toggles: &impl Toggles) -> Result<(), MapError> {
        let rect = ScreenRect::around(point, BOUNDARY_PROBE_PX);
        let over = !self
            .map
            .features_in(rect, &[LayerKind::Boundary])?
            .is_empty();
        if over && !self.state.in_boundary() && toggles.sound_on() {
            self.state.enter_boundary();
            self.audio
                .dispatch(LayerKind::Boundary, &FeatureAttributes::new(), &toggles.audio_metrics());
            self.record(LayerKind::Boundary, Channel::Boundary, None);
            self.show_indicator(LayerKind::Boundary);
        }
        Ok(())
    }

    fn hover_sound(&mut self, feature: &Feature, toggles: &impl Toggles) {
        let identify = toggles.is_enabled(Toggle::IdentifyClusters);
        match feature.layer {
            LayerKind::Clusters => self.hover_cluster(feature),
            LayerKind::CityBlocks if identify => self.hover_cluster(feature),
            LayerKind::CityBlocks => {
                let key = feature.block_id();
                if self.audio.settings().hover_bip
                    && self.state.should_fire(Channel::Block, Some(&key))
                {
                    self.audio.play_bip();
                    self.record(feature.layer, Channel::Block, Some(key));
                }
            }
            LayerKind::Boundary => {}
            layer => {
                if toggles.layer_audio_enabled(layer) {
                    self.sonify(feature, toggles);
                }
            }
        }
    }

    /// Cluster triad, once per block until the pointer leaves the layer
    fn hover_cluster(&mut self, feature: &Feature) {
        let block = BlockProperties::from_attributes(&feature.properties);
        let Some(cluster) = block.cluster.as_deref() else {
            return;
        };
        let key = feature.identity_key();
        if self.state.should_fire(Channel::Cluster, key.as_deref()) {
            self.audio.play_cluster(cluster);
            self.record(feature.layer, Channel::Cluster, key);
        }
    }

    /// Play a feature's layer sound, subject to its channel's memory
    fn sonify(&mut self, feature: &Feature, toggles: &impl Toggles) -> bool {
        let channel = Channel::for_layer(feature.layer);
        let key = match channel {
            Channel::Building | Channel::LandUse | Channel::Street => feature.identity_key(),
            _ => None,
        };
        let fresh = match channel {
            Channel::Boundary => self.state.enter_boundary(),
            _ => self.state.should_fire(channel, key.as_deref()),
        };
        if !fresh {
            debug!(layer = %feature.layer, "already sounded");
            return false;
        }
        self.audio
            .dispatch(feature.layer, &feature.properties, &toggles.audio_metrics());
        self.record(feature.layer, channel, key);
        true
    }

    fn record(&mut self, layer: LayerKind, channel: Channel, key: Option<String>) {
        self.state.record(channel, key.clone(), self.now);
        self.emit(EventKind::Sounded {
            layer,
            channel,
            key,
        });
    }

    fn try_click(&mut self, point: ScreenPoint, toggles: &impl Toggles) -> Result<(), MapError> {
        if !self.map.is_style_loaded() {
            return Ok(());
        }
        let features = self.map.features_at(point)?;
        if features.is_empty() {
            self.hide_glyph();
            return Ok(());
        }
        let Some(feature) = self.select(features) else {
            return Ok(());
        };
        let layer = feature.layer;

        if toggles.sound_on() {
            let identify = toggles.is_enabled(Toggle::IdentifyClusters);
            let cluster_layer =
                layer == LayerKind::Clusters || (layer == LayerKind::CityBlocks && identify);
            let cluster = feature.properties.text("Cluster");
            match cluster {
                Some(id) if cluster_layer => {
                    self.audio.play_cluster(&id);
                    self.record(layer, Channel::Cluster, None);
                }
                _ => {
                    if toggles.layer_audio_enabled(layer) {
                        self.sonify(&feature, toggles);
                    }
                }
            }
            self.show_indicator(layer);
        }

        if toggles.is_enabled(Toggle::Visual) && layer == LayerKind::CityBlocks {
            self.show_glyph(feature.clone(), point, toggles);
        }

        self.set_legend(legend_target(layer, &feature.properties));
        Ok(())
    }

    fn highlight(&mut self, feature: &Feature, identify_clusters: bool) {
        let Some(highlight) = block_highlight(feature, identify_clusters) else {
            self.clear_highlight();
            return;
        };
        self.map.set_highlight(Some(highlight));
        let block = feature.block_id();
        if self.highlighted.as_deref() != Some(block.as_str()) {
            self.highlighted = Some(block.clone());
            self.emit(EventKind::Highlighted { block: Some(block) });
        }
    }

    fn clear_highlight(&mut self) {
        if self.highlighted.take().is_some() {
            self.map.set_highlight(None);
            self.emit(EventKind::Highlighted { block: None });
        }
    }

    fn set_legend(&mut self, item: Option<LegendItem>) {
        if self.legend != item {
            self.legend = item.clone();
            self.emit(EventKind::LegendHighlighted { item });
        }
    }

    fn show_indicator(&mut self, layer: LayerKind) {
        if let Some(id) = self.indicator_timer.take() {
            self.tasks.cancel(id);
        }
        let label = layer.description();
        self.indicator = Some(label);
        self.emit(EventKind::IndicatorShown { label });
        let at = self.now + self.timing.indicator();
        self.indicator_timer = Some(self.tasks.schedule(at, Task::IndicatorOff));
    }

    fn hide_indicator(&mut self) {
        if let Some(id) = self.indicator_timer.take() {
            self.tasks.cancel(id);
        }
        if self.indicator.take().is_some() {
            self.emit(EventKind::IndicatorHidden);
        }
    }

    fn show_glyph(&mut self, feature: Feature, pointer: ScreenPoint, toggles: &impl Toggles) {
        if let Some(id) = self.glyph_timer.take() {
            self.tasks.cancel(id);
        }
        let glyph = block_glyph(&feature.properties, toggles.visual_metrics());
        let svg = to_svg(&glyph);
        self.glyph.show(glyph, feature.centroid(), pointer, &self.map);
        let position = self.glyph.position().unwrap_or(pointer);
        self.glyph_source = Some(feature);
        self.emit(EventKind::GlyphShown {
            svg,
            x: position.x,
            y: position.y,
        });
        let at = self.now + self.timing.glyph_visible();
        self.glyph_timer = Some(self.tasks.schedule(at, Task::GlyphFade));
    }

    fn hide_glyph(&mut self) {
        if let Some(id) = self.glyph_timer.take() {
            self.tasks.cancel(id);
        }
        self.glyph_source = None;
        if self.glyph.is_shown() {
            self.glyph.hide();
            self.emit(EventKind::GlyphHidden);
        }
    }

    fn apply_task_blocks(&mut self, attempt: u32) {
        if let Some(id) = self.task_retry.take() {
            self.tasks.cancel(id);
        }
        match self.task_blocks.apply(&mut self.map) {
            Ok(TaskBlockUpdate::Applied) => self.emit(EventKind::TaskBlocksApplied),
            Ok(TaskBlockUpdate::Skipped) => {}
            Ok(TaskBlockUpdate::NotReady) if attempt < self.timing.max_retries => {
                debug!(attempt, "map style not loaded, retrying task blocks");
                let next = attempt + 1;
                let at = self.now + self.timing.retry_delay();
                self.task_retry = Some(self.tasks.schedule(at, Task::TaskBlocksRetry(next)));
                self.emit(EventKind::TaskBlocksDeferred { attempt: next });
            }
            Ok(TaskBlockUpdate::NotReady) => {
                warn!(attempts = attempt, "map style never loaded, dropping task blocks");
                self.emit(EventKind::Failed {
                    message: "task blocks dropped: map style not loaded".to_string(),
                });
            }
            Err(e) => {
                warn!("task block update failed: {}", e);
                self.emit(EventKind::Failed {
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CueRecorder;
    use crate::feature::{Geometry, StaticMap};
    use crate::gate::ToggleSnapshot;
    use crate::glyph::OverlayState;
    use crate::mapping::Instrument;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn square(x: f64, y: f64, size: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            [x, y],
            [x + size, y],
            [x + size, y + size],
            [x, y + size],
            [x, y],
        ]])
    }

    fn block(code: &str, cluster: i64, x: f64) -> Feature {
        Feature::new(
            LayerKind::CityBlocks,
            FeatureAttributes::new()
                .with("code", code)
                .with("Cluster", cluster)
                .with("w_height_mean", 20.0)
                .with("w_age_mean", 80.0)
                .with("prop_residential", 0.7)
                .with("prop_retail", 0.3)
                .with("t22", 0.6),
        )
        .with_geometry(square(x, -50.0, 100.0))
    }

    /// Two blocks side by side: TB19 around screen (400, 300), HB14 around (550, 300)
    fn blocks_map() -> StaticMap {
        StaticMap::new().with_layer(
            LayerKind::CityBlocks,
            true,
            vec![block("TB19", 2, -50.0), block("HB14", 4, 100.0)],
        )
    }

    fn session(map: StaticMap) -> Session<StaticMap, CueRecorder> {
        Session::new(map, CueRecorder::new(), &MapsonicConfig::default())
    }

    fn count(s: &Session<StaticMap, CueRecorder>, instrument: Instrument) -> usize {
        s.audio()
            .backend()
            .notes()
            .iter()
            .filter(|n| n.instrument == instrument)
            .count()
    }

    const TB19: ScreenPoint = ScreenPoint { x: 400.0, y: 300.0 };
    const HB14: ScreenPoint = ScreenPoint { x: 550.0, y: 300.0 };

    #[test]
    fn test_burst_collapses_to_one_evaluation() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(blocks_map());

        s.pointer_move(ms(0), TB19, &toggles);
        s.advance(ms(60), &toggles);
        assert_eq!(s.evaluations(), 1);

        for t in (100..200).step_by(10) {
            s.pointer_move(ms(t), TB19, &toggles);
        }
        s.advance(ms(240), &toggles);
        assert_eq!(s.evaluations(), 1);
        s.advance(ms(1000), &toggles);
        assert_eq!(s.evaluations(), 2);
    }

    #[test]
    fn test_only_last_position_is_evaluated() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(blocks_map());
        s.pointer_move(ms(0), ScreenPoint::new(10.0, 10.0), &toggles);
        s.pointer_move(ms(100), TB19, &toggles);
        s.pointer_move(ms(150), HB14, &toggles);
        s.advance(ms(1000), &toggles);

        let evaluated: Vec<Option<LayerKind>> = s
            .drain_events()
            .into_iter()
            .filter_map(|e| match e.kind {
                EventKind::Evaluated { layer } => Some(layer),
                _ => None,
            })
            .collect();
        assert_eq!(evaluated, vec![None, Some(LayerKind::CityBlocks)]);
        assert_eq!(s.state().last_key(Channel::Block), Some("city-blocks-HB14"));
    }

    #[test]
    fn test_hover_bip_dedup() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(blocks_map());

        s.pointer_move(ms(0), TB19, &toggles);
        s.pointer_move(ms(500), TB19, &toggles);
        s.advance(ms(1000), &toggles);
        assert_eq!(s.evaluations(), 2);
        assert_eq!(count(&s, Instrument::Bip), 1);

        s.pointer_move(ms(1000), HB14, &toggles);
        s.advance(ms(1100), &toggles);
        assert_eq!(count(&s, Instrument::Bip), 2);

        s.pointer_move(ms(1500), TB19, &toggles);
        s.advance(ms(1600), &toggles);
        assert_eq!(count(&s, Instrument::Bip), 3);
    }

    #[test]
    fn test_identify_mode_plays_cluster_and_fills_highlight() {
        let toggles = ToggleSnapshot::default().with(Toggle::IdentifyClusters, true);
        let mut s = session(blocks_map());

        s.pointer_move(ms(0), TB19, &toggles);
        s.advance(ms(100), &toggles);

        let notes = s.audio().backend().notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notes, vec!["E4", "G4", "B4"]);
        assert_eq!(count(&s, Instrument::Bip), 0);

        let highlight = s.map().highlight().unwrap();
        assert_eq!(
            highlight.fill.as_deref(),
            Some(crate::mapping::cluster_color("2"))
        );
        assert_eq!(s.legend(), Some(&LegendItem::Cluster { id: "2".into() }));

        // lingering does not replay
        s.pointer_move(ms(500), TB19, &toggles);
        s.advance(ms(600), &toggles);
        assert_eq!(s.audio().backend().notes().len(), 1);
    }

    #[test]
    fn test_sound_off_suppresses_but_still_highlights() {
        let toggles = ToggleSnapshot::default().with(Toggle::AudioFeedback, false);
        let mut s = session(blocks_map());
        s.pointer_move(ms(0), TB19, &toggles);
        s.advance(ms(100), &toggles);
        assert!(s.audio().backend().notes().is_empty());
        assert!(s.map().highlight().is_some());

        let hidden = toggles.with(Toggle::Visual, false);
        s.pointer_move(ms(500), HB14, &hidden);
        s.advance(ms(600), &hidden);
        assert!(s.map().highlight().is_none());
    }

    #[test]
    fn test_priority_and_visibility() {
        let building = Feature::new(
            LayerKind::BuildingHeight,
            FeatureAttributes::new().with("height", 30.0).with("id", "b1"),
        )
        .with_geometry(square(-10.0, -10.0, 20.0));
        // building layer drawn on top, but blocks rank first
        let map = blocks_map().with_layer(LayerKind::BuildingHeight, true, vec![building]);
        let toggles = ToggleSnapshot::default();
        let mut s = session(map);

        s.pointer_move(ms(0), TB19, &toggles);
        s.advance(ms(100), &toggles);
        assert_eq!(s.state().last_key(Channel::Block), Some("city-blocks-TB19"));
        assert_eq!(s.state().last_key(Channel::Building), None);

        s.map_mut().set_layer_visible(LayerKind::CityBlocks, false);
        s.pointer_move(ms(500), TB19, &toggles);
        s.advance(ms(600), &toggles);
        assert_eq!(s.state().last_key(Channel::Building), Some("b1"));
        assert_eq!(count(&s, Instrument::Fm), 1);
    }

    #[test]
    fn test_category_toggle_blocks_building_sound() {
        let building = Feature::new(
            LayerKind::BuildingHeight,
            FeatureAttributes::new().with("height", 30.0).with("id", "b1"),
        )
        .with_geometry(square(-10.0, -10.0, 20.0));
        let map = StaticMap::new().with_layer(LayerKind::BuildingHeight, true, vec![building]);
        let toggles = ToggleSnapshot::default().with(Toggle::AudioHeight, false);
        let mut s = session(map);

        s.pointer_move(ms(0), TB19, &toggles);
        s.advance(ms(100), &toggles);
        assert!(s.audio().backend().notes().is_empty());
        assert_eq!(s.evaluations(), 1);
    }

    #[test]
    fn test_boundary_fires_once_per_overlap() {
        let boundary = Feature::new(LayerKind::Boundary, FeatureAttributes::new())
            .with_geometry(square(-300.0, -250.0, 600.0));
        let map = StaticMap::new().with_layer(LayerKind::Boundary, true, vec![boundary]);
        let toggles = ToggleSnapshot::default();
        let mut s = session(map);

        s.pointer_move(ms(0), TB19, &toggles);
        s.pointer_move(ms(300), HB14, &toggles);
        s.advance(ms(600), &toggles);
        assert_eq!(count(&s, Instrument::Melodic), 1);
        assert_eq!(s.indicator(), Some("City Boundary"));

        // leaving the boundary re-arms it
        s.pointer_move(ms(700), ScreenPoint::new(5.0, 5.0), &toggles);
        assert!(!s.state().in_boundary());
        s.pointer_move(ms(1000), TB19, &toggles);
        s.advance(ms(1100), &toggles);
        assert_eq!(count(&s, Instrument::Melodic), 2);
    }

    #[test]
    fn test_click_plays_and_shows_glyph() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(blocks_map());

        s.click(ms(10), TB19, &toggles);
        // immediate, no throttle
        assert!(!s.audio().backend().notes().is_empty());
        assert_eq!(s.evaluations(), 0);
        assert_eq!(s.indicator(), Some("City Blocks"));
        assert_eq!(s.glyph().state(), OverlayState::Visible);
        // centroid of the ring, closing vertex included
        assert_eq!(s.glyph().position(), Some(ScreenPoint::new(390.0, 310.0)));

        s.advance(ms(1010), &toggles);
        assert_eq!(s.indicator(), None);

        s.advance(ms(3510), &toggles);
        assert_eq!(s.glyph().state(), OverlayState::Fading);
        s.advance(ms(4310), &toggles);
        assert_eq!(s.glyph().state(), OverlayState::Hidden);
    }

    #[test]
    fn test_new_glyph_restarts_fade() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(blocks_map());
        s.click(ms(0), TB19, &toggles);
        s.click(ms(3000), HB14, &toggles);
        s.advance(ms(3600), &toggles);
        assert_eq!(s.glyph().state(), OverlayState::Visible);
        s.advance(ms(6500), &toggles);
        assert_eq!(s.glyph().state(), OverlayState::Fading);
    }

    #[test]
    fn test_click_on_empty_map_hides_glyph() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(blocks_map());
        s.click(ms(0), TB19, &toggles);
        s.click(ms(100), ScreenPoint::new(5.0, 5.0), &toggles);
        assert!(!s.glyph().is_shown());
    }

    #[test]
    fn test_glyph_tracks_pan_and_metric_changes() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(blocks_map());
        s.click(ms(0), TB19, &toggles);

        s.map_mut().pan(30.0, 0.0);
        s.map_moved(ms(100), &toggles);
        assert_eq!(s.glyph().position(), Some(ScreenPoint::new(420.0, 310.0)));

        let before = s.glyph().glyph().cloned();
        let street_only = ToggleSnapshot {
            visual_metrics: crate::mapping::MetricSet {
                street: true,
                ..crate::mapping::MetricSet::none()
            },
            ..toggles
        };
        s.visual_metrics_changed(ms(200), &street_only);
        assert_ne!(s.glyph().glyph().cloned(), before);
        assert_eq!(s.glyph().state(), OverlayState::Visible);
    }

    #[test]
    fn test_sound_toggle_off_stops_everything() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(blocks_map());
        s.click(ms(0), TB19, &toggles);

        let off = toggles.with(Toggle::Sound, false);
        s.sound_toggled(ms(100), false, &off);
        assert_eq!(s.audio().backend().stop_count(), 1);
        assert_eq!(s.indicator(), None);
        assert!(!s.glyph().is_shown());

        let before = s.audio().backend().notes().len();
        s.click(ms(200), HB14, &off);
        assert_eq!(s.audio().backend().notes().len(), before);
    }

    #[test]
    fn test_style_not_loaded_is_quiet() {
        let toggles = ToggleSnapshot::default();
        let mut map = blocks_map();
        map.set_style_loaded(false);
        let mut s = session(map);

        s.pointer_move(ms(0), TB19, &toggles);
        s.click(ms(10), TB19, &toggles);
        s.advance(ms(500), &toggles);
        assert_eq!(s.evaluations(), 1);
        assert!(s.audio().backend().notes().is_empty());
        assert!(s
            .drain_events()
            .iter()
            .all(|e| !matches!(e.kind, EventKind::Failed { .. })));
    }

    #[test]
    fn test_cluster_exit_recheck() {
        let cluster = Feature::new(
            LayerKind::Clusters,
            FeatureAttributes::new().with("code", "C1").with("Cluster", 1i64),
        )
        .with_geometry(square(-50.0, -50.0, 100.0));
        let map = StaticMap::new().with_layer(LayerKind::Clusters, true, vec![cluster]);
        let toggles = ToggleSnapshot::default();
        let mut s = session(map);

        s.pointer_move(ms(0), TB19, &toggles);
        s.advance(ms(100), &toggles);
        assert_eq!(s.state().last_key(Channel::Cluster), Some("C1"));

        // the cluster is still rendered elsewhere in view: memo stays
        s.pointer_move(ms(300), ScreenPoint::new(5.0, 5.0), &toggles);
        s.advance(ms(400), &toggles);
        assert_eq!(s.state().last_key(Channel::Cluster), Some("C1"));

        // pan it out of view, then leave again
        s.map_mut().pan(2000.0, 0.0);
        s.pointer_leave(ms(500), LayerKind::Clusters, &toggles);
        s.advance(ms(549), &toggles);
        assert_eq!(s.state().last_key(Channel::Cluster), Some("C1"));
        s.advance(ms(550), &toggles);
        assert_eq!(s.state().last_key(Channel::Cluster), None);
    }

    #[test]
    fn test_legend_click_rearms_channel() {
        let toggles = ToggleSnapshot::default();
        let mut s = session(StaticMap::new());
        let item = LegendItem::Range { min: 6.0, max: 15.0 };

        s.legend_click(ms(0), LayerKind::BuildingHeight, &item, &toggles);
        s.legend_click(ms(10), LayerKind::BuildingHeight, &item, &toggles);
        assert_eq!(count(&s, Instrument::Fm), 2);
        assert_eq!(s.indicator(), Some("Building Height"));

        s.legend_click(
            ms(20),
            LayerKind::Clusters,
            &LegendItem::Cluster { id: "5".into() },
            &toggles,
        );
        let notes = s.audio().backend().notes();
        assert_eq!(notes.last().map(|n| n.notes.clone()), Some(vec![
            "A4".to_string(),
            "C5".to_string(),
            "E5".to_string()
        ]));
    }

    #[test]
    fn test_task_blocks_retry_until_loaded() {
        let toggles = ToggleSnapshot::default();
        let mut map = blocks_map();
        map.set_style_loaded(false);
        let mut s = session(map);

        s.set_task_blocks(ms(0), TaskBlockSet::Visual, true, &toggles);
        assert!(s.map().filter("visual-task-blocks-layer").is_none());

        s.advance(ms(450), &toggles);
        s.map_mut().set_style_loaded(true);
        s.advance(ms(600), &toggles);
        assert_eq!(
            s.map().filter("visual-task-blocks-layer").unwrap().len(),
            3
        );
        assert!(s.next_due().is_none());
    }

    #[test]
    fn test_task_blocks_retry_is_bounded() {
        let toggles = ToggleSnapshot::default();
        let mut map = blocks_map();
        map.set_style_loaded(false);
        let mut config = MapsonicConfig::default();
        config.timing.max_retries = 2;
        let mut s = Session::new(map, CueRecorder::new(), &config);

        s.set_task_blocks(ms(0), TaskBlockSet::Audio, true, &toggles);
        s.advance(ms(10_000), &toggles);
        assert!(s.next_due().is_none());
        let failed = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e.kind, EventKind::Failed { .. }))
            .count();
        assert_eq!(failed, 1);
    }
}
