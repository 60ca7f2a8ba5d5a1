//! Per-session trigger memory

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::feature::LayerKind;

/// Logical de-duplication channel
///
/// Each channel remembers the identity of the last feature it sounded,
/// independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Building,
    LandUse,
    Street,
    Cluster,
    /// Hover bip over city blocks
    Block,
    Boundary,
}

impl Channel {
    pub fn for_layer(layer: LayerKind) -> Channel {
        match layer {
            LayerKind::BuildingHeight
            | LayerKind::BuildingHeightBlock
            | LayerKind::BuildingAge
            | LayerKind::BuildingAgeBlock => Channel::Building,
            LayerKind::LandUse | LayerKind::LandUseBlock => Channel::LandUse,
            LayerKind::Street | LayerKind::StreetBlock => Channel::Street,
            LayerKind::Clusters | LayerKind::ClustersLabeled => Channel::Cluster,
            LayerKind::CityBlocks => Channel::Block,
            LayerKind::Boundary => Channel::Boundary,
        }
    }
}

/// What the gate remembers between evaluations
#[derive(Debug, Default)]
pub struct TriggerState {
    last_keys: HashMap<Channel, String>,
    last_trigger: Option<Duration>,
    in_boundary: bool,
    evaluations: u64,
    triggers: u64,
}

impl TriggerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A feature with `key` may sound on `channel`
    ///
    /// Features without an identity always qualify.
    pub fn should_fire(&self, channel: Channel, key: Option<&str>) -> bool {
        match key {
            Some(key) => self.last_keys.get(&channel).map(String::as_str) != Some(key),
            None => true,
        }
    }

    /// Remember that `channel` sounded `key` at `now`
    pub fn record(&mut self, channel: Channel, key: Option<String>, now: Duration) {
        if let Some(key) = key {
            self.last_keys.insert(channel, key);
        }
        self.last_trigger = Some(now);
        self.triggers += 1;
    }

    pub fn last_key(&self, channel: Channel) -> Option<&str> {
        self.last_keys.get(&channel).map(String::as_str)
    }

    /// Re-arm a channel
    pub fn reset(&mut self, channel: Channel) {
        self.last_keys.remove(&channel);
        if channel == Channel::Boundary {
            self.in_boundary = false;
        }
    }

    /// Pointer is over the boundary; `true` only on entry
    pub fn enter_boundary(&mut self) -> bool {
        !std::mem::replace(&mut self.in_boundary, true)
    }

    pub fn in_boundary(&self) -> bool {
        self.in_boundary
    }

    pub fn note_evaluation(&mut self) {
        self.evaluations += 1;
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn triggers(&self) -> u64 {
        self.triggers
    }

    pub fn last_trigger(&self) -> Option<Duration> {
        self.last_trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_per_channel() {
        let mut state = TriggerState::new();
        let t = Duration::from_millis(10);

        assert!(state.should_fire(Channel::Building, Some("b1")));
        state.record(Channel::Building, Some("b1".into()), t);
        assert!(!state.should_fire(Channel::Building, Some("b1")));
        assert!(state.should_fire(Channel::Building, Some("b2")));

        // channels are independent
        assert!(state.should_fire(Channel::Street, Some("b1")));

        // anonymous features always qualify
        assert!(state.should_fire(Channel::Building, None));
        assert_eq!(state.triggers(), 1);
        assert_eq!(state.last_trigger(), Some(t));
    }

    #[test]
    fn test_reset_rearms() {
        let mut state = TriggerState::new();
        state.record(Channel::LandUse, Some("7".into()), Duration::ZERO);
        state.reset(Channel::LandUse);
        assert!(state.should_fire(Channel::LandUse, Some("7")));
        assert_eq!(state.last_key(Channel::LandUse), None);
    }

    #[test]
    fn test_boundary_is_sticky() {
        let mut state = TriggerState::new();
        assert!(state.enter_boundary());
        assert!(!state.enter_boundary());
        state.reset(Channel::Boundary);
        assert!(state.enter_boundary());
    }

    #[test]
    fn test_channel_for_layer() {
        assert_eq!(Channel::for_layer(LayerKind::BuildingAgeBlock), Channel::Building);
        assert_eq!(Channel::for_layer(LayerKind::StreetBlock), Channel::Street);
        assert_eq!(Channel::for_layer(LayerKind::CityBlocks), Channel::Block);
    }
}
