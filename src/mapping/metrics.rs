//! Which attribute metrics take part in a rendering

use serde::{Deserialize, Serialize};

/// Enabled state of the four block metrics
///
/// The same shape is used for the audio and the visual side; the two are
/// toggled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSet {
    #[serde(default = "default_enabled")]
    pub height: bool,
    #[serde(default = "default_enabled")]
    pub age: bool,
    #[serde(default = "default_enabled")]
    pub land_use: bool,
    #[serde(default = "default_enabled")]
    pub street: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::all()
    }
}

impl MetricSet {
    pub fn all() -> Self {
        Self {
            height: true,
            age: true,
            land_use: true,
            street: true,
        }
    }

    pub fn none() -> Self {
        Self {
            height: false,
            age: false,
            land_use: false,
            street: false,
        }
    }

    /// Street network is the only enabled metric
    pub fn only_street(&self) -> bool {
        self.street && !self.height && !self.age && !self.land_use
    }
}
