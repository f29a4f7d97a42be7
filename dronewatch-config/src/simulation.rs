//! Simulated detection feed configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SimulationConfig {
    /// Time between generated detections (milliseconds).
    #[validate(range(min = 100, max = 3600000))]
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Fixed seed for reproducible feeds; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_interval_ms() -> u64 {
    5000
}

impl SimulationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            seed: None,
        }
    }
}
