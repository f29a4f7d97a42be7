//! Random producer payloads.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dronewatch_core::CreateDetection;

/// Manufacturer prefixes the generator draws from. Only `60:60:1F` is in the
/// default OUI table.
pub const KNOWN_OUIS: [&str; 4] = ["60:60:1F", "AA:BB:CC", "DD:EE:FF", "00:11:22"];

pub const SENSOR_LOCATIONS: [&str; 6] = [
    "Building A - Floor 3",
    "Building B - Rooftop",
    "Building A - Parking Lot",
    "Building C - Main Entrance",
    "Warehouse 1 - Storage Area",
    "Hangar 2 - Perimeter",
];

/// Weakest signal produced, inclusive.
pub const RSSI_MIN: i32 = -95;
/// Strongest signal produced, exclusive.
pub const RSSI_MAX: i32 = -30;

#[derive(Debug, Clone)]
pub struct DetectionGenerator {
    rng: StdRng,
}

impl DetectionGenerator {
    /// Same seed, same sequence of payloads. `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn next_payload(&mut self, timestamp: DateTime<Utc>) -> CreateDetection {
        CreateDetection::new(
            self.next_mac(),
            self.next_rssi(),
            self.pick(&SENSOR_LOCATIONS),
            timestamp,
        )
    }

    pub fn next_mac(&mut self) -> String {
        let oui = self.pick(&KNOWN_OUIS);
        let [a, b, c]: [u8; 3] = self.rng.random();
        format!("{}:{:02X}:{:02X}:{:02X}", oui, a, b, c)
    }

    pub fn next_rssi(&mut self) -> i32 {
        self.rng.random_range(RSSI_MIN..RSSI_MAX)
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items[self.rng.random_range(0..items.len())]
    }
}

impl Default for DetectionGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}
