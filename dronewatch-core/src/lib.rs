//! # dronewatch-core
//!
//! Shared data model for the drone detection dashboard and the mock backend.
//!
//! ### Key Submodules:
//! - `mac`: canonical `XX:XX:XX:XX:XX:XX` MAC addresses
//! - `detection`: detection events and the producer payload with its validation
//! - `manufacturer`: OUI to manufacturer resolution
//! - `stats`: dashboard counters derived from a set of detections

pub mod detection;
pub mod error;
pub mod mac;
pub mod manufacturer;
pub mod stats;

pub use detection::{CreateDetection, DetectionEvent};
pub use error::ModelError;
pub use mac::MacAddress;
pub use manufacturer::{Manufacturer, ManufacturerDirectory};
pub use stats::{DashboardStats, ManufacturerCount};
