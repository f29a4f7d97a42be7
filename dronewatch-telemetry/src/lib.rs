//! # Dronewatch Telemetry and Monitoring
//!
//! Crate for logging and metrics shared by the backend and the dashboard.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
