//! # Dronewatch Detection Engine
//!
//! Owns the in-memory window of detection events and classifies repeat
//! offenders.
//!
//! ### Components:
//! - `registry/`: event window, per-MAC counts and the blocked set
//! - `alert/`: single visible block alert with cancellable auto-expiry
//!
//! The registry performs no I/O and never fails. It is not internally
//! synchronised: hosts with several producers must serialise access to it.

pub mod alert;
pub mod registry;

pub use alert::{AlertBoard, BlockAlert, DEFAULT_ALERT_TTL};
pub use registry::{BlockStatus, DetectionRegistry, IngestOutcome};
