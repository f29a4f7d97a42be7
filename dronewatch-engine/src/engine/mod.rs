//! Dashboard runtime components, wired together by `crate::runtime`.

pub mod backend;
pub mod command;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod manual;

pub use backend::{DataOrigin, FallbackBackend, Sourced};
pub use command::OperatorCommand;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use error::EngineError;
pub use feed::SimulationFeed;
pub use manual::{submit_manual, ManualEntry};
