pub mod engine;
pub mod runtime;

// Re-export the runtime functions so frontends can simply do:
pub use engine::{
    DataOrigin, Dashboard, DashboardSnapshot, EngineError, FallbackBackend, ManualEntry,
    OperatorCommand, SimulationFeed, Sourced,
};
pub use runtime::{run_dashboard, run_server, submit_detection};
