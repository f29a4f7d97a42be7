use thiserror::Error;
use tokio::task::JoinError;

use dronewatch_api::ApiError;
use dronewatch_config::ConfigError;
use dronewatch_core::ModelError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ModelError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown command: '{0}' (try: add <mac> <rssi> <location>, clear, sim on|off, reload)")]
    Command(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Task failed: {0}")]
    Join(#[from] JoinError),
}
