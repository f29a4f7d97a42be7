//! # Dronewatch Configuration System
//!
//! Hierarchical configuration shared by the mock backend, the dashboard
//! runtime and the simulator.
//!
//! ## Features
//! - **Unified Configuration**: one `DronewatchConfig` for every component
//! - **Validation**: ranges and formats checked after every load
//! - **Environment Awareness**: per-environment overrides and `DRONEWATCH_*` variables

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

mod dashboard;
mod error;
mod server;
mod simulation;
mod telemetry;
mod validation;

pub use dashboard::DashboardConfig;
pub use error::ConfigError;
pub use server::ServerConfig;
pub use simulation::SimulationConfig;
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/dronewatch.yaml";
const ENV_PREFIX: &str = "DRONEWATCH_";

/// Top‑level configuration container for all Dronewatch components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct DronewatchConfig {
    /// Mock backend listener and response shaping.
    #[validate(nested)]
    #[serde(default)]
    pub server: ServerConfig,

    /// Dashboard runtime: backend location, alert lifetime, page sizes.
    #[validate(nested)]
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Simulated detection feed.
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging and metrics.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl DronewatchConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/dronewatch.yaml`, skipped when missing.
    /// 3. `config/<DRONEWATCH_ENV>.yaml` - environment‑specific overrides.
    /// 4. `DRONEWATCH_*` environment variables (`__` separates nesting).
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(DronewatchConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        } else {
            debug!("{BASE_FILE} not found, using default configuration");
        }

        let env = std::env::var("DRONEWATCH_ENV").unwrap_or_else(|_| "development".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from a specific file, layered over the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::extract(
            Figment::from(Serialized::defaults(DronewatchConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
