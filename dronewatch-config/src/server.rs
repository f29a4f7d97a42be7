//! Mock backend configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ServerConfig {
    /// Listen address.
    #[validate(custom(function = validation::validate_bind_address))]
    #[serde(default = "default_bind")]
    pub bind: String,

    #[validate(range(min = 1))]
    #[serde(default = "default_port")]
    pub port: u16,

    /// `limit` used when a listing request carries none or an invalid one.
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_page_limit")]
    pub default_page_limit: usize,

    /// Size of `GET /api/v1/detections/latest`.
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_latest_count")]
    pub latest_count: usize,

    /// Largest accepted request body.
    #[validate(range(min = 1024, max = 1048576))]
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Time a client gets to send a complete request (milliseconds).
    #[validate(range(min = 100, max = 60000))]
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_page_limit() -> usize {
    10
}

fn default_latest_count() -> usize {
    5
}

fn default_max_body_bytes() -> usize {
    65536
}

fn default_read_timeout_ms() -> u64 {
    5000
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            default_page_limit: default_page_limit(),
            latest_count: default_latest_count(),
            max_body_bytes: default_max_body_bytes(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_contract() {
        let config = ServerConfig::default();
        config.validate().expect("Default config should be valid");
        assert_eq!(config.listen_address(), "0.0.0.0:8080");
        assert_eq!(config.read_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_port() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
