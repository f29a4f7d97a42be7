//! Dashboard runtime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct DashboardConfig {
    /// Backend `host:port`.
    #[validate(custom(function = validation::validate_endpoint))]
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Detections requested on page load.
    #[validate(range(min = 1, max = 500))]
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// How long a block alert stays visible (milliseconds).
    #[validate(range(min = 100, max = 600000))]
    #[serde(default = "default_alert_ttl_ms")]
    pub alert_ttl_ms: u64,

    /// Backend request timeout (milliseconds).
    #[validate(range(min = 100, max = 60000))]
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Number of detections carried in each published snapshot.
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_api_url() -> String {
    "127.0.0.1:8080".into()
}

fn default_page_size() -> usize {
    20
}

fn default_alert_ttl_ms() -> u64 {
    5000
}

fn default_request_timeout_ms() -> u64 {
    2000
}

fn default_recent_limit() -> usize {
    20
}

impl DashboardConfig {
    pub fn alert_ttl(&self) -> Duration {
        Duration::from_millis(self.alert_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            alert_ttl_ms: default_alert_ttl_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            recent_limit: default_recent_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alert_lifetime_is_five_seconds() {
        let config = DashboardConfig::default();
        config.validate().expect("Default config should be valid");
        assert_eq!(config.alert_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_endpoint_without_port() {
        let config = DashboardConfig {
            api_url: "localhost".into(),
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
