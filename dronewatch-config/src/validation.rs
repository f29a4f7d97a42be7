//! Custom validation functions for configuration.
//!
//! Provides shared validation logic used across multiple configuration modules.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^[A-Za-z0-9]([A-Za-z0-9-]{0,62})(\\.[A-Za-z0-9]([A-Za-z0-9-]{0,62}))*$")
        .expect("hostname pattern is a valid regex")
});

/// Validate a listen address: an IP literal or a host name.
pub fn validate_bind_address(bind: &str) -> Result<(), ValidationError> {
    if bind.parse::<IpAddr>().is_ok() || HOSTNAME.is_match(bind) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_bind_address"))
    }
}

/// Validate a `host:port` endpoint with a non-zero port.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ValidationError> {
    let Some((host, port)) = endpoint.rsplit_once(':') else {
        return Err(ValidationError::new("missing_port"));
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port_ok = matches!(port.parse::<u16>(), Ok(p) if p > 0);
    if port_ok && validate_bind_address(host).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_endpoint"))
    }
}

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"].contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addresses() {
        assert!(validate_bind_address("0.0.0.0").is_ok());
        assert!(validate_bind_address("::1").is_ok());
        assert!(validate_bind_address("localhost").is_ok());
        assert!(validate_bind_address("api.internal").is_ok());
        assert!(validate_bind_address("").is_err());
        assert!(validate_bind_address("bad host").is_err());
    }

    #[test]
    fn endpoints() {
        assert!(validate_endpoint("127.0.0.1:8080").is_ok());
        assert!(validate_endpoint("localhost:80").is_ok());
        assert!(validate_endpoint("[::1]:8080").is_ok());
        assert!(validate_endpoint("127.0.0.1").is_err());
        assert!(validate_endpoint("127.0.0.1:0").is_err());
        assert!(validate_endpoint("127.0.0.1:http").is_err());
    }

    #[test]
    fn log_levels() {
        assert!(validate_log_level("INFO").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }
}
