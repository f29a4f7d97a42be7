//! Canonical MAC addresses.
//!
//! A `MacAddress` can only be built by parsing, so every value held by the
//! registry or the backend is already in upper-case `XX:XX:XX:XX:XX:XX` form.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Accepted input shape, case-insensitive.
pub static MAC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^([0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}$").expect("MAC pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Parses and normalizes a MAC address to upper case.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        if !MAC_PATTERN.is_match(trimmed) {
            return Err(ModelError::InvalidMac(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Organizationally unique identifier, the first three octets.
    #[inline]
    pub fn oui(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

impl AsRef<str> for MacAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets hash maps keyed by `MacAddress` be queried with a plain `&str`.
impl Borrow<str> for MacAddress {
    fn borrow(&self) -> &str {
        &self.0
    }
}
