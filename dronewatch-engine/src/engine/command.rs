//! Operator commands accepted by a running dashboard.
//!
//! One command per line:
//!
//! ```text
//! add <mac> <rssi> <location...>
//! clear
//! sim on|off
//! reload
//! ```

use std::str::FromStr;

use crate::engine::error::EngineError;
use crate::engine::manual::ManualEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Manual detection, validated before it reaches the backend.
    Add(ManualEntry),
    /// Empties the window and dismisses the visible alert.
    Clear,
    Simulate(bool),
    /// Reloads the first page from the backend.
    Reload,
}

impl FromStr for OperatorCommand {
    type Err = EngineError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let invalid = || EngineError::Command(line.trim().to_string());

        let command = match words.next().map(str::to_ascii_lowercase).as_deref() {
            Some("add") => {
                let mac = words.next().ok_or_else(invalid)?;
                let rssi = words
                    .next()
                    .ok_or_else(invalid)?
                    .parse::<i32>()
                    .map_err(|_| invalid())?;
                let location = words.collect::<Vec<_>>().join(" ");
                return Ok(Self::Add(ManualEntry::new(mac, rssi, location)));
            }
            Some("clear") => Self::Clear,
            Some("reload") => Self::Reload,
            Some("sim") => match words.next() {
                Some("on") => Self::Simulate(true),
                Some("off") => Self::Simulate(false),
                _ => return Err(invalid()),
            },
            _ => return Err(invalid()),
        };

        match words.next() {
            None => Ok(command),
            Some(_) => Err(invalid()),
        }
    }
}
