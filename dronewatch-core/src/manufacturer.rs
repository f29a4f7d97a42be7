//! OUI based manufacturer resolution.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::mac::MacAddress;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: u32,
    /// First three octets, upper case (`60:60:1F`).
    pub oui: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Manufacturer {
    pub fn new(id: u32, oui: &str, name: impl Into<String>) -> Self {
        let registered = registry_epoch();
        Self {
            id,
            oui: oui.to_ascii_uppercase(),
            name: name.into(),
            created_at: registered,
            updated_at: registered,
        }
    }
}

// 2024-01-15T10:00:00Z, when the default table was registered.
fn registry_epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_705_312_800, 0)
        .single()
        .unwrap_or_default()
}

/// Lookup table from OUI prefix to manufacturer.
#[derive(Debug, Clone)]
pub struct ManufacturerDirectory {
    entries: Vec<Manufacturer>,
}

impl ManufacturerDirectory {
    pub fn new(entries: Vec<Manufacturer>) -> Self {
        Self { entries }
    }

    pub fn resolve(&self, mac: &MacAddress) -> Option<&Manufacturer> {
        self.entries.iter().find(|m| m.oui == mac.oui())
    }

    pub fn get(&self, id: u32) -> Option<&Manufacturer> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn all(&self) -> &[Manufacturer] {
        &self.entries
    }
}

impl Default for ManufacturerDirectory {
    fn default() -> Self {
        Self::new(vec![
            Manufacturer::new(1, "60:60:1F", "DJI Technology Co., Ltd."),
            Manufacturer::new(2, "00:26:5F", "Parrot"),
        ])
    }
}
