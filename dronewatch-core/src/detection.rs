//! Detection events and the payload producers submit to create them.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::ModelError;
use crate::mac::{MacAddress, MAC_PATTERN};
use crate::manufacturer::Manufacturer;

/// A single sighting of a drone by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Assigned by the producing source, opaque to the registry.
    pub id: u64,
    pub mac_address: MacAddress,
    #[serde(default)]
    pub manufacturer_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_name: Option<String>,
    /// Signal strength in dBm.
    pub rssi: i32,
    pub sensor_location: String,
    pub detected_at: DateTime<Utc>,
    /// Ingestion time, may lag `detected_at`.
    pub created_at: DateTime<Utc>,
}

impl DetectionEvent {
    /// Creates an event without manufacturer information, ingested at the
    /// moment it was detected.
    pub fn new(
        id: u64,
        mac_address: MacAddress,
        rssi: i32,
        sensor_location: impl Into<String>,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            mac_address,
            manufacturer_id: None,
            manufacturer_name: None,
            rssi,
            sensor_location: sensor_location.into(),
            detected_at,
            created_at: detected_at,
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: &Manufacturer) -> Self {
        self.manufacturer_id = Some(manufacturer.id);
        self.manufacturer_name = Some(manufacturer.name.clone());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Body of `POST /api/v1/detections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_reading, skip_on_field_errors = false))]
pub struct CreateDetection {
    #[validate(regex(
        path = *MAC_PATTERN,
        message = "Invalid MAC address format (XX:XX:XX:XX:XX:XX)"
    ))]
    pub mac: String,
    pub rssi: i32,
    #[validate(custom(function = validate_location))]
    pub sensor_location: String,
    pub timestamp: DateTime<Utc>,
}

impl CreateDetection {
    pub fn new(
        mac: impl Into<String>,
        rssi: i32,
        sensor_location: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            mac: mac.into(),
            rssi,
            sensor_location: sensor_location.into(),
            timestamp,
        }
    }

    /// Runs the producer-boundary checks and returns the normalized MAC.
    pub fn check(&self) -> Result<MacAddress, ModelError> {
        self.validate()?;
        MacAddress::parse(&self.mac)
    }

    /// Builds the event a backend stores for this payload.
    pub fn into_event(
        self,
        id: u64,
        manufacturer: Option<&Manufacturer>,
        created_at: DateTime<Utc>,
    ) -> Result<DetectionEvent, ModelError> {
        let mac = self.check()?;
        let event = DetectionEvent::new(id, mac, self.rssi, self.sensor_location, self.timestamp)
            .with_created_at(created_at);
        Ok(match manufacturer {
            Some(m) => event.with_manufacturer(m),
            None => event,
        })
    }
}

/// Zero is what a non-numeric form field decodes to.
fn validate_reading(payload: &CreateDetection) -> Result<(), ValidationError> {
    if payload.rssi == 0 {
        return Err(ValidationError::new("invalid_rssi")
            .with_message(Cow::Borrowed("RSSI must be a valid number")));
    }
    Ok(())
}

fn validate_location(location: &str) -> Result<(), ValidationError> {
    if location.trim().is_empty() {
        return Err(ValidationError::new("missing_location")
            .with_message(Cow::Borrowed("Location is required")));
    }
    Ok(())
}
