use chrono::Utc;
use serde::Serialize;
use tracing::info;

use dronewatch_api::Backend;
use dronewatch_core::CreateDetection;
use dronewatch_detection::IngestOutcome;

use crate::engine::dashboard::Dashboard;
use crate::engine::error::EngineError;

/// Operator-entered detection; the timestamp is taken at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualEntry {
    pub mac: String,
    pub rssi: i32,
    pub sensor_location: String,
}

impl ManualEntry {
    pub fn new(mac: impl Into<String>, rssi: i32, sensor_location: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            rssi,
            sensor_location: sensor_location.into(),
        }
    }

    /// Builds the producer payload, rejecting invalid input before any
    /// network call.
    pub fn into_payload(self) -> Result<CreateDetection, EngineError> {
        let payload = CreateDetection::new(self.mac, self.rssi, self.sensor_location, Utc::now());
        payload.check()?;
        Ok(payload)
    }
}

/// Validates `entry`, creates it through `backend` and ingests the stored
/// event.
pub async fn submit_manual<B>(
    backend: &B,
    dashboard: &Dashboard,
    entry: ManualEntry,
) -> Result<IngestOutcome, EngineError>
where
    B: Backend + ?Sized,
{
    let payload = entry.into_payload()?;
    let event = backend.create_detection(&payload).await?;
    info!(id = event.id, mac = %event.mac_address, "Manual detection registered");
    Ok(dashboard.ingest(event))
}
