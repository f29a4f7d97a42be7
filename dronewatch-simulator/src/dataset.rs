//! ## dronewatch-simulator::dataset
//! **Local stand-in for the detection backend**
//!
//! Eight detections, one minute apart, spread over five MACs so the
//! dashboard has repeats (and therefore blocked drones) to show. Even
//! positions carry the DJI manufacturer. New detections are prepended, with
//! ids from 101 so they never collide with the canned ones.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use dronewatch_api::{ApiError, Backend, Page, PageRequest};
use dronewatch_core::{
    CreateDetection, DashboardStats, DetectionEvent, MacAddress, Manufacturer,
    ManufacturerDirectory,
};

use crate::generator::{RSSI_MAX, RSSI_MIN};

const DATASET_MACS: [&str; 5] = [
    "60:60:1F:AA:BB:CC",
    "60:60:1F:DD:EE:FF",
    "60:60:1F:11:22:33",
    "60:60:1F:44:55:66",
    "AA:BB:CC:DD:EE:FF",
];

const DATASET_LOCATIONS: [&str; 6] = [
    "Building A - Floor 3",
    "Building B - Rooftop",
    "Parking Lot",
    "Main Entrance",
    "Warehouse",
    "Perimeter",
];

const DATASET_SIZE: usize = 8;
const FIRST_CREATED_ID: u64 = 101;
const LATEST_COUNT: usize = 5;

#[derive(Debug)]
pub struct LocalDataset {
    state: Mutex<DatasetState>,
    directory: ManufacturerDirectory,
}

#[derive(Debug)]
struct DatasetState {
    /// Most recent first.
    detections: Vec<DetectionEvent>,
    next_id: u64,
}

impl LocalDataset {
    /// Builds the canned detections relative to `now`.
    pub fn generate<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let directory = fallback_directory();
        let detections = (0..DATASET_SIZE)
            .filter_map(|i| {
                let mac = MacAddress::parse(DATASET_MACS[i % DATASET_MACS.len()]).ok()?;
                let detected_at = now - Duration::minutes(i as i64);
                let event = DetectionEvent::new(
                    i as u64 + 1,
                    mac,
                    rng.random_range(RSSI_MIN..RSSI_MAX),
                    DATASET_LOCATIONS[i % DATASET_LOCATIONS.len()],
                    detected_at,
                )
                .with_created_at(detected_at - Duration::seconds(5));
                Some(match directory.get(1) {
                    Some(dji) if i % 2 == 0 => event.with_manufacturer(dji),
                    _ => event,
                })
            })
            .collect();

        Self {
            state: Mutex::new(DatasetState {
                detections,
                next_id: FIRST_CREATED_ID,
            }),
            directory,
        }
    }

    /// Seeded dataset for reproducible runs.
    pub fn seeded(now: DateTime<Utc>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::generate(now, &mut rng)
    }

    pub fn page(&self, page: usize, limit: usize) -> Page<DetectionEvent> {
        Page::slice(&self.state.lock().detections, PageRequest::new(page, limit))
    }

    pub fn latest(&self) -> Vec<DetectionEvent> {
        self.state
            .lock()
            .detections
            .iter()
            .take(LATEST_COUNT)
            .cloned()
            .collect()
    }

    /// Stores a detection locally. The manufacturer comes from the fallback
    /// OUI table.
    pub fn create(
        &self,
        payload: &CreateDetection,
        now: DateTime<Utc>,
    ) -> Result<DetectionEvent, ApiError> {
        let mac = payload.check().map_err(|e| ApiError::Status {
            status: 400,
            message: e.to_string(),
        })?;
        let manufacturer = self.directory.resolve(&mac);

        let mut state = self.state.lock();
        let id = state.next_id;
        let event = payload
            .clone()
            .into_event(id, manufacturer, now)
            .map_err(|e| ApiError::Status {
                status: 400,
                message: e.to_string(),
            })?;
        state.next_id += 1;
        state.detections.insert(0, event.clone());
        debug!(id, mac = %event.mac_address, "Stored detection in local dataset");
        Ok(event)
    }

    pub fn manufacturers(&self) -> Vec<Manufacturer> {
        self.directory.all().to_vec()
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_events(&self.state.lock().detections)
    }

    pub fn len(&self) -> usize {
        self.state.lock().detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().detections.is_empty()
    }
}

impl Default for LocalDataset {
    fn default() -> Self {
        Self::generate(Utc::now(), &mut rand::rng())
    }
}

#[async_trait]
impl Backend for LocalDataset {
    async fn list_detections(
        &self,
        page: usize,
        limit: usize,
    ) -> Result<Page<DetectionEvent>, ApiError> {
        Ok(self.page(page, limit))
    }

    async fn latest_detections(&self) -> Result<Vec<DetectionEvent>, ApiError> {
        Ok(self.latest())
    }

    async fn create_detection(
        &self,
        payload: &CreateDetection,
    ) -> Result<DetectionEvent, ApiError> {
        self.create(payload, Utc::now())
    }

    async fn manufacturers(&self) -> Result<Vec<Manufacturer>, ApiError> {
        Ok(LocalDataset::manufacturers(self))
    }

    async fn stats(&self) -> Result<DashboardStats, ApiError> {
        Ok(LocalDataset::stats(self))
    }
}

fn fallback_directory() -> ManufacturerDirectory {
    ManufacturerDirectory::new(vec![
        Manufacturer::new(1, "60:60:1F", "DJI Technology Co., Ltd."),
        Manufacturer::new(2, "AA:BB:CC", "Test Manufacturer"),
    ])
}
