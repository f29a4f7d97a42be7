//! In-memory detections served by the mock backend.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::debug;

use dronewatch_core::{
    CreateDetection, DashboardStats, DetectionEvent, MacAddress, Manufacturer,
    ManufacturerDirectory,
};

use crate::error::StoreError;
use crate::schema::{Page, PageRequest};

/// Detections kept in insertion order.
#[derive(Debug, Clone)]
pub struct MockStore {
    detections: Vec<DetectionEvent>,
    directory: ManufacturerDirectory,
    next_id: u64,
    latest_count: usize,
}

impl MockStore {
    pub fn new(directory: ManufacturerDirectory, latest_count: usize) -> Self {
        Self {
            detections: Vec::new(),
            directory,
            next_id: 1,
            latest_count: latest_count.max(1),
        }
    }

    /// Store pre-filled with three sightings from the 2024-12-04 morning shift.
    pub fn seeded(latest_count: usize) -> Self {
        let mut store = Self::new(ManufacturerDirectory::default(), latest_count);
        let fixtures = [
            ("60:60:1F:AA:BB:CC", Some(1), -50, "Building A - Floor 3", 30),
            ("AA:BB:CC:DD:EE:FF", Some(1), -65, "Rooftop - Perimeter Zone", 35),
            ("11:22:33:44:55:66", Some(2), -75, "Parking Lot", 40),
        ];

        for (mac, manufacturer_id, rssi, location, minute) in fixtures {
            let Ok(mac) = MacAddress::parse(mac) else {
                continue;
            };
            let detected_at = shift_time(minute);
            let id = store.allocate_id();
            let mut event = DetectionEvent::new(id, mac, rssi, location, detected_at)
                .with_created_at(detected_at + Duration::seconds(5));
            if let Some(m) = manufacturer_id.and_then(|id| store.directory.get(id)) {
                event = event.with_manufacturer(m);
            }
            store.detections.push(event);
        }
        store
    }

    pub fn list(&self, request: PageRequest) -> Page<DetectionEvent> {
        Page::slice(&self.detections, request)
    }

    /// The most recently inserted detections, oldest first.
    pub fn latest(&self) -> Vec<DetectionEvent> {
        let skip = self.detections.len().saturating_sub(self.latest_count);
        self.detections[skip..].to_vec()
    }

    pub fn create(
        &mut self,
        payload: CreateDetection,
        now: DateTime<Utc>,
    ) -> Result<DetectionEvent, StoreError> {
        let mac = payload.check()?;
        let manufacturer = self.directory.resolve(&mac).cloned();
        let id = self.allocate_id();
        let event = payload.into_event(id, manufacturer.as_ref(), now)?;
        debug!(id, mac = %event.mac_address, "Stored detection");
        self.detections.push(event.clone());
        Ok(event)
    }

    pub fn delete(&mut self, id: u64) -> Result<DetectionEvent, StoreError> {
        let index = self
            .detections
            .iter()
            .position(|d| d.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(self.detections.remove(index))
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_events(&self.detections)
    }

    pub fn manufacturers(&self) -> &[Manufacturer] {
        self.directory.all()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    // Ids are never reused, even after deletes.
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::seeded(5)
    }
}

fn shift_time(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 4, 10, minute, 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(mac: &str) -> CreateDetection {
        CreateDetection::new(mac, -60, "Hangar 2 - Perimeter", shift_time(50))
    }

    #[test]
    fn seeded_store_serves_three_detections() {
        let store = MockStore::seeded(5);
        assert_eq!(store.len(), 3);

        let ids: Vec<u64> = store.latest().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let first = &store.latest()[0];
        assert_eq!(first.manufacturer_id, Some(1));
        assert_eq!(first.created_at - first.detected_at, Duration::seconds(5));
    }

    #[test]
    fn create_resolves_manufacturer_from_oui() {
        let mut store = MockStore::seeded(5);
        let now = Utc::now();

        let dji = store.create(payload("60:60:1f:01:02:03"), now).unwrap();
        assert_eq!(dji.id, 4);
        assert_eq!(dji.mac_address.as_str(), "60:60:1F:01:02:03");
        assert_eq!(dji.manufacturer_id, Some(1));
        assert_eq!(dji.created_at, now);
        assert_eq!(dji.detected_at, shift_time(50));

        let unknown = store.create(payload("DE:AD:BE:EF:00:01"), now).unwrap();
        assert_eq!(unknown.manufacturer_id, None);
        assert_eq!(unknown.manufacturer_name, None);
    }

    #[test]
    fn invalid_payload_is_rejected_without_consuming_an_id() {
        let mut store = MockStore::seeded(5);
        let err = store.create(payload("not-a-mac"), Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));

        let next = store.create(payload("00:26:5F:00:00:01"), Utc::now()).unwrap();
        assert_eq!(next.id, 4);
        assert_eq!(next.manufacturer_name.as_deref(), Some("Parrot"));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = MockStore::seeded(5);
        let deleted = store.delete(3).unwrap();
        assert_eq!(deleted.id, 3);
        assert!(matches!(store.delete(3), Err(StoreError::NotFound(3))));

        let created = store.create(payload("00:11:22:33:44:55"), Utc::now()).unwrap();
        assert_eq!(created.id, 4);
    }

    #[test]
    fn latest_keeps_the_newest_insertions() {
        let mut store = MockStore::seeded(2);
        store.create(payload("00:11:22:33:44:55"), Utc::now()).unwrap();

        let ids: Vec<u64> = store.latest().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn stats_follow_the_stored_detections() {
        let mut store = MockStore::seeded(5);
        store.create(payload("60:60:1F:AA:BB:CC"), Utc::now()).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_detections, 4);
        assert_eq!(stats.unique_drones, 3);
        assert_eq!(stats.blocked_drones, 1);
        assert_eq!(stats.active_locations, 4);
    }

    #[test]
    fn pagination_over_the_store() {
        let store = MockStore::seeded(5);
        let page = store.list(PageRequest::new(2, 2));
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, 3);
    }
}
