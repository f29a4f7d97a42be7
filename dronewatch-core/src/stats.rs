//! Dashboard counters.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::detection::DetectionEvent;

/// Bucket name for detections without a resolved manufacturer.
pub const UNKNOWN_MANUFACTURER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManufacturerCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_detections: usize,
    pub unique_drones: usize,
    /// MACs seen more than once.
    pub blocked_drones: usize,
    pub active_locations: usize,
    /// Descending by count, then by name.
    pub top_manufacturers: Vec<ManufacturerCount>,
}

impl DashboardStats {
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a DetectionEvent>,
    {
        let mut total = 0;
        let mut per_mac: HashMap<&str, usize> = HashMap::new();
        let mut locations: HashSet<&str> = HashSet::new();
        let mut per_manufacturer: HashMap<&str, usize> = HashMap::new();

        for event in events {
            total += 1;
            *per_mac.entry(event.mac_address.as_str()).or_default() += 1;
            locations.insert(event.sensor_location.as_str());
            let name = event
                .manufacturer_name
                .as_deref()
                .unwrap_or(UNKNOWN_MANUFACTURER);
            *per_manufacturer.entry(name).or_default() += 1;
        }

        let mut top_manufacturers: Vec<ManufacturerCount> = per_manufacturer
            .into_iter()
            .map(|(name, count)| ManufacturerCount {
                name: name.to_string(),
                count,
            })
            .collect();
        top_manufacturers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        Self {
            total_detections: total,
            unique_drones: per_mac.len(),
            blocked_drones: per_mac.values().filter(|&&count| count > 1).count(),
            active_locations: locations.len(),
            top_manufacturers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::MacAddress;
    use crate::manufacturer::Manufacturer;
    use chrono::{TimeZone, Utc};

    fn event(id: u64, mac: &str, location: &str, dji: bool) -> DetectionEvent {
        let e = DetectionEvent::new(
            id,
            MacAddress::parse(mac).unwrap(),
            -60,
            location,
            Utc.timestamp_opt(id as i64, 0).unwrap(),
        );
        if dji {
            e.with_manufacturer(&Manufacturer::new(1, "60:60:1F", "DJI"))
        } else {
            e
        }
    }

    #[test]
    fn counts_everything() {
        let events = vec![
            event(1, "60:60:1F:00:00:01", "Gate", true),
            event(2, "60:60:1F:00:00:01", "Roof", true),
            event(3, "AA:BB:CC:00:00:02", "Gate", false),
        ];
        let stats = DashboardStats::from_events(&events);
        assert_eq!(stats.total_detections, 3);
        assert_eq!(stats.unique_drones, 2);
        assert_eq!(stats.blocked_drones, 1);
        assert_eq!(stats.active_locations, 2);
        assert_eq!(
            stats.top_manufacturers,
            vec![
                ManufacturerCount { name: "DJI".into(), count: 2 },
                ManufacturerCount { name: UNKNOWN_MANUFACTURER.into(), count: 1 },
            ]
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(DashboardStats::from_events(&Vec::<DetectionEvent>::new()), DashboardStats::default());
    }
}
