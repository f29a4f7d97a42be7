//! ## dronewatch-detection::registry
//! **Detection window and blocklist classification**
//!
//! A MAC address is blocked iff it has been seen more than once in the
//! current window. Single ingests classify incrementally and produce an
//! alert for every repeat sighting; batch ingests recompute the blocked set
//! from scratch and never alert.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use dronewatch_core::{DashboardStats, DetectionEvent, MacAddress};

use crate::alert::BlockAlert;

/// Result of a single `ingest`.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// The MAC had already been seen in the window before this event.
    pub was_blocked: bool,
    /// Present iff `was_blocked`.
    pub alert: Option<BlockAlert>,
}

/// Per-MAC view derived from the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockStatus {
    pub mac_address: MacAddress,
    pub detection_count: usize,
    pub is_blocked: bool,
    pub last_detected: DateTime<Utc>,
    pub manufacturer_name: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct DetectionRegistry {
    /// Most recent first.
    events: VecDeque<DetectionEvent>,
    counts: HashMap<MacAddress, usize>,
    blocked: HashSet<MacAddress>,
}

impl DetectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one event to the front of the window.
    pub fn ingest(&mut self, event: DetectionEvent) -> IngestOutcome {
        let count = self.counts.entry(event.mac_address.clone()).or_insert(0);
        let was_blocked = *count > 0;
        *count += 1;

        let alert = if was_blocked {
            debug!(mac = %event.mac_address, sightings = *count, "repeat sighting, MAC blocked");
            self.blocked.insert(event.mac_address.clone());
            Some(BlockAlert::for_event(&event))
        } else {
            trace!(mac = %event.mac_address, "first sighting");
            None
        };

        self.events.push_front(event);
        IngestOutcome { was_blocked, alert }
    }

    /// Prepends `events` (keeping their order) and reclassifies the whole
    /// window.
    pub fn ingest_batch<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = DetectionEvent>,
    {
        let batch: Vec<DetectionEvent> = events.into_iter().collect();
        debug!(size = batch.len(), "ingesting batch");
        for event in batch.into_iter().rev() {
            self.events.push_front(event);
        }
        self.reclassify();
    }

    /// Clears the window and loads `events` as its only content.
    pub fn replace<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = DetectionEvent>,
    {
        self.clear();
        self.ingest_batch(events);
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.counts.clear();
        self.blocked.clear();
    }

    #[inline]
    pub fn is_blocked(&self, mac: &str) -> bool {
        self.blocked.contains(mac)
    }

    /// Exact match against the stored, normalized MAC.
    #[inline]
    pub fn detection_count(&self, mac: &str) -> usize {
        self.counts.get(mac).copied().unwrap_or(0)
    }

    /// One entry per MAC, most recently detected first. Entries with the same
    /// `last_detected` keep the order in which their MAC first appears in the
    /// window.
    pub fn blocked_status_list(&self) -> Vec<BlockStatus> {
        let mut statuses: Vec<BlockStatus> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for event in &self.events {
            let slot = *index.entry(event.mac_address.as_str()).or_insert_with(|| {
                statuses.push(BlockStatus {
                    mac_address: event.mac_address.clone(),
                    detection_count: 0,
                    is_blocked: self.blocked.contains(&event.mac_address),
                    last_detected: event.detected_at,
                    manufacturer_name: None,
                });
                statuses.len() - 1
            });

            let status = &mut statuses[slot];
            status.detection_count += 1;
            if event.detected_at > status.last_detected {
                status.last_detected = event.detected_at;
            }
            if let Some(name) = &event.manufacturer_name {
                status.manufacturer_name = Some(name.clone());
            }
        }

        statuses.sort_by(|a, b| b.last_detected.cmp(&a.last_detected));
        statuses
    }

    pub fn stats(&self) -> DashboardStats {
        let mut stats = DashboardStats::from_events(&self.events);
        stats.blocked_drones = self.blocked.len();
        stats
    }

    /// Most recent first.
    pub fn events(&self) -> impl Iterator<Item = &DetectionEvent> {
        self.events.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn reclassify(&mut self) {
        self.counts.clear();
        for event in &self.events {
            *self.counts.entry(event.mac_address.clone()).or_insert(0) += 1;
        }
        self.blocked = self
            .counts
            .iter()
            .filter(|&(_, &count)| count > 1)
            .map(|(mac, _)| mac.clone())
            .collect();
    }
}
