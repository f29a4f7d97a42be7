//! Dashboard state shared by every event producer.
//!
//! All mutations go through one mutex: the registry update, the alert raise
//! and the snapshot publication of a call happen together, so observers see
//! snapshots in mutation order. Alert changes that happen on their own
//! (expiry) are copied into the published snapshot by a follower task.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use dronewatch_config::DashboardConfig;
use dronewatch_core::{DashboardStats, DetectionEvent};
use dronewatch_detection::{
    AlertBoard, BlockAlert, BlockStatus, DetectionRegistry, IngestOutcome,
};
use dronewatch_telemetry::MetricsRecorder;

use crate::engine::backend::{DataOrigin, Sourced};

/// What a presentation layer needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub statuses: Vec<BlockStatus>,
    /// Most recent first.
    pub recent: Vec<DetectionEvent>,
    /// Alert currently visible; cleared again when it expires.
    pub alert: Option<BlockAlert>,
    /// Where the last loaded listing came from.
    pub origin: DataOrigin,
}

struct DashboardState {
    registry: DetectionRegistry,
    origin: DataOrigin,
}

pub struct Dashboard {
    state: Mutex<DashboardState>,
    alerts: AlertBoard,
    snapshots: Arc<watch::Sender<DashboardSnapshot>>,
    alert_follower: Option<JoinHandle<()>>,
    metrics: Option<Arc<MetricsRecorder>>,
    recent_limit: usize,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig, metrics: Option<Arc<MetricsRecorder>>) -> Self {
        Self::with_alerts(AlertBoard::new(config.alert_ttl()), config.recent_limit, metrics)
    }

    /// Outside a tokio runtime alert expiry is only visible through
    /// `subscribe_alerts`.
    pub fn with_alerts(
        alerts: AlertBoard,
        recent_limit: usize,
        metrics: Option<Arc<MetricsRecorder>>,
    ) -> Self {
        let snapshots = Arc::new(watch::channel(DashboardSnapshot::default()).0);
        let alert_follower = Handle::try_current()
            .ok()
            .map(|handle| handle.spawn(follow_alerts(alerts.clone(), Arc::clone(&snapshots))));
        Self {
            state: Mutex::new(DashboardState {
                registry: DetectionRegistry::new(),
                origin: DataOrigin::Live,
            }),
            alerts,
            snapshots,
            alert_follower,
            metrics,
            recent_limit,
        }
    }

    /// Applies one detection; a repeat sighting raises the block alert.
    pub fn ingest(&self, event: DetectionEvent) -> IngestOutcome {
        let mut state = self.state.lock();
        let outcome = state.registry.ingest(event);

        if let Some(alert) = &outcome.alert {
            warn!(mac = %alert.mac_address, "{}", alert.message);
            self.alerts.raise(alert.clone());
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_ingest(outcome.was_blocked);
        }

        self.publish(&state);
        outcome
    }

    /// Prepends several detections at once. Never raises an alert.
    pub fn ingest_batch<I>(&self, events: I)
    where
        I: IntoIterator<Item = DetectionEvent>,
    {
        let events: Vec<DetectionEvent> = events.into_iter().collect();
        let mut state = self.state.lock();
        if let Some(metrics) = &self.metrics {
            metrics.detections_ingested.inc_by(events.len() as u64);
        }
        state.registry.ingest_batch(events);
        self.publish(&state);
    }

    pub fn replace<I>(&self, events: I)
    where
        I: IntoIterator<Item = DetectionEvent>,
    {
        let mut state = self.state.lock();
        state.registry.replace(events);
        self.publish(&state);
    }

    /// Replaces the window with a listing and remembers its origin.
    pub fn load(&self, listing: Sourced<Vec<DetectionEvent>>) {
        let mut state = self.state.lock();
        info!(
            count = listing.data.len(),
            origin = ?listing.origin,
            "Loaded detections"
        );
        state.origin = listing.origin;
        state.registry.replace(listing.data);
        self.publish(&state);
    }

    /// Empties the window and dismisses the visible alert.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.registry.clear();
        self.alerts.dismiss();
        self.publish(&state);
    }

    pub fn is_blocked(&self, mac: &str) -> bool {
        self.state.lock().registry.is_blocked(mac)
    }

    pub fn detection_count(&self, mac: &str) -> usize {
        self.state.lock().registry.detection_count(mac)
    }

    pub fn blocked_status_list(&self) -> Vec<BlockStatus> {
        self.state.lock().registry.blocked_status_list()
    }

    pub fn stats(&self) -> DashboardStats {
        self.state.lock().registry.stats()
    }

    pub fn origin(&self) -> DataOrigin {
        self.state.lock().origin
    }

    pub fn current_alert(&self) -> Option<BlockAlert> {
        self.alerts.current()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.lock();
        self.build_snapshot(&state)
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn subscribe_alerts(&self) -> watch::Receiver<Option<BlockAlert>> {
        self.alerts.subscribe()
    }

    fn publish(&self, state: &DashboardState) {
        self.snapshots.send_replace(self.build_snapshot(state));
    }

    fn build_snapshot(&self, state: &DashboardState) -> DashboardSnapshot {
        DashboardSnapshot {
            stats: state.registry.stats(),
            statuses: state.registry.blocked_status_list(),
            recent: state
                .registry
                .events()
                .take(self.recent_limit)
                .cloned()
                .collect(),
            alert: self.alerts.current(),
            origin: state.origin,
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Some(follower) = self.alert_follower.take() {
            follower.abort();
        }
    }
}

/// Mirrors the board into the last published snapshot. The board is read
/// inside `send_if_modified`, under the snapshot lock, so a concurrent
/// publish can never be overwritten with an older alert.
async fn follow_alerts(board: AlertBoard, snapshots: Arc<watch::Sender<DashboardSnapshot>>) {
    let mut changes = board.subscribe();
    while changes.changed().await.is_ok() {
        let updated = snapshots.send_if_modified(|snapshot| {
            let current = board.current();
            if snapshot.alert == current {
                return false;
            }
            snapshot.alert = current;
            true
        });
        if updated {
            debug!("snapshot alert updated");
        }
    }
}
