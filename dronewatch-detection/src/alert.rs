//! ## dronewatch-detection::alert
//! **Single visible block alert with auto-expiry**
//!
//! At most one alert is visible. Raising a new alert replaces the current one
//! and restarts the expiry timer; only one expiry task is alive at a time.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use dronewatch_core::{DetectionEvent, MacAddress};

pub const DEFAULT_ALERT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockAlert {
    pub mac_address: MacAddress,
    pub manufacturer_name: Option<String>,
    /// One-line text shown to operators.
    pub message: String,
}

impl BlockAlert {
    pub fn new(mac_address: MacAddress, manufacturer_name: Option<String>) -> Self {
        let message = match &manufacturer_name {
            Some(name) => format!("BLOCKED DRONE DETECTED! MAC: {mac_address} ({name})"),
            None => format!("BLOCKED DRONE DETECTED! MAC: {mac_address}"),
        };
        Self {
            mac_address,
            manufacturer_name,
            message,
        }
    }

    pub fn for_event(event: &DetectionEvent) -> Self {
        Self::new(event.mac_address.clone(), event.manufacturer_name.clone())
    }
}

#[derive(Default)]
struct ExpiryState {
    generation: u64,
    expiry: Option<JoinHandle<()>>,
}

struct AlertInner {
    ttl: Duration,
    state: Mutex<ExpiryState>,
    current: watch::Sender<Option<BlockAlert>>,
}

impl AlertInner {
    fn expire(&self, generation: u64) {
        let mut state = self.state.lock();
        // A newer raise or a dismiss already took over.
        if state.generation != generation {
            return;
        }
        state.expiry = None;
        self.current.send_replace(None);
        debug!("block alert expired");
    }
}

impl Drop for AlertInner {
    fn drop(&mut self) {
        if let Some(handle) = self.state.get_mut().expiry.take() {
            handle.abort();
        }
    }
}

/// Holder of the currently visible alert. Cloning shares the same board.
#[derive(Clone)]
pub struct AlertBoard {
    inner: Arc<AlertInner>,
}

impl AlertBoard {
    pub fn new(ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(AlertInner {
                ttl,
                state: Mutex::new(ExpiryState::default()),
                current,
            }),
        }
    }

    /// Shows `alert`, replacing any visible one, and (re)starts the expiry
    /// timer. Outside a tokio runtime the alert stays until replaced or
    /// dismissed.
    pub fn raise(&self, alert: BlockAlert) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        if let Some(previous) = state.expiry.take() {
            previous.abort();
        }

        debug!(mac = %alert.mac_address, "raising block alert");
        self.inner.current.send_replace(Some(alert));

        let generation = state.generation;
        match Handle::try_current() {
            Ok(handle) => {
                let weak: Weak<AlertInner> = Arc::downgrade(&self.inner);
                let ttl = self.inner.ttl;
                state.expiry = Some(handle.spawn(async move {
                    sleep(ttl).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.expire(generation);
                    }
                }));
            }
            Err(_) => warn!("no async runtime available, block alert will not auto-expire"),
        }
    }

    /// Hides the visible alert and cancels its expiry.
    pub fn dismiss(&self) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        if let Some(pending) = state.expiry.take() {
            pending.abort();
        }
        self.inner.current.send_replace(None);
    }

    pub fn current(&self) -> Option<BlockAlert> {
        self.inner.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<BlockAlert>> {
        self.inner.current.subscribe()
    }
}

impl Default for AlertBoard {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(mac: &str) -> BlockAlert {
        BlockAlert::new(MacAddress::parse(mac).unwrap(), None)
    }

    #[test]
    fn message_without_manufacturer() {
        assert_eq!(
            alert("AA:BB:CC:DD:EE:01").message,
            "BLOCKED DRONE DETECTED! MAC: AA:BB:CC:DD:EE:01"
        );
    }

    #[test]
    fn stays_visible_without_runtime() {
        let board = AlertBoard::default();
        board.raise(alert("AA:BB:CC:DD:EE:01"));
        assert!(board.current().is_some());
        board.dismiss();
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_ttl() {
        let board = AlertBoard::default();
        board.raise(alert("AA:BB:CC:DD:EE:01"));

        sleep(Duration::from_millis(4_900)).await;
        assert!(board.current().is_some());

        sleep(Duration::from_millis(200)).await;
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_alert_restarts_timer() {
        let board = AlertBoard::default();
        board.raise(alert("AA:BB:CC:DD:EE:01"));
        sleep(Duration::from_secs(3)).await;

        board.raise(alert("AA:BB:CC:DD:EE:02"));
        sleep(Duration::from_secs(3)).await;
        let visible = board.current().expect("second alert still visible");
        assert_eq!(visible.mac_address.as_str(), "AA:BB:CC:DD:EE:02");

        sleep(Duration::from_millis(2_100)).await;
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_cancels_pending_expiry() {
        let board = AlertBoard::new(Duration::from_secs(1));
        let mut updates = board.subscribe();

        board.raise(alert("AA:BB:CC:DD:EE:01"));
        board.dismiss();
        assert!(board.current().is_none());
        updates.borrow_and_update();

        sleep(Duration::from_secs(2)).await;
        assert!(!updates.has_changed().unwrap());
    }
}
