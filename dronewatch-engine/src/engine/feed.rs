//! Periodic synthetic detections pushed through a backend into the dashboard.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn, Instrument};

use dronewatch_api::Backend;
use dronewatch_config::SimulationConfig;
use dronewatch_simulator::DetectionGenerator;

use crate::engine::dashboard::Dashboard;

pub struct SimulationFeed<B> {
    backend: Arc<B>,
    dashboard: Arc<Dashboard>,
    interval: Duration,
    seed: Option<u64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<B: Backend + 'static> SimulationFeed<B> {
    pub fn new(backend: Arc<B>, dashboard: Arc<Dashboard>, config: &SimulationConfig) -> Self {
        Self {
            backend,
            dashboard,
            interval: config.interval(),
            seed: config.seed,
            task: Mutex::new(None),
        }
    }

    /// Starts producing one detection per interval, the first one interval
    /// from now. Returns `false` if the feed was already running.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            warn!("Simulation already running");
            return false;
        }

        let backend = Arc::clone(&self.backend);
        let dashboard = Arc::clone(&self.dashboard);
        let period = self.interval;
        let mut generator = DetectionGenerator::new(self.seed);

        info!(interval_ms = period.as_millis() as u64, "Starting simulation feed");
        *task = Some(tokio::spawn(
            async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let payload = generator.next_payload(Utc::now());
                    match backend.create_detection(&payload).await {
                        Ok(event) => {
                            debug!(id = event.id, mac = %event.mac_address, "Simulated detection");
                            dashboard.ingest(event);
                        }
                        Err(e) => {
                            error!("Simulation error: {}", e);
                            break;
                        }
                    }
                }
            }
            .instrument(tracing::info_span!("simulation_feed")),
        ));
        true
    }

    /// Stops the feed; a no-op when it is not running.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("Simulation feed stopped");
        }
    }

    /// False once stopped or after a backend error ended the feed.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

impl<B> Drop for SimulationFeed<B> {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use dronewatch_detection::AlertBoard;

    use crate::engine::backend::tests::FakeBackend;

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            interval_ms: 5000,
            seed: Some(seed),
        }
    }

    fn dashboard() -> Arc<Dashboard> {
        Arc::new(Dashboard::with_alerts(AlertBoard::default(), 20, None))
    }

    #[tokio::test(start_paused = true)]
    async fn produces_one_detection_per_interval() {
        let backend = Arc::new(FakeBackend::default());
        let dashboard = dashboard();
        let feed = SimulationFeed::new(Arc::clone(&backend), Arc::clone(&dashboard), &config(1));

        assert!(feed.start());
        assert!(feed.is_running());

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(dashboard.stats().total_detections, 0);

        tokio::time::sleep(Duration::from_millis(10_200)).await;
        assert_eq!(dashboard.stats().total_detections, 3);
        assert_eq!(backend.created.load(Ordering::SeqCst), 3);

        feed.stop();
        assert!(!feed.is_running());
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(dashboard.stats().total_detections, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn starting_twice_is_a_no_op() {
        let feed = SimulationFeed::new(Arc::new(FakeBackend::default()), dashboard(), &config(2));
        assert!(feed.start());
        assert!(!feed.start());
        feed.stop();
        assert!(feed.start());
    }

    #[tokio::test(start_paused = true)]
    async fn backend_error_stops_the_feed() {
        let dashboard = dashboard();
        let feed = SimulationFeed::new(Arc::new(FakeBackend::failing()), Arc::clone(&dashboard), &config(3));

        assert!(feed.start());
        tokio::time::sleep(Duration::from_millis(5100)).await;
        tokio::task::yield_now().await;

        assert!(!feed.is_running());
        assert_eq!(dashboard.stats().total_detections, 0);
    }
}
