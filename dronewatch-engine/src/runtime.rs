// dronewatch-engine/src/runtime.rs

/*!
# Runtime Entry Points

Wires configuration, telemetry and the engine components together for the
three things a frontend can do: run the mock backend, run the dashboard
(optionally with the simulation feed), or submit one detection.

A running dashboard takes `OperatorCommand`s from the frontend: manual
detections, clearing the window, toggling the simulation feed and reloading
the listing all act on the same registry the feed and the backend fill.
*/

use std::future::Future;
use std::sync::Arc;

use opentelemetry::KeyValue;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use dronewatch_api::{ApiServer, Backend, HttpBackend};
use dronewatch_config::DronewatchConfig;
use dronewatch_core::DetectionEvent;
use dronewatch_simulator::LocalDataset;
use dronewatch_telemetry::{EventLogger, MetricsRecorder};

use crate::engine::{
    submit_manual, Dashboard, DashboardSnapshot, EngineError, FallbackBackend, ManualEntry,
    OperatorCommand, SimulationFeed,
};

type DashboardBackend = FallbackBackend<HttpBackend>;

fn metrics_recorder(config: &DronewatchConfig) -> Result<Option<Arc<MetricsRecorder>>, EngineError> {
    if !config.telemetry.metrics {
        return Ok(None);
    }
    MetricsRecorder::new()
        .map(|m| Some(Arc::new(m)))
        .map_err(|e| EngineError::Telemetry(e.to_string()))
}

/// Runs the mock backend until `shutdown` resolves.
#[instrument(level = "info", name = "run_server", skip_all)]
pub async fn run_server<F>(config: &DronewatchConfig, shutdown: F) -> Result<(), EngineError>
where
    F: Future<Output = ()>,
{
    let metrics = metrics_recorder(config)?;
    let server = ApiServer::from_config(&config.server, metrics).await?;
    let address = server.local_addr()?;

    EventLogger::log_event(
        "server_started",
        vec![KeyValue::new("address", address.to_string())],
    )
    .await;

    server.serve(shutdown).await?;
    Ok(())
}

/// Loads the initial listing, optionally starts the simulation feed, applies
/// operator `commands` and calls `render` for every published snapshot until
/// `shutdown` resolves. A closed command channel leaves the dashboard
/// running.
#[instrument(level = "info", name = "run_dashboard", skip_all, fields(simulate = simulate))]
pub async fn run_dashboard<F, R>(
    config: &DronewatchConfig,
    simulate: bool,
    mut commands: mpsc::Receiver<OperatorCommand>,
    shutdown: F,
    mut render: R,
) -> Result<(), EngineError>
where
    F: Future<Output = ()>,
    R: FnMut(&DashboardSnapshot),
{
    let metrics = metrics_recorder(config)?;

    let mut backend = FallbackBackend::new(
        HttpBackend::from_config(&config.dashboard),
        LocalDataset::default(),
    );
    if let Some(metrics) = &metrics {
        backend = backend.with_metrics(Arc::clone(metrics));
    }
    let backend = Arc::new(backend);
    let dashboard = Arc::new(Dashboard::new(&config.dashboard, metrics));

    let listing = backend.fetch_page(1, config.dashboard.page_size).await;
    dashboard.load(listing.map(|page| page.data));

    let manufacturers = backend.fetch_manufacturers().await;
    info!(
        known = manufacturers.data.len(),
        origin = ?manufacturers.origin,
        "Manufacturer table loaded"
    );

    let feed = SimulationFeed::new(Arc::clone(&backend), Arc::clone(&dashboard), &config.simulation);
    if simulate {
        feed.start();
    }

    let mut snapshots = dashboard.subscribe();
    let initial = snapshots.borrow_and_update().clone();
    render(&initial);

    let page_size = config.dashboard.page_size;
    let mut accepting = true;
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                render(&snapshot);
            }
            command = commands.recv(), if accepting => match command {
                Some(command) => execute(command, &backend, &dashboard, &feed, page_size).await,
                None => accepting = false,
            },
        }
    }

    feed.stop();
    info!("Dashboard stopped");
    Ok(())
}

async fn execute(
    command: OperatorCommand,
    backend: &DashboardBackend,
    dashboard: &Dashboard,
    feed: &SimulationFeed<DashboardBackend>,
    page_size: usize,
) {
    match command {
        OperatorCommand::Add(entry) => match submit_manual(backend, dashboard, entry).await {
            Ok(outcome) => info!(blocked = outcome.was_blocked, "Manual detection added"),
            Err(e) => warn!("Manual detection rejected: {}", e),
        },
        OperatorCommand::Clear => {
            dashboard.clear();
            info!("Detections cleared");
        }
        OperatorCommand::Simulate(true) => {
            feed.start();
        }
        OperatorCommand::Simulate(false) => feed.stop(),
        OperatorCommand::Reload => {
            let listing = backend.fetch_page(1, page_size).await;
            dashboard.load(listing.map(|page| page.data));
        }
    }
}

/// Validates and submits one detection to the configured backend, without
/// falling back.
#[instrument(level = "info", name = "submit_detection", skip_all)]
pub async fn submit_detection(
    config: &DronewatchConfig,
    entry: ManualEntry,
) -> Result<DetectionEvent, EngineError> {
    let payload = entry.into_payload()?;
    let backend = HttpBackend::from_config(&config.dashboard);
    let event = backend.create_detection(&payload).await?;

    EventLogger::log_event(
        "detection_submitted",
        vec![
            KeyValue::new("id", event.id.to_string()),
            KeyValue::new("mac", event.mac_address.to_string()),
        ],
    )
    .await;
    Ok(event)
}
