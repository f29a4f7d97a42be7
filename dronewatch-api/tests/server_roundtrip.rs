use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

use dronewatch_api::{ApiError, ApiServer, Backend, HttpBackend, MockStore, Router};
use dronewatch_core::CreateDetection;
use dronewatch_telemetry::MetricsRecorder;

struct Running {
    backend: HttpBackend,
    shutdown: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<Result<(), ApiError>>,
}

async fn start_server() -> Running {
    let metrics = Arc::new(MetricsRecorder::new().unwrap());
    let router = Router::new(MockStore::seeded(5), 10).with_metrics(metrics);
    let server = ApiServer::bind("127.0.0.1:0", router, 64 * 1024)
        .await
        .unwrap();
    let address = server.local_addr().unwrap();

    let (shutdown, signal) = oneshot::channel::<()>();
    let task = tokio::spawn(server.serve(async {
        let _ = signal.await;
    }));

    Running {
        backend: HttpBackend::new(address.to_string(), Duration::from_secs(2)),
        shutdown,
        task,
    }
}

#[tokio::test]
async fn dashboard_flow_against_live_server() {
    let running = start_server().await;
    let backend = &running.backend;

    let manufacturers = backend.manufacturers().await.unwrap();
    assert_eq!(manufacturers.len(), 2);
    assert_eq!(manufacturers[0].oui, "60:60:1F");

    let page = backend.list_detections(1, 10).await.unwrap();
    assert_eq!(page.status, 200);
    assert_eq!(page.total, 3);
    assert_eq!(page.pages, 1);

    let payload = CreateDetection::new(
        "60:60:1f:aa:bb:cc",
        -42,
        "Hangar 2 - Perimeter",
        Utc.with_ymd_and_hms(2024, 12, 4, 11, 0, 0).unwrap(),
    );
    let created = backend.create_detection(&payload).await.unwrap();
    assert_eq!(created.id, 4);
    assert_eq!(created.mac_address.as_str(), "60:60:1F:AA:BB:CC");
    assert_eq!(
        created.manufacturer_name.as_deref(),
        Some("DJI Technology Co., Ltd.")
    );

    let latest = backend.latest_detections().await.unwrap();
    assert_eq!(latest.last().map(|d| d.id), Some(4));

    let stats = backend.stats().await.unwrap();
    assert_eq!(stats.total_detections, 4);
    assert_eq!(stats.blocked_drones, 1);

    let deleted = backend.delete_detection(4).await.unwrap();
    assert_eq!(deleted.deleted.id, 4);
    assert_eq!(backend.stats().await.unwrap().total_detections, 3);

    running.shutdown.send(()).unwrap();
    running.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn validation_errors_surface_as_status() {
    let running = start_server().await;

    let payload = CreateDetection::new(
        "60:60:1F:AA:BB",
        -42,
        "  ",
        Utc.with_ymd_and_hms(2024, 12, 4, 11, 0, 0).unwrap(),
    );
    match running.backend.create_detection(&payload).await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("Invalid MAC address format"));
            assert!(message.contains("Location is required"));
        }
        other => panic!("unexpected result: {:?}", other),
    }

    match running.backend.delete_detection(999).await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Detection not found");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    running.shutdown.send(()).unwrap();
    running.task.await.unwrap().unwrap();
}
