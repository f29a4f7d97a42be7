use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use dronewatch_core::CreateDetection;
use dronewatch_telemetry::MetricsRecorder;

use crate::error::StoreError;
use crate::http::{Request, Response};
use crate::schema::{Deleted, PageRequest};
use crate::store::MockStore;

const DETECTIONS: &str = "/api/v1/detections";

/// Maps parsed requests onto the store. Cheap to clone, clones share state.
#[derive(Clone)]
pub struct Router {
    store: Arc<Mutex<MockStore>>,
    metrics: Option<Arc<MetricsRecorder>>,
    default_limit: usize,
}

impl Router {
    pub fn new(store: MockStore, default_limit: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            metrics: None,
            default_limit: default_limit.max(1),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn handle(&self, request: &Request) -> Response {
        let started = Instant::now();
        let response = with_cors(self.route(request));

        if let Some(metrics) = &self.metrics {
            metrics.record_request(
                &request.method,
                response.status,
                started.elapsed().as_secs_f64(),
            );
        }
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "Handled request"
        );
        response
    }

    fn route(&self, request: &Request) -> Response {
        let path = request.path.trim_end_matches('/');

        match (request.method.as_str(), path) {
            ("OPTIONS", _) => Response::empty(200),
            ("GET", "/api/v1/manufacturers") => {
                Response::json(200, &self.store.lock().manufacturers())
            }
            ("GET", DETECTIONS) => {
                let page = PageRequest::from_query(&request.query, self.default_limit);
                Response::json(200, &self.store.lock().list(page))
            }
            ("GET", "/api/v1/detections/latest") => {
                Response::json(200, &self.store.lock().latest())
            }
            ("GET", "/api/v1/stats") => Response::json(200, &self.store.lock().stats()),
            ("POST", DETECTIONS) => self.create(request),
            ("GET", "/metrics") => self.metrics(),
            ("DELETE", p) => match detection_id(p) {
                Some(id) => self.delete(id),
                None => not_found(),
            },
            _ => not_found(),
        }
    }

    fn create(&self, request: &Request) -> Response {
        let payload: CreateDetection = match serde_json::from_slice(&request.body) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Rejected detection body: {}", e);
                return Response::error(400, "Invalid JSON");
            }
        };

        let created = self.store.lock().create(payload, Utc::now());
        match created {
            Ok(event) => Response::json(201, &event),
            Err(e) => {
                warn!("Rejected detection: {}", e);
                Response::error(400, e.to_string())
            }
        }
    }

    fn delete(&self, id: u64) -> Response {
        let deleted = self.store.lock().delete(id);
        match deleted {
            Ok(event) => Response::json(
                200,
                &Deleted {
                    status: 200,
                    message: "Detection deleted successfully".into(),
                    deleted: event,
                },
            ),
            Err(e @ StoreError::NotFound(_)) => Response::error(404, e.to_string()),
            Err(e) => Response::error(400, e.to_string()),
        }
    }

    fn metrics(&self) -> Response {
        let Some(metrics) = &self.metrics else {
            return not_found();
        };
        match metrics.gather_metrics() {
            Ok(text) => Response::empty(200)
                .with_header("Content-Type", "text/plain; version=0.0.4")
                .with_body(text),
            Err(e) => {
                warn!("Failed to encode metrics: {}", e);
                Response::error(500, "Internal Server Error")
            }
        }
    }
}

fn detection_id(path: &str) -> Option<u64> {
    path.strip_prefix(DETECTIONS)?
        .strip_prefix('/')?
        .parse()
        .ok()
}

fn not_found() -> Response {
    Response::error(404, "Not Found")
}

/// Adds the CORS headers and a JSON content type unless one is set.
pub(crate) fn with_cors(response: Response) -> Response {
    let response = if response.header("Content-Type").is_none() {
        response.with_header("Content-Type", "application/json")
    } else {
        response
    };
    response
        .with_header("Access-Control-Allow-Origin", "*")
        .with_header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        )
        .with_header("Access-Control-Allow-Headers", "Content-Type, Accept")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dronewatch_core::DetectionEvent;
    use serde_json::Value;

    use crate::schema::{ErrorBody, Page};

    fn router() -> Router {
        Router::new(MockStore::seeded(5), 10)
    }

    fn body<T: serde::de::DeserializeOwned>(response: &Response) -> T {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn every_response_carries_cors_headers() {
        let router = router();
        for request in [
            Request::new("OPTIONS", "/api/v1/detections"),
            Request::new("GET", "/api/v1/stats"),
            Request::new("GET", "/nope"),
        ] {
            let response = router.handle(&request);
            assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
            assert_eq!(
                response.header("Access-Control-Allow-Headers"),
                Some("Content-Type, Accept")
            );
            assert_eq!(response.header("Content-Type"), Some("application/json"));
        }
    }

    #[test]
    fn preflight_is_empty_ok() {
        let response = router().handle(&Request::new("OPTIONS", "/anything"));
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[test]
    fn lists_detections_with_paging() {
        let response = router().handle(&Request::new("GET", "/api/v1/detections?page=1&limit=2"));
        assert_eq!(response.status, 200);

        let page: Page<DetectionEvent> = body(&response);
        assert_eq!(page.total, 3);
        assert_eq!(page.limit, 2);
        assert_eq!(page.pages, 2);
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn wire_fields_use_snake_case() {
        let response = router().handle(&Request::new("GET", "/api/v1/detections/latest"));
        let latest: Value = body(&response);
        let first = &latest[0];
        assert_eq!(first["mac_address"], "60:60:1F:AA:BB:CC");
        assert_eq!(first["manufacturer_id"], 1);
        assert_eq!(first["sensor_location"], "Building A - Floor 3");
        assert!(first.get("detected_at").is_some());
    }

    #[test]
    fn creates_detection() {
        let router = router();
        let request = Request::new("POST", "/api/v1/detections").with_body(
            r#"{"mac":"60:60:1F:12:34:56","rssi":-48,"sensor_location":"Gate","timestamp":"2024-12-04T11:00:00Z"}"#,
        );
        let response = router.handle(&request);
        assert_eq!(response.status, 201);

        let created: DetectionEvent = body(&response);
        assert_eq!(created.id, 4);
        assert_eq!(created.manufacturer_id, Some(1));
        let listing: Page<DetectionEvent> =
            body(&router.handle(&Request::new("GET", "/api/v1/detections")));
        assert_eq!(listing.total, 4);
    }

    #[test]
    fn malformed_body_is_invalid_json() {
        let request = Request::new("POST", "/api/v1/detections").with_body("{not json");
        let response = router().handle(&request);
        assert_eq!(response.status, 400);
        assert_eq!(body::<ErrorBody>(&response).error, "Invalid JSON");
    }

    #[test]
    fn validation_failures_are_reported() {
        let request = Request::new("POST", "/api/v1/detections").with_body(
            r#"{"mac":"nope","rssi":-48,"sensor_location":"Gate","timestamp":"2024-12-04T11:00:00Z"}"#,
        );
        let response = router().handle(&request);
        assert_eq!(response.status, 400);
        assert!(body::<ErrorBody>(&response)
            .error
            .contains("Invalid MAC address format"));
    }

    #[test]
    fn deletes_detection() {
        let router = router();
        let response = router.handle(&Request::new("DELETE", "/api/v1/detections/2"));
        assert_eq!(response.status, 200);

        let deleted: Deleted = body(&response);
        assert_eq!(deleted.deleted.id, 2);
        assert_eq!(deleted.message, "Detection deleted successfully");

        let again = router.handle(&Request::new("DELETE", "/api/v1/detections/2"));
        assert_eq!(again.status, 404);
        assert_eq!(body::<ErrorBody>(&again).error, "Detection not found");
    }

    #[test]
    fn unknown_routes_are_not_found() {
        let router = router();
        for request in [
            Request::new("GET", "/api/v2/detections"),
            Request::new("DELETE", "/api/v1/detections/abc"),
            Request::new("PUT", "/api/v1/detections/1"),
            Request::new("GET", "/metrics"),
        ] {
            let response = router.handle(&request);
            assert_eq!(response.status, 404, "{} {}", request.method, request.path);
            assert_eq!(body::<ErrorBody>(&response).error, "Not Found");
        }
    }

    #[test]
    fn exports_metrics_when_enabled() {
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        let router = router().with_metrics(Arc::clone(&metrics));
        router.handle(&Request::new("GET", "/api/v1/stats"));

        let response = router.handle(&Request::new("GET", "/metrics"));
        assert_eq!(response.status, 200);
        let text = String::from_utf8(response.body).unwrap();
        assert!(text.contains("dronewatch_api_requests_total{method=\"GET\",status=\"200\"} 1"));
    }
}
