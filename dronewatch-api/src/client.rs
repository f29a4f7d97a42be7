//! ## dronewatch-api::client
//! **Backend access for the dashboard**
//!
//! `Backend` is the seam between the dashboard runtime and wherever
//! detections come from. `HttpBackend` talks to the mock server over plain
//! HTTP/1.1; the engine wraps it with a local-dataset fallback.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::debug;

use dronewatch_config::DashboardConfig;
use dronewatch_core::{CreateDetection, DashboardStats, DetectionEvent, Manufacturer};

use crate::error::ApiError;
use crate::http::{self, Response};
use crate::schema::{Deleted, ErrorBody, Page};

/// Responses larger than this are refused.
const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_detections(
        &self,
        page: usize,
        limit: usize,
    ) -> Result<Page<DetectionEvent>, ApiError>;

    async fn latest_detections(&self) -> Result<Vec<DetectionEvent>, ApiError>;

    async fn create_detection(&self, payload: &CreateDetection)
        -> Result<DetectionEvent, ApiError>;

    async fn manufacturers(&self) -> Result<Vec<Manufacturer>, ApiError>;

    async fn stats(&self) -> Result<DashboardStats, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    endpoint: String,
    timeout: Duration,
}

impl HttpBackend {
    /// `endpoint` is `host:port`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.api_url.clone(), config.request_timeout())
    }

    pub async fn delete_detection(&self, id: u64) -> Result<Deleted, ApiError> {
        self.call("DELETE", &format!("/api/v1/detections/{}", id), Vec::new())
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        target: &str,
        body: Vec<u8>,
    ) -> Result<T, ApiError> {
        let response = tokio::time::timeout(self.timeout, self.exchange(method, target, &body))
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))??;
        debug!(method, target, status = response.status, "Backend responded");

        if !response.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&response.body)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).into_owned());
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }
        serde_json::from_slice(&response.body).map_err(ApiError::Decode)
    }

    async fn exchange(&self, method: &str, target: &str, body: &[u8]) -> Result<Response, ApiError> {
        let stream = TcpStream::connect(&self.endpoint).await?;
        let (read_half, mut write_half) = stream.into_split();

        http::write_request(&mut write_half, method, &self.endpoint, target, body).await?;
        let mut reader = BufReader::new(read_half);
        Ok(http::read_response(&mut reader, MAX_RESPONSE_BYTES).await?)
    }
}

fn encode_body<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(value).map_err(ApiError::Encode)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_detections(
        &self,
        page: usize,
        limit: usize,
    ) -> Result<Page<DetectionEvent>, ApiError> {
        let target = format!("/api/v1/detections?page={}&limit={}", page, limit);
        self.call("GET", &target, Vec::new()).await
    }

    async fn latest_detections(&self) -> Result<Vec<DetectionEvent>, ApiError> {
        self.call("GET", "/api/v1/detections/latest", Vec::new())
            .await
    }

    async fn create_detection(
        &self,
        payload: &CreateDetection,
    ) -> Result<DetectionEvent, ApiError> {
        let body = encode_body(payload)?;
        self.call("POST", "/api/v1/detections", body).await
    }

    async fn manufacturers(&self) -> Result<Vec<Manufacturer>, ApiError> {
        self.call("GET", "/api/v1/manufacturers", Vec::new()).await
    }

    async fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.call("GET", "/api/v1/stats", Vec::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn unreachable_backend_is_an_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let backend = HttpBackend::new(address.to_string(), Duration::from_secs(1));
        let err = backend.stats().await.unwrap_err();
        assert!(matches!(err, ApiError::Io(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn silent_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let _held = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let backend = HttpBackend::new(address.to_string(), Duration::from_millis(100));
        let err = backend.latest_detections().await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn error_bodies_become_status_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let body = br#"{"error":"Detection not found"}"#;
            let head = format!(
                "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
        });

        let backend = HttpBackend::new(address.to_string(), Duration::from_secs(1));
        match backend.delete_detection(42).await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Detection not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
                .await
                .unwrap();
        });

        let backend = HttpBackend::new(address.to_string(), Duration::from_secs(1));
        let err = backend.manufacturers().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "{:?}", err);
    }

    #[test]
    fn unencodable_body_is_an_encode_error() {
        let mut keyed = std::collections::HashMap::new();
        keyed.insert((1u8, 2u8), "non-string key");

        let err = encode_body(&keyed).unwrap_err();
        assert!(matches!(err, ApiError::Encode(_)), "{:?}", err);
        assert!(err.to_string().starts_with("could not encode request body"));
    }
}
