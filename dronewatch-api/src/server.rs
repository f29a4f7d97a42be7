//! TCP accept loop for the mock backend.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

use dronewatch_config::ServerConfig;
use dronewatch_telemetry::MetricsRecorder;

use crate::error::{ApiError, HttpError};
use crate::http::{self, Response};
use crate::routes::{with_cors, Router};
use crate::store::MockStore;

/// How long a client gets to send its request unless configured otherwise.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ApiServer {
    listener: TcpListener,
    router: Router,
    max_body: usize,
    read_timeout: Duration,
}

impl ApiServer {
    pub async fn bind(address: &str, router: Router, max_body: usize) -> Result<Self, ApiError> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            router,
            max_body,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Binds the configured address with a seeded store.
    pub async fn from_config(
        config: &ServerConfig,
        metrics: Option<Arc<MetricsRecorder>>,
    ) -> Result<Self, ApiError> {
        let mut router = Router::new(
            MockStore::seeded(config.latest_count),
            config.default_page_limit,
        );
        if let Some(metrics) = metrics {
            router = router.with_metrics(metrics);
        }
        Ok(Self::bind(&config.listen_address(), router, config.max_body_bytes)
            .await?
            .with_read_timeout(config.read_timeout()))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ApiError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves connections until `shutdown` resolves. Connections already
    /// accepted finish on their own tasks.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()>,
    {
        let address = self.local_addr()?;
        info!(%address, "Mock backend listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Mock backend shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let router = self.router.clone();
                        let max_body = self.max_body;
                        let read_timeout = self.read_timeout;
                        tokio::spawn(
                            handle_connection(stream, router, max_body, read_timeout)
                                .instrument(info_span!("connection", %peer)),
                        );
                    }
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    router: Router,
    max_body: usize,
    read_timeout: Duration,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let read = timeout(read_timeout, http::read_request(&mut reader, max_body)).await;
    let response = match read {
        Ok(Ok(Some(request))) => router.handle(&request),
        Ok(Ok(None)) => return,
        Ok(Err(HttpError::BodyTooLarge(limit))) => {
            debug!(limit, "Request body too large");
            with_cors(Response::error(413, "Payload Too Large"))
        }
        Ok(Err(e)) => {
            debug!("Malformed request: {}", e);
            with_cors(Response::error(400, "Bad Request"))
        }
        Err(_) => {
            debug!(timeout_ms = read_timeout.as_millis() as u64, "Request not received in time");
            with_cors(Response::error(408, "Request Timeout"))
        }
    };

    if let Err(e) = http::write_response(&mut write_half, &response).await {
        debug!("Failed to write response: {}", e);
    }
}
