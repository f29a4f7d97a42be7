//! ## dronewatch-telemetry::logging
//! **Structured logging with tracing and OpenTelemetry key/values**
//!
//! `EventLogger::init` installs the global `fmt` subscriber once; domain
//! events (block alerts, fallbacks, server lifecycle) go through
//! `EventLogger::log_event` so they share one span name and field layout.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
    /// Calling it again is a no-op.
    pub fn init(default_level: &str) {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE)
            .try_init();
    }

    #[inline]
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "dronewatch_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(
                metadata = ?metadata,
                "Dashboard event occurred"
            );
        }
        .instrument(span)
        .await
    }
}
