//! ## dronewatch-engine::backend
//! **Live backend with a local fallback**
//!
//! Every read goes to the live backend first. When it fails (unreachable,
//! timeout, bad status, undecodable body) the answer comes from the local
//! dataset instead and is flagged `DataOrigin::Fallback`.

use std::sync::Arc;

use async_trait::async_trait;
use opentelemetry::KeyValue;
use serde::Serialize;
use tracing::warn;

use dronewatch_api::{ApiError, Backend, Page};
use dronewatch_core::{CreateDetection, DashboardStats, DetectionEvent, Manufacturer};
use dronewatch_simulator::LocalDataset;
use dronewatch_telemetry::{EventLogger, MetricsRecorder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DataOrigin {
    #[default]
    Live,
    Fallback,
}

/// A value tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub origin: DataOrigin,
    pub data: T,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            origin: DataOrigin::Live,
            data,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            origin: DataOrigin::Fallback,
            data,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == DataOrigin::Fallback
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            origin: self.origin,
            data: f(self.data),
        }
    }
}

pub struct FallbackBackend<B> {
    primary: B,
    fallback: LocalDataset,
    metrics: Option<Arc<MetricsRecorder>>,
}

impl<B: Backend> FallbackBackend<B> {
    pub fn new(primary: B, fallback: LocalDataset) -> Self {
        Self {
            primary,
            fallback,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn fetch_page(&self, page: usize, limit: usize) -> Sourced<Page<DetectionEvent>> {
        match self.primary.list_detections(page, limit).await {
            Ok(page) => Sourced::live(page),
            Err(e) => {
                self.fell_back("list_detections", &e).await;
                Sourced::fallback(self.fallback.page(page, limit))
            }
        }
    }

    pub async fn fetch_latest(&self) -> Sourced<Vec<DetectionEvent>> {
        match self.primary.latest_detections().await {
            Ok(latest) => Sourced::live(latest),
            Err(e) => {
                self.fell_back("latest_detections", &e).await;
                Sourced::fallback(self.fallback.latest())
            }
        }
    }

    /// Fails only when the local dataset refuses the payload too.
    pub async fn create(
        &self,
        payload: &CreateDetection,
    ) -> Result<Sourced<DetectionEvent>, ApiError> {
        match self.primary.create_detection(payload).await {
            Ok(event) => Ok(Sourced::live(event)),
            Err(e) => {
                self.fell_back("create_detection", &e).await;
                self.fallback
                    .create_detection(payload)
                    .await
                    .map(Sourced::fallback)
            }
        }
    }

    pub async fn fetch_manufacturers(&self) -> Sourced<Vec<Manufacturer>> {
        match self.primary.manufacturers().await {
            Ok(manufacturers) => Sourced::live(manufacturers),
            Err(e) => {
                self.fell_back("manufacturers", &e).await;
                Sourced::fallback(self.fallback.manufacturers())
            }
        }
    }

    pub async fn fetch_stats(&self) -> Sourced<DashboardStats> {
        match self.primary.stats().await {
            Ok(stats) => Sourced::live(stats),
            Err(e) => {
                self.fell_back("stats", &e).await;
                Sourced::fallback(self.fallback.stats())
            }
        }
    }

    async fn fell_back(&self, operation: &'static str, error: &ApiError) {
        warn!(operation, "Backend unavailable, using local data: {}", error);
        if let Some(metrics) = &self.metrics {
            metrics.fallback_responses.inc();
        }
        EventLogger::log_event(
            "backend_fallback",
            vec![
                KeyValue::new("operation", operation),
                KeyValue::new("error", error.to_string()),
            ],
        )
        .await;
    }
}

/// Plain `Backend` view; the origin tag is dropped.
#[async_trait]
impl<B: Backend> Backend for FallbackBackend<B> {
    async fn list_detections(
        &self,
        page: usize,
        limit: usize,
    ) -> Result<Page<DetectionEvent>, ApiError> {
        Ok(self.fetch_page(page, limit).await.data)
    }

    async fn latest_detections(&self) -> Result<Vec<DetectionEvent>, ApiError> {
        Ok(self.fetch_latest().await.data)
    }

    async fn create_detection(
        &self,
        payload: &CreateDetection,
    ) -> Result<DetectionEvent, ApiError> {
        self.create(payload).await.map(|sourced| sourced.data)
    }

    async fn manufacturers(&self) -> Result<Vec<Manufacturer>, ApiError> {
        Ok(self.fetch_manufacturers().await.data)
    }

    async fn stats(&self) -> Result<DashboardStats, ApiError> {
        Ok(self.fetch_stats().await.data)
    }
}
