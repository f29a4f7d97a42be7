//! ## dronewatch-telemetry::metrics
//! **Prometheus counters and histograms**
//!
//! One registry per process, exported in text format by the mock backend on
//! `GET /metrics`.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub detections_ingested: IntCounter,
    pub repeat_sightings: IntCounter,
    pub api_requests: IntCounterVec,
    pub fallback_responses: IntCounter,
    pub request_latency: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let detections_ingested = IntCounter::new(
            "dronewatch_detections_ingested_total",
            "Detection events applied to the registry",
        )?;
        let repeat_sightings = IntCounter::new(
            "dronewatch_repeat_sightings_total",
            "Ingested events whose MAC was already in the window",
        )?;
        let api_requests = IntCounterVec::new(
            Opts::new("dronewatch_api_requests_total", "Requests served by the mock backend"),
            &["method", "status"],
        )?;
        let fallback_responses = IntCounter::new(
            "dronewatch_fallback_responses_total",
            "Backend calls answered from the local dataset",
        )?;
        let request_latency = Histogram::with_opts(
            HistogramOpts::new(
                "dronewatch_request_latency_seconds",
                "Mock backend request handling time",
            )
            .buckets(vec![0.000_1, 0.001, 0.01, 0.1, 1.0]),
        )?;

        registry.register(Box::new(detections_ingested.clone()))?;
        registry.register(Box::new(repeat_sightings.clone()))?;
        registry.register(Box::new(api_requests.clone()))?;
        registry.register(Box::new(fallback_responses.clone()))?;
        registry.register(Box::new(request_latency.clone()))?;

        Ok(Self {
            registry,
            detections_ingested,
            repeat_sightings,
            api_requests,
            fallback_responses,
            request_latency,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn record_ingest(&self, was_repeat: bool) {
        self.detections_ingested.inc();
        if was_repeat {
            self.repeat_sightings.inc();
        }
    }

    pub fn record_request(&self, method: &str, status: u16, seconds: f64) {
        self.api_requests
            .with_label_values(&[method, &status.to_string()])
            .inc();
        self.request_latency.observe(seconds);
    }
}
