//! # Metrics Collection Module
//!
//! Prometheus export for the analysis pipeline (`GET /metrics`).
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `kabu_requests_total{category, status}` - Completed analysis requests
//! - `kabu_upstream_attempts_total{outcome}` - Upstream calls by resulting state
//! - `kabu_upstream_retries_total` - Backoff sleeps taken
//!
//! **Histograms:**
//! - `kabu_request_duration_seconds{category}` - End-to-end request duration

pub mod handler;

// Re-export PrometheusBuilder for test compatibility
pub use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::AttemptState;
use std::time::{Duration, Instant};

/// Holds the Prometheus handle and process start time.
pub struct MetricsCollector {
    /// Gateway startup time for uptime calculation
    start_time: Instant,
    /// Prometheus handle for rendering metrics
    prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        start_time: Instant,
        prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        Self {
            start_time,
            prometheus_handle,
        }
    }

    /// Install the global recorder, or fall back to a detached one when a
    /// recorder is already installed (tests build many app states).
    pub fn install(start_time: Instant) -> Self {
        let handle = setup_metrics().unwrap_or_else(|e| {
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            PrometheusBuilder::new().build_recorder().handle()
        });
        Self::new(start_time, handle)
    }

    /// Get uptime in seconds since gateway startup.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Initialize Prometheus metrics exporter with custom histogram buckets.
///
/// Buckets cover fast failures up to a fully backed-off request:
/// [0.1, 0.25, 0.5, 1, 2.5, 5, 10, 20, 30, 60, 120] seconds.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::Matcher;

    let duration_buckets = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("kabu_request_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Record a finished analysis request.
pub fn record_request(category: &'static str, status: u16, duration: Duration) {
    metrics::counter!("kabu_requests_total",
        "category" => category,
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!("kabu_request_duration_seconds", "category" => category)
        .record(duration.as_secs_f64());
}

/// Record the state an upstream attempt led to.
pub fn record_attempt(state: &AttemptState) {
    let outcome = match state {
        AttemptState::Success(_) => "success",
        AttemptState::Retryable { .. } => "retryable",
        AttemptState::Terminal(_) => "terminal",
        AttemptState::Attempting { .. } => return,
    };
    metrics::counter!("kabu_upstream_attempts_total", "outcome" => outcome).increment(1);
    if outcome == "retryable" {
        metrics::counter!("kabu_upstream_retries_total").increment(1);
    }
}
