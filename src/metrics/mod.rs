//! Prometheus metrics for the outreach service
//!
//! This module provides metrics tracking for:
//! - API: requests per endpoint and status, request duration
//! - Delivery: dispatches, attempts per outcome, failed status reports,
//!   applied status updates
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails (or never happens), metric operations are no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for HTTP API metrics
struct ApiMetrics {
    requests: CounterVec,
    duration: HistogramVec,
}

/// Container for fan-out delivery metrics
struct DeliveryMetrics {
    dispatches: CounterVec,
    attempts: CounterVec,
    report_failures: Counter,
    status_updates: CounterVec,
    dispatch_duration: HistogramVec,
}

static API_METRICS: OnceLock<ApiMetrics> = OnceLock::new();

static DELIVERY_METRICS: OnceLock<DeliveryMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let api = ApiMetrics {
        requests: register_counter_vec!(
            "outreach_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        duration: register_histogram_vec!(
            "outreach_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
        )?,
    };

    let delivery = DeliveryMetrics {
        dispatches: register_counter_vec!(
            "outreach_dispatches_total",
            "Fan-out dispatches by result",
            &["result"]
        )?,
        attempts: register_counter_vec!(
            "outreach_delivery_attempts_total",
            "Delivery attempts by outcome",
            &["outcome"]
        )?,
        report_failures: register_counter!(
            "outreach_status_report_failures_total",
            "Delivery outcomes that could not be reported (record left pending)"
        )?,
        status_updates: register_counter_vec!(
            "outreach_status_updates_total",
            "Applied delivery status updates by new status",
            &["status"]
        )?,
        dispatch_duration: register_histogram_vec!(
            "outreach_dispatch_duration_seconds",
            "Time to fan out one communication batch",
            &["reporter"],
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        )?,
    };

    API_METRICS.set(api).map_err(|_| "API metrics already initialized")?;
    DELIVERY_METRICS
        .set(delivery)
        .map_err(|_| "Delivery metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = API_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.requests.with_label_values(&[endpoint, &status_str]).inc();
    m.duration.with_label_values(&[endpoint]).observe(duration_secs);
}

/// Record the end of a dispatch ("completed" or "aborted")
pub fn record_dispatch(result: &str) {
    if let Some(m) = DELIVERY_METRICS.get() {
        m.dispatches.with_label_values(&[result]).inc();
    }
}

/// Record one delivery attempt
pub fn record_delivery_attempt(outcome: &str) {
    if let Some(m) = DELIVERY_METRICS.get() {
        m.attempts.with_label_values(&[outcome]).inc();
    }
}

/// Record an outcome that could not be reported
pub fn record_report_failure() {
    if let Some(m) = DELIVERY_METRICS.get() {
        m.report_failures.inc();
    }
}

/// Record an applied status update
pub fn record_status_update(status: &str) {
    if let Some(m) = DELIVERY_METRICS.get() {
        m.status_updates.with_label_values(&[status]).inc();
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a dispatch timer
pub fn start_dispatch_timer(reporter: &str) -> MetricsTimer {
    match DELIVERY_METRICS.get() {
        Some(m) => MetricsTimer::new(
            m.dispatch_duration
                .with_label_values(&[reporter])
                .start_timer(),
        ),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
