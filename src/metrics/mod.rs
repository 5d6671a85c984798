//! Prometheus metrics for the inventory service
//!
//! This module tracks:
//! - Ledger: mutations by outcome, capacity rejections, store latency
//! - Broadcasts: delivery outcomes, connected WebSocket dashboards
//! - HTTP API: request counts and durations
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for ledger and broadcast metrics
struct LedgerMetrics {
    mutations: CounterVec,
    capacity_rejections: CounterVec,
    store_duration: HistogramVec,
    broadcasts: CounterVec,
    ws_clients: Gauge,
}

/// Container for HTTP API metrics
struct ApiMetrics {
    requests: CounterVec,
    duration: HistogramVec,
}

static LEDGER_METRICS: OnceLock<LedgerMetrics> = OnceLock::new();

static API_METRICS: OnceLock<ApiMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Call once at startup. Repeated calls are no-ops. When registration
/// fails the error is returned and recording functions do nothing.
///
/// ```ignore
/// if let Err(e) = medstock::metrics::init_metrics() {
///     tracing::warn!(error = %e, "Metrics disabled");
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let ledger = LedgerMetrics {
        mutations: register_counter_vec!(
            "medstock_ledger_mutations_total",
            "Inventory mutations by operation and outcome",
            &["operation", "outcome"]
        )?,
        capacity_rejections: register_counter_vec!(
            "medstock_ledger_capacity_rejections_total",
            "Mutations rejected by a capacity limit",
            &["kind", "location"]
        )?,
        store_duration: register_histogram_vec!(
            "medstock_store_operation_duration_seconds",
            "Store call duration in seconds",
            &["operation"],
            vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]
        )?,
        broadcasts: register_counter_vec!(
            "medstock_broadcasts_total",
            "Ventilator update broadcasts by outcome",
            &["outcome"]
        )?,
        ws_clients: register_gauge!(
            "medstock_ws_clients",
            "Dashboards connected to the WebSocket stream"
        )?,
    };

    let api = ApiMetrics {
        requests: register_counter_vec!(
            "medstock_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        duration: register_histogram_vec!(
            "medstock_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
        )?,
    };

    LEDGER_METRICS
        .set(ledger)
        .map_err(|_| "Ledger metrics already initialized")?;
    API_METRICS
        .set(api)
        .map_err(|_| "API metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    LEDGER_METRICS.get().is_some() && API_METRICS.get().is_some()
}

// ============================================================================
// Recording
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record the outcome of a create/update/remove
pub fn record_mutation(operation: &str, outcome: &str) {
    if let Some(m) = LEDGER_METRICS.get() {
        m.mutations.with_label_values(&[operation, outcome]).inc();
    }
}

/// Record a capacity rejection
pub fn record_capacity_rejection(kind: &str, location: &str) {
    if let Some(m) = LEDGER_METRICS.get() {
        m.capacity_rejections
            .with_label_values(&[kind, location])
            .inc();
    }
}

/// Record a broadcast outcome (`sent`, `failed`, `timeout`)
pub fn record_broadcast(outcome: &str) {
    if let Some(m) = LEDGER_METRICS.get() {
        m.broadcasts.with_label_values(&[outcome]).inc();
    }
}

/// Adjust the connected dashboard gauge
pub fn ws_client_connected(connected: bool) {
    if let Some(m) = LEDGER_METRICS.get() {
        if connected {
            m.ws_clients.inc();
        } else {
            m.ws_clients.dec();
        }
    }
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = API_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.requests.with_label_values(&[endpoint, &status_str]).inc();
    m.duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
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

/// Start a store call timer
pub fn start_store_timer(operation: &str) -> MetricsTimer {
    match LEDGER_METRICS.get() {
        Some(m) => MetricsTimer::new(
            m.store_duration
                .with_label_values(&[operation])
                .start_timer(),
        ),
        None => MetricsTimer::noop(),
    }
}
