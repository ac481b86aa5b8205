//! Prometheus metrics collection for spaceship-ddns
//!
//! This module provides metrics collection for monitoring reconciliation passes.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Gauge,
    HistogramVec,
};

//==============================================================================
// Metrics
//==============================================================================

lazy_static! {
    /// Per-record outcomes (created, updated, unchanged, skipped, failed)
    pub static ref RECORD_ACTIONS_TOTAL: CounterVec = register_counter_vec!(
        "spaceship_ddns_record_actions_total",
        "Number of per-record reconciliation outcomes",
        &["action"]
    )
    .unwrap();

    /// Completed passes by outcome (success or an error kind)
    pub static ref PASSES_TOTAL: CounterVec = register_counter_vec!(
        "spaceship_ddns_passes_total",
        "Number of reconciliation passes by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Unix timestamp of the last fully successful pass
    pub static ref LAST_SUCCESS_TIMESTAMP: Gauge = register_gauge!(
        "spaceship_ddns_last_success_timestamp_seconds",
        "Unix timestamp of the last successful reconciliation pass"
    )
    .unwrap();

    /// Registrar request duration histogram
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "spaceship_ddns_api_request_duration_seconds",
        "Registrar API request duration in seconds",
        &["operation"]
    )
    .unwrap();
}

//==============================================================================
// Public Functions
//==============================================================================

/// Records a per-record outcome
///
/// # Arguments
///
/// * `action` - Outcome label (e.g., "created", "updated")
pub fn record_action(action: &str) {
    RECORD_ACTIONS_TOTAL.with_label_values(&[action]).inc();
}

/// Records a finished pass
///
/// `outcome` is `success` or the [`crate::error::DdnsError::kind`] of the failure.
pub fn record_pass(outcome: &str) {
    PASSES_TOTAL.with_label_values(&[outcome]).inc();
    if outcome == "success" {
        LAST_SUCCESS_TIMESTAMP.set(chrono::Utc::now().timestamp() as f64);
    }
}

/// Starts a timer for a registrar request
///
/// # Arguments
///
/// * `operation` - Operation type (`list`, `delete`, `add`)
pub fn start_api_timer(operation: &str) -> HistogramTimer {
    API_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .start_timer()
}

/// Collects all metrics and returns them in the Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# metrics encoding failed: {}\n", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

//==============================================================================
// Types
//==============================================================================

/// Histogram timer for measuring duration
pub type HistogramTimer = prometheus::HistogramTimer;

//==============================================================================
// Tests
//==============================================================================
