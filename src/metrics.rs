// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the acorn-dns controller.
//!
//! All metrics use the namespace prefix `acorn_dns_`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Outcomes and duration of reconciliation passes
//! - **Registrar Metrics** - Calls to the external registrar by operation and outcome
//! - **Domain Metrics** - Whether a managed domain is currently held, renewals
//! - **Error Metrics** - Failures by error category
//!
//! # Example
//!
//! ```rust,no_run
//! use acorndns::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("unchanged", std::time::Duration::from_millis(12));
//! ```

use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "acorn_dns";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliation passes by outcome
///
/// Labels:
/// - `outcome`: `unchanged`, `created`, `replaced` or `error`
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of DNS reconciliation passes by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliation passes in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of DNS reconciliation passes in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Registrar Metrics
// ============================================================================

/// Total number of registrar calls
///
/// Labels:
/// - `operation`: `reserve_domain`, `create_records`, `renew`, `delete_record`, `purge_records`
/// - `status`: `success` or `error`
pub static REGISTRAR_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_registrar_requests_total"),
        "Total number of registrar calls by operation and status",
    );
    let counter = CounterVec::new(opts, &["operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Latency of registrar calls in seconds
pub static REGISTRAR_REQUEST_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_registrar_request_duration_seconds"),
        "Latency of registrar calls in seconds by operation",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Domain Metrics
// ============================================================================

/// 1 while a managed domain is held, 0 otherwise
pub static MANAGED_DOMAIN_HELD: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        format!("{METRICS_NAMESPACE}_managed_domain_held"),
        "Whether a managed domain is currently held",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Total number of lease renewal attempts by outcome
///
/// Labels:
/// - `outcome`: `renewed`, `nothing_held`, `domain_lost` or `error`
pub static RENEWALS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_renewals_total"),
        "Total number of domain lease renewals by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by category
///
/// Labels:
/// - `error_type`: `parse_error`, `registrar_error` or `storage_error`
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by category",
    );
    let counter = CounterVec::new(opts, &["error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
///
/// # Arguments
/// * `outcome` - `unchanged`, `created` or `replaced`
/// * `duration` - Duration of the reconciliation
pub fn record_reconciliation_success(outcome: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&[outcome]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&["success"])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `error_type` - Category of the failure
/// * `duration` - Duration of the reconciliation before failure
pub fn record_reconciliation_error(error_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["error"]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&["error"])
        .observe(duration.as_secs_f64());
    record_error(error_type);
}

/// Record one registrar call
pub fn record_registrar_call(operation: &str, status: &str, duration: Duration) {
    REGISTRAR_REQUESTS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
    REGISTRAR_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record whether a managed domain is held after a state change
pub fn record_domain_held(held: bool) {
    MANAGED_DOMAIN_HELD.set(if held { 1.0 } else { 0.0 });
}

/// Record a lease renewal attempt
pub fn record_renewal(outcome: &str) {
    RENEWALS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record an error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation_success() {
        record_reconciliation_success("created", Duration::from_millis(500));

        let counter = RECONCILIATION_TOTAL.with_label_values(&["created"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&["success"]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_reconciliation_error() {
        record_reconciliation_error("registrar_error", Duration::from_millis(250));

        assert!(RECONCILIATION_TOTAL.with_label_values(&["error"]).get() > 0.0);
        assert!(ERRORS_TOTAL.with_label_values(&["registrar_error"]).get() > 0.0);
    }

    #[test]
    fn test_record_registrar_call() {
        record_registrar_call("purge_records", "success", Duration::from_millis(40));

        let counter = REGISTRAR_REQUESTS_TOTAL.with_label_values(&["purge_records", "success"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_gather_metrics() {
        record_reconciliation_success("unchanged", Duration::from_millis(100));

        let metrics_text = gather_metrics().expect("Gathering metrics should succeed");
        assert!(
            metrics_text.contains("acorn_dns_reconciliations_total"),
            "Metrics should contain reconciliation counter"
        );
    }
}
