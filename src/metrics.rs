// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the ingress relocation operator.
//!
//! All metrics use the namespace prefix `ingress_relocator`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Track reconciliation operations and their outcomes
//! - **Resource Change Metrics** - Track secrets and singletons created or updated
//! - **Relocation Metrics** - Track generated certificates, deleted routes and readiness waits
//! - **Error Metrics** - Track failures by reason
//!
//! # Example
//!
//! ```rust,no_run
//! use ingress_relocator::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("ClusterRelocation", std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all operator metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "ingress_relocator";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `ClusterRelocation`)
/// - `status`: Outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `resource_type`: Kind of resource
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of requeue operations
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `reason`: Reason for requeue (error reason, e.g. `KubernetesApiError`)
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requeues_total"),
        "Total number of requeue operations by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Resource Change Metrics
// ============================================================================

/// Total number of writes that changed a resource
///
/// Labels:
/// - `resource_type`: Kind of resource (`Secret`, `IngressController`, `Ingress`)
/// - `operation`: `created` or `updated`
pub static RESOURCE_CHANGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resource_changes_total"),
        "Total number of resources created or updated by type",
    );
    let counter = CounterVec::new(opts, &["resource_type", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Relocation Metrics
// ============================================================================

/// Total number of self-signed ingress certificates generated
pub static CERTIFICATES_GENERATED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    let counter = Counter::new(
        format!("{METRICS_NAMESPACE}_certificates_generated_total"),
        "Total number of self-signed ingress certificates generated",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of routes deleted because their host no longer matched the domain
pub static ROUTES_DELETED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    let counter = Counter::new(
        format!("{METRICS_NAMESPACE}_routes_deleted_total"),
        "Total number of stale routes deleted",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Time spent waiting for a cluster operator to settle
///
/// Labels:
/// - `operator`: Name of the cluster operator
pub static CLUSTER_OPERATOR_WAIT_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_cluster_operator_wait_seconds"),
        "Time spent waiting for a cluster operator to become available",
    )
    .buckets(vec![0.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 900.0]);
    let histogram = HistogramVec::new(opts, &["operator"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by resource type and reason
///
/// Labels:
/// - `resource_type`: Kind of resource where error occurred
/// - `reason`: `CamelCase` error reason
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "reason"]).unwrap();
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
/// * `resource_type` - The kind of resource reconciled
/// * `duration` - Duration of the reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `duration` - Duration of the reconciliation before failure
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a reconciliation requeue
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `reason` - Reason for requeue
pub fn record_reconciliation_requeue(resource_type: &str, reason: &str) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "requeue"])
        .inc();
    REQUEUE_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Record a write that created or updated a resource
pub fn record_resource_change(resource_type: &str, operation: &str) {
    RESOURCE_CHANGES_TOTAL
        .with_label_values(&[resource_type, operation])
        .inc();
}

pub fn record_certificate_generated() {
    CERTIFICATES_GENERATED_TOTAL.inc();
}

pub fn record_route_deleted() {
    ROUTES_DELETED_TOTAL.inc();
}

/// Record how long a readiness wait on `operator` took
pub fn record_cluster_operator_wait(operator: &str, waited: Duration) {
    CLUSTER_OPERATOR_WAIT_SECONDS
        .with_label_values(&[operator])
        .observe(waited.as_secs_f64());
}

/// Record an error
///
/// # Arguments
/// * `resource_type` - The kind of resource where error occurred
/// * `reason` - `CamelCase` reason of the error
pub fn record_error(resource_type: &str, reason: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
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
