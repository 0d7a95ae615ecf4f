//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `workflow_controller_notifications_total` - Watch notifications forwarded, by kind and event
//! - `workflow_controller_node_updates_total` - Workflow writes caused by node status changes
//! - `workflow_controller_reconcile_errors_total` - Failed pod reconciliations, by reason
//! - `workflow_controller_reconcile_skips_total` - Pod notifications that needed no lookup, by reason
//! - `workflow_controller_reconcile_duration_seconds` - Duration of pod reconciliations
//! - `workflow_controller_config_resyncs_total` - Configuration resyncs, by result

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static NOTIFICATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "workflow_controller_notifications_total",
            "Total number of watch notifications forwarded to the control loop",
        ),
        &["kind", "event"],
    )
    .expect("Failed to create NOTIFICATIONS_TOTAL metric - this should never happen")
});

static NODE_UPDATES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "workflow_controller_node_updates_total",
        "Total number of workflow updates written for node status changes",
    )
    .expect("Failed to create NODE_UPDATES_TOTAL metric - this should never happen")
});

static RECONCILE_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "workflow_controller_reconcile_errors_total",
            "Total number of failed pod reconciliations",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILE_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILE_SKIPS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "workflow_controller_reconcile_skips_total",
            "Total number of pod notifications that required no workflow lookup",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILE_SKIPS_TOTAL metric - this should never happen")
});

static RECONCILE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "workflow_controller_reconcile_duration_seconds",
            "Duration of pod reconciliation in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .expect("Failed to create RECONCILE_DURATION metric - this should never happen")
});

static CONFIG_RESYNCS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "workflow_controller_config_resyncs_total",
            "Total number of configuration resyncs",
        ),
        &["result"],
    )
    .expect("Failed to create CONFIG_RESYNCS_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(NOTIFICATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NODE_UPDATES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILE_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILE_SKIPS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILE_DURATION.clone()))?;
    REGISTRY.register(Box::new(CONFIG_RESYNCS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_notifications(kind: &str, event: &str) {
    NOTIFICATIONS_TOTAL.with_label_values(&[kind, event]).inc();
}

pub fn increment_node_updates() {
    NODE_UPDATES_TOTAL.inc();
}

pub fn increment_reconcile_errors(reason: &str) {
    RECONCILE_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_reconcile_skips(reason: &str) {
    RECONCILE_SKIPS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconcile_duration(duration: f64) {
    RECONCILE_DURATION.observe(duration);
}

pub fn increment_config_resyncs(result: &str) {
    CONFIG_RESYNCS_TOTAL.with_label_values(&[result]).inc();
}
