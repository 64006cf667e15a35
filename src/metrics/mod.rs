//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Transaction creates/retries and outcomes
//! - Status polling and transitions
//! - Store error rates

use crate::error::TrackerResult;
use crate::transaction::TransactionStatus;

use axum::{routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Encoder, Gauge,
    TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    // Transaction metrics
    pub static ref TX_CREATED: Counter = register_counter!(
        "omnigovern_transactions_created_total",
        "Total transactions created at the store"
    ).unwrap();

    pub static ref TX_RETRIED: Counter = register_counter!(
        "omnigovern_transactions_retried_total",
        "Total transaction retries requested"
    ).unwrap();

    pub static ref TX_COMPLETED: Counter = register_counter!(
        "omnigovern_transactions_completed_total",
        "Total transactions observed completed"
    ).unwrap();

    pub static ref TX_FAILED: Counter = register_counter!(
        "omnigovern_transactions_failed_total",
        "Total transactions observed failed"
    ).unwrap();

    // Polling metrics
    pub static ref STATUS_POLLS: Counter = register_counter!(
        "omnigovern_status_polls_total",
        "Total successful status polls"
    ).unwrap();

    pub static ref POLL_FAILURES: Counter = register_counter!(
        "omnigovern_poll_failures_total",
        "Total status polls that failed and were swallowed"
    ).unwrap();

    pub static ref STATUS_TRANSITIONS: CounterVec = register_counter_vec!(
        "omnigovern_status_transitions_total",
        "Observed status transitions by target status",
        &["status"]
    ).unwrap();

    // Store error metrics
    pub static ref STORE_ERRORS: CounterVec = register_counter_vec!(
        "omnigovern_store_errors_total",
        "Store request failures by operation",
        &["operation"]
    ).unwrap();

    // Tracking state
    pub static ref TRACKING_ACTIVE: Gauge = register_gauge!(
        "omnigovern_tracking_active",
        "Whether a transaction is currently being tracked (1=yes, 0=no)"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> TrackerResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn metrics_handler() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

// Helper functions to record metrics

pub fn record_created() {
    TX_CREATED.inc();
}

pub fn record_retried() {
    TX_RETRIED.inc();
}

pub fn record_completed() {
    TX_COMPLETED.inc();
}

pub fn record_failed() {
    TX_FAILED.inc();
}

pub fn record_poll() {
    STATUS_POLLS.inc();
}

pub fn record_poll_failure() {
    POLL_FAILURES.inc();
}

pub fn record_transition(status: TransactionStatus) {
    STATUS_TRANSITIONS
        .with_label_values(&[status.as_str()])
        .inc();
}

pub fn record_store_error(operation: &str) {
    STORE_ERRORS.with_label_values(&[operation]).inc();
}

pub fn set_tracking_active(active: bool) {
    TRACKING_ACTIVE.set(if active { 1.0 } else { 0.0 });
}
