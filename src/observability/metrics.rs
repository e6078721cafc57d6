//! Metrics collection and exposition.
//!
//! # Metrics
//! - `catalog_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `catalog_breaker_transitions_total` (counter): by breaker, from, to
//! - `catalog_breaker_rejected_total` (counter): calls not permitted
//! - `catalog_breaker_failure_rate_exceeded_total` (counter)
//! - `catalog_retry_attempts_total` (counter): re-executions after a failure
//! - `catalog_downstream_requests_total` (counter): by method, outcome
//! - `catalog_list_degraded_total` (counter): fallback lists served
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_breaker_state(name: &str, state: CircuitState) {
    gauge!("catalog_breaker_state", "breaker" => name.to_string()).set(state as u8 as f64);
}

pub fn record_breaker_transition(name: &str, from: CircuitState, to: CircuitState) {
    counter!(
        "catalog_breaker_transitions_total",
        "breaker" => name.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(name, to);
}

pub fn record_call_not_permitted(name: &str) {
    counter!("catalog_breaker_rejected_total", "breaker" => name.to_string()).increment(1);
}

pub fn record_failure_rate_exceeded(name: &str) {
    counter!(
        "catalog_breaker_failure_rate_exceeded_total",
        "breaker" => name.to_string()
    )
    .increment(1);
}

pub fn record_retry_attempt() {
    counter!("catalog_retry_attempts_total").increment(1);
}

pub fn record_downstream_request(method: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "catalog_downstream_requests_total",
        "method" => method,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_list_degraded() {
    counter!("catalog_list_degraded_total").increment(1);
}
