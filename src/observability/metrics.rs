//! Metrics collection and exposition.
//!
//! # Metrics
//! - `similar_requests_total` (counter): inbound requests by status
//! - `similar_request_duration_seconds` (histogram): inbound latency
//! - `upstream_calls_total` (counter): catalog calls by operation and outcome
//! - `circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `similar_products_dropped_total` (counter): absorbed detail failures

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record one inbound request.
pub fn record_request(status: StatusCode, start_time: Instant) {
    counter!("similar_requests_total", "status" => status.as_u16().to_string()).increment(1);
    histogram!("similar_request_duration_seconds").record(start_time.elapsed().as_secs_f64());
}

/// Record one upstream catalog call.
pub fn record_upstream_call(operation: &'static str, ok: bool) {
    let outcome = if ok { "success" } else { "failure" };
    counter!("upstream_calls_total", "operation" => operation, "outcome" => outcome).increment(1);
}

/// Record a breaker state transition.
pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    };
    gauge!("circuit_breaker_state", "breaker" => breaker.to_string()).set(value);
}

/// Record a similar product dropped after an absorbed fetch failure.
pub fn record_dropped_product() {
    counter!("similar_products_dropped_total").increment(1);
}
