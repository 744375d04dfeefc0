//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, action
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_publish_total` (counter): publish attempts by outcome
//! - `gateway_publish_duration_seconds` (histogram): broker round trip
//! - `gateway_in_flight_requests` (gauge): requests currently being handled
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Serve Prometheus metrics on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, action: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("action", action.to_string()),
    ];
    counter!("gateway_requests_total", &labels[..]).increment(1);
    histogram!("gateway_request_duration_seconds", &labels[..]).record(start.elapsed().as_secs_f64());
}

pub fn record_publish(outcome: &'static str, elapsed: Duration) {
    counter!("gateway_publish_total", "outcome" => outcome).increment(1);
    histogram!("gateway_publish_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

pub fn set_in_flight(count: u64) {
    gauge!("gateway_in_flight_requests").set(count as f64);
}
