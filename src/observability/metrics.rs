//! Metrics collection and exposition.
//!
//! # Metrics
//! - `publisher_requests_total` (counter): inbound requests by outcome, status
//! - `publisher_request_duration_seconds` (histogram): end-to-end latency
//! - `publisher_upstream_requests_total` (counter): upstream calls by endpoint, status
//! - `publisher_upstream_duration_seconds` (histogram): upstream latency by endpoint

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one inbound publish request.
pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "publisher_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("publisher_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one call to an image host or WordPress endpoint.
pub fn record_upstream(endpoint: &'static str, status: u16, start: Instant) {
    counter!(
        "publisher_upstream_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("publisher_upstream_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}
