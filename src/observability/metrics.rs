//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency by method
//! - `gateway_cache_checks_total` (counter): cache checks by outcome
//! - `gateway_upstream_errors_total` (counter): failed forwards by group, kind
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, duration: Duration) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_cache_check(reachable: bool) {
    let outcome = if reachable { "reachable" } else { "unreachable" };
    metrics::counter!("gateway_cache_checks_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream_error(group: &'static str, kind: &'static str) {
    metrics::counter!("gateway_upstream_errors_total", "group" => group, "kind" => kind)
        .increment(1);
}
