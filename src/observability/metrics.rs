//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_check_probes_total` (counter): matched probes by decision
//! - `health_check_responses_total` (counter): local replies by status
//! - `health_check_cache_events_total` (counter): cache stores and expiries
//! - `health_check_immediate_fail_total` (counter): non-probe responses marked failed
//! - `health_check_cluster_unhealthy_total` (counter): failing clusters by reason
//! - `proxy_requests_total` (counter): forwarded requests by method, status
//! - `proxy_request_duration_seconds` (histogram): upstream latency
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(decision: &'static str) {
    metrics::counter!("health_check_probes_total", "decision" => decision).increment(1);
}

pub fn record_local_response(status: u16) {
    metrics::counter!("health_check_responses_total", "status" => status.to_string()).increment(1);
}

pub fn record_cache_event(event: &'static str) {
    metrics::counter!("health_check_cache_events_total", "event" => event).increment(1);
}

pub fn record_immediate_fail() {
    metrics::counter!("health_check_immediate_fail_total").increment(1);
}

pub fn record_cluster_unhealthy(cluster: &str, reason: &'static str) {
    metrics::counter!(
        "health_check_cluster_unhealthy_total",
        "cluster" => cluster.to_string(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
