//! Metrics collection and exposition.
//!
//! # Metrics
//! - `llm_proxy_requests_total` (counter): generate requests by final status
//! - `llm_proxy_request_duration_seconds` (histogram): time to response head
//! - `llm_proxy_rejections_total` (counter): rejected requests by reason
//! - `llm_proxy_stream_bytes_total` (counter): bytes relayed to clients
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("llm_proxy_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("llm_proxy_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("llm_proxy_rejections_total", "reason" => reason).increment(1);
}

pub fn record_stream_bytes(len: usize) {
    metrics::counter!("llm_proxy_stream_bytes_total").increment(len as u64);
}
