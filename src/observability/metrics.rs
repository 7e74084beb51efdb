//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_http_requests_total` (counter): requests by method, status
//! - `gateway_dispatch_total` (counter): dispatches by outcome
//! - `gateway_dispatch_duration_seconds` (histogram): submit-to-result latency
//! - `gateway_queue_depth` (gauge): items waiting for a worker
//! - `gateway_backend_reconnects_total` (counter): reconnects by worker
//! - `gateway_abandoned_replies_total` (counter): results nobody waited for
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! metrics-disabled deployments pay almost nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch(outcome: &'static str, start: Instant) {
    counter!("gateway_dispatch_total", "outcome" => outcome).increment(1);
    histogram!("gateway_dispatch_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_queue_depth(depth: usize) {
    gauge!("gateway_queue_depth").set(depth as f64);
}

pub fn record_reconnect(worker: usize) {
    counter!("gateway_backend_reconnects_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_abandoned_reply() {
    counter!("gateway_abandoned_replies_total").increment(1);
}
