//! Metrics collection and exposition.
//!
//! # Metrics
//! - `keeper_changes_detected_total{origin}` (counter): confirmed source changes by path (event/poll)
//! - `keeper_reloads_total` (counter): reload signals processed
//! - `keeper_render_failures_total{kind}` (counter): failed renders by error kind
//! - `keeper_process_starts_total` (counter): child launches
//! - `keeper_forced_kills_total` (counter): stops that escalated to SIGKILL
//! - `keeper_process_running` (gauge): 1 while a child is alive
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_change_detected(origin: &'static str) {
    metrics::counter!("keeper_changes_detected_total", "origin" => origin).increment(1);
}

pub fn record_reload() {
    metrics::counter!("keeper_reloads_total").increment(1);
}

pub fn record_render_failure(kind: &'static str) {
    metrics::counter!("keeper_render_failures_total", "kind" => kind).increment(1);
}

pub fn record_process_start() {
    metrics::counter!("keeper_process_starts_total").increment(1);
}

pub fn record_forced_kill() {
    metrics::counter!("keeper_forced_kills_total").increment(1);
}

pub fn set_process_running(running: bool) {
    metrics::gauge!("keeper_process_running").set(if running { 1.0 } else { 0.0 });
}
