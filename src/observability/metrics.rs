//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_probe_total` (counter): probes by service, outcome
//! - `monitor_service_up` (gauge): 1=last probe ok, 0=failed
//! - `monitor_alerts_total` (counter): alerts and recoveries by service
//! - `monitor_cycle_duration_seconds` (histogram): full check cycle time
//! - `monitor_connectivity_up` (gauge): outbound connectivity pre-check
//!
//! Without an installed recorder every call is a no-op, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(service: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("monitor_probe_total", "service" => service.to_string(), "outcome" => outcome).increment(1);
    gauge!("monitor_service_up", "service" => service.to_string()).set(if ok { 1.0 } else { 0.0 });
}

/// `kind` is `alert` or `recovery`.
pub fn record_alert(service: &str, kind: &'static str) {
    counter!("monitor_alerts_total", "service" => service.to_string(), "kind" => kind).increment(1);
}

pub fn record_cycle(start: Instant) {
    histogram!("monitor_cycle_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_connectivity(up: bool) {
    gauge!("monitor_connectivity_up").set(if up { 1.0 } else { 0.0 });
}
