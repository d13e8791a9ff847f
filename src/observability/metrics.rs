//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stacklog_records_emitted_total` (counter): records written, by severity
//! - `stacklog_records_suppressed_total` (counter): records not written, by
//!   reason (`disabled`, `excluded`)
//!
//! Without an installed recorder the macros are no-ops, so the sink and
//! logger can record unconditionally.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::observability::severity::Severity;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(listen = %addr, "Prometheus metrics server started"),
        Err(e) => tracing::error!(listen = %addr, error = %e, "Failed to start Prometheus exporter"),
    }
}

pub fn record_emitted(severity: Severity) {
    metrics::counter!("stacklog_records_emitted_total", "severity" => severity.as_str()).increment(1);
}

pub fn record_suppressed(reason: &'static str) {
    metrics::counter!("stacklog_records_suppressed_total", "reason" => reason).increment(1);
}
