//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define versioning metrics (requests, applied changes, pipeline latency)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `versioning_requests_total` (counter): requests by version, outcome
//! - `versioning_changes_applied_total` (counter): change invocations by direction
//! - `versioning_pipeline_duration_seconds` (histogram): time spent in a pipeline
//! - `versioning_config_reloads_total` (counter): reloads by result
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs a recorder
//! - Labels never include request data beyond the version name

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Outcome label values for `versioning_requests_total`.
pub mod outcome {
    pub const BYPASSED: &str = "bypassed";
    pub const TRANSFORMED: &str = "transformed";
    pub const INVALID_VERSION: &str = "invalid_version";
    pub const ERROR: &str = "error";
}

/// Start the Prometheus scrape listener. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_request(version: &str, outcome: &'static str) {
    metrics::counter!(
        "versioning_requests_total",
        "version" => version.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// `direction` is "request" or "response".
pub fn record_pipeline(direction: &'static str, changes: usize, start: Instant) {
    metrics::counter!("versioning_changes_applied_total", "direction" => direction)
        .increment(changes as u64);
    metrics::histogram!("versioning_pipeline_duration_seconds", "direction" => direction)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_config_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("versioning_config_reloads_total", "result" => result).increment(1);
}
