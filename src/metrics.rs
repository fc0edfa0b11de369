//! Prometheus metrics for request and remote call monitoring.
//!
//! This module provides metrics for:
//! - Stats requests served and failed
//! - Session connect attempts and failures
//! - Remote call latency per method
//! - HTTP request latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::debug;

use crate::telegram::RemoteMethod;

// === Metric Name Constants ===

/// Remote call latency metric name.
pub const METRIC_REMOTE_CALL_LATENCY: &str = "remote_call_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Stats requests counter metric name.
pub const METRIC_STATS_REQUESTS: &str = "stats_requests_total";
/// Failed stats requests counter metric name.
pub const METRIC_STATS_REQUESTS_FAILED: &str = "stats_requests_failed_total";
/// Session connect attempts counter metric name.
pub const METRIC_SESSION_CONNECTS: &str = "session_connects_total";
/// Session connect failures counter metric name.
pub const METRIC_SESSION_CONNECT_FAILURES: &str = "session_connect_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_REMOTE_CALL_LATENCY,
        "Telegram remote call latency in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(
        METRIC_STATS_REQUESTS,
        "Total number of message stats requests"
    );
    describe_counter!(
        METRIC_STATS_REQUESTS_FAILED,
        "Total number of message stats requests that failed"
    );
    describe_counter!(
        METRIC_SESSION_CONNECTS,
        "Total number of Telegram session connect attempts"
    );
    describe_counter!(
        METRIC_SESSION_CONNECT_FAILURES,
        "Total number of failed Telegram session connect attempts"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter with its own HTTP listener.
pub fn install_exporter(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
}

/// Record remote call latency.
pub fn record_remote_call_latency(start: Instant, method: RemoteMethod) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_REMOTE_CALL_LATENCY, "method" => method.name()).record(latency_ms);
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint).record(latency_ms);
}

/// Increment stats requests counter.
pub fn inc_stats_requests() {
    counter!(METRIC_STATS_REQUESTS).increment(1);
}

/// Increment failed stats requests counter.
pub fn inc_stats_requests_failed() {
    counter!(METRIC_STATS_REQUESTS_FAILED).increment(1);
}

/// Increment session connects counter.
pub fn inc_session_connects() {
    counter!(METRIC_SESSION_CONNECTS).increment(1);
}

/// Increment session connect failures counter.
pub fn inc_session_connect_failures() {
    counter!(METRIC_SESSION_CONNECT_FAILURES).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    endpoint: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given endpoint.
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            start: Instant::now(),
            endpoint,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_http_latency(self.start, self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = LatencyTimer::new("/test");
        sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 9.0); // Allow some tolerance
    }
}
