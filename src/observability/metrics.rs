//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status
//! - `dispatch_request_duration_seconds` (histogram): latency by method
//! - `dispatch_rejections_total` (counter): non-fault rejections by status
//!
//! # Design Decisions
//! - Unknown method tokens are recorded as `OTHER` to bound label cardinality
//! - Recording is a no-op until a recorder is installed

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

use crate::routing::HttpMethod;

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Label value for a raw method token.
pub fn method_label(token: &str) -> &'static str {
    HttpMethod::from_name(token).map_or("OTHER", |m| m.as_str())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method_label(method);
    metrics::counter!(
        "dispatch_requests_total",
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("dispatch_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(status: u16) {
    metrics::counter!("dispatch_rejections_total", "reason" => status.to_string()).increment(1);
}

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), LATENCY_BUCKETS)?
        .with_http_listener(addr)
        .install()?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_label() {
        assert_eq!(method_label("GET"), "GET");
        assert_eq!(method_label("BREW"), "OTHER");
        assert_eq!(method_label("get"), "OTHER");
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        record_request("GET", 200, Instant::now());
        record_rejection(404);
    }
}
