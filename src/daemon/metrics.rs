//! Prometheus metrics.
//!
//! Metrics are exposed at `GET /metrics` in Prometheus text format.
//!
//! # Metrics Exposed
//!
//! ## Request Metrics
//! - `snapbooth_http_requests_total` - Total HTTP requests (labels: method, path, status)
//!
//!   `path` is the matched route template (`/sessions/{code}`), or
//!   `unmatched` for requests no route accepted.
//! - `snapbooth_http_request_duration_seconds` - Request duration histogram
//!
//! ## Session Metrics
//! - `snapbooth_sessions_created_total` - Sessions created (labels: kind)
//! - `snapbooth_session_lookups_total` - Lookups by code (labels: outcome)
//! - `snapbooth_sessions_evicted_total` - Sessions removed by sweeps
//! - `snapbooth_sessions_live` - Unexpired sessions seen by the last sweep or stats call
//!
//! ## Coupon Metrics
//! - `snapbooth_coupon_operations_total` - Coupon operations (labels: operation, outcome)

#![allow(clippy::cast_precision_loss)]

use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder.
///
/// Must be called once at startup before recording any metrics. Recording
/// without a recorder is a no-op.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    register_metrics();

    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    Ok(handle)
}

/// Gets the global Prometheus handle.
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

fn register_metrics() {
    describe_counter!(
        "snapbooth_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "snapbooth_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    describe_counter!(
        "snapbooth_sessions_created_total",
        "Total sessions created, by kind"
    );
    describe_counter!(
        "snapbooth_session_lookups_total",
        "Total session lookups, by outcome"
    );
    describe_counter!(
        "snapbooth_sessions_evicted_total",
        "Total expired sessions removed by sweeps"
    );
    describe_gauge!("snapbooth_sessions_live", "Number of unexpired sessions");

    describe_counter!(
        "snapbooth_coupon_operations_total",
        "Total coupon operations, by operation and outcome"
    );
}

// =============================================================================
// HTTP Metrics
// =============================================================================

/// Path label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Label value for a request's route: the matched template, or
/// [`UNMATCHED_ROUTE`].
pub fn route_label(matched: Option<&str>) -> &str {
    matched.unwrap_or(UNMATCHED_ROUTE)
}

/// Records an HTTP request against its route template.
pub fn record_http_request(method: &str, route: &str, status: u16, duration_secs: f64) {
    counter!(
        "snapbooth_http_requests_total",
        "method" => method.to_string(),
        "path" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "snapbooth_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => route.to_string()
    )
    .record(duration_secs);
}

// =============================================================================
// Session Metrics
// =============================================================================

/// Records a new session. `kind` is `create` or `reserve`.
pub fn record_session_created(kind: &'static str) {
    counter!("snapbooth_sessions_created_total", "kind" => kind).increment(1);
}

/// Records a lookup outcome: `found`, `not_found` or `expired`.
pub fn record_session_lookup(outcome: &'static str) {
    counter!("snapbooth_session_lookups_total", "outcome" => outcome).increment(1);
}

/// Records a sweep.
pub fn record_sweep(evicted: u64, live: u64) {
    counter!("snapbooth_sessions_evicted_total").increment(evicted);
    set_live_sessions(live);
}

/// Sets the live session gauge.
pub fn set_live_sessions(live: u64) {
    gauge!("snapbooth_sessions_live").set(live as f64);
}

// =============================================================================
// Coupon Metrics
// =============================================================================

/// Records a coupon operation and whether it succeeded.
pub fn record_coupon_operation(operation: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "rejected" };
    counter!(
        "snapbooth_coupon_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

// =============================================================================
// Metrics Rendering
// =============================================================================

/// Renders all metrics in Prometheus text format.
pub fn render_metrics() -> String {
    match get_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label(Some("/sessions/{code}")), "/sessions/{code}");
        assert_eq!(route_label(None), "unmatched");
    }

    #[test]
    fn test_record_http_request_uses_given_label() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_http_request("GET", "/coupons/{code}", 200, 0.01);
            record_http_request("GET", route_label(None), 404, 0.01);
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"path="/coupons/{code}""#));
        assert!(rendered.contains(r#"path="unmatched""#));
    }

    #[test]
    fn test_render_without_recorder() {
        // Only meaningful when no recorder was installed by this test binary
        if get_handle().is_none() {
            assert!(render_metrics().starts_with("# Metrics not initialized"));
        }
    }
}
