//! Prometheus metrics.

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Records `http_requests_total` and `http_request_duration_seconds` for
/// every request. The route label uses the matched router pattern, not the
/// raw path, so path parameters cannot blow up label cardinality.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Counts a completed booking operation (create, cancel, confirm, ...).
pub fn record_booking_operation(operation: &'static str) {
    counter!("bookings_total", "operation" => operation).increment(1);
}

/// Counts an email delivery outcome (sent, failed, retried).
pub fn record_email_outcome(outcome: &'static str) {
    counter!("emails_total", "outcome" => outcome).increment(1);
}

/// Counts a deposit gateway operation and whether it succeeded.
pub fn record_deposit_operation(operation: &'static str, success: bool) {
    counter!(
        "deposit_operations_total",
        "operation" => operation,
        "success" => if success { "true" } else { "false" }
    )
    .increment(1);
}

/// GET /metrics in Prometheus text exposition format.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// Installs the global Prometheus recorder. Call once at startup, before
/// the first metric is emitted.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])
        .expect("histogram buckets must not be empty")
        .install_recorder()
        .expect("metrics recorder already installed");

    // set() fails only when init_metrics is called twice.
    let _ = PROMETHEUS_HANDLE.set(handle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_handler_unavailable_before_init() {
        // The recorder is not installed in unit tests.
        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
