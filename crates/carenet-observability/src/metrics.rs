use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::logging::is_observability_enabled;

/// Initialize Prometheus metrics exporter with upkeep task.
/// Returns `Ok(None)` if observability is disabled.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )
        .context("Failed to set buckets")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    // Clean stale metrics
    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// `path` label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Route template for the `path` label. Raw URIs carry record ids, so they
/// are never used as labels.
fn path_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned())
}

/// Metrics middleware to track HTTP requests.
///
/// Install with `Router::route_layer` so it runs after routing and sees the
/// [`MatchedPath`].
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = path_label(&req);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status.to_string()).increment(1);

    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    let status_category = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("http_requests_by_status", "status_category" => status_category).increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router for metrics server
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Access control metrics

/// A request was refused by an authorization check.
pub fn track_auth_denied(reason: &str, role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("auth_denials_total", "reason" => reason.to_string(), "role" => role.to_string()).increment(1);
}

/// A credential was missing or rejected.
pub fn track_authentication_failure(reason: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("authentication_failures_total", "reason" => reason.to_string()).increment(1);
}

/// A client exceeded the named limit.
pub fn track_rate_limited(scope: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("rate_limited_total", "scope" => scope.to_string()).increment(1);
}

/// The counter store failed and the request was let through.
pub fn track_rate_limit_store_error() {
    if !is_observability_enabled() {
        return;
    }
    counter!("rate_limit_store_errors_total").increment(1);
}

/// A handler panicked and was converted to a 500.
pub fn track_panic() {
    if !is_observability_enabled() {
        return;
    }
    counter!("handler_panics_total").increment(1);
}

pub fn track_jwt_issued() {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_tokens_issued_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware,
    };
    use tower::ServiceExt;

    async fn label_header(req: Request, next: Next) -> Response {
        let label = path_label(&req);
        let mut response = next.run(req).await;
        if let Ok(value) = HeaderValue::from_str(&label) {
            response.headers_mut().insert("x-path-label", value);
        }
        response
    }

    fn app() -> Router {
        Router::new()
            .nest(
                "/api",
                Router::new().route("/jobs/{job_id}", get(|| async { StatusCode::OK })),
            )
            .route_layer(middleware::from_fn(label_header))
    }

    async fn label_for(uri: &str) -> Option<String> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        response
            .headers()
            .get("x-path-label")
            .map(|v| v.to_str().unwrap().to_owned())
    }

    #[tokio::test]
    async fn test_label_is_route_template_not_raw_uri() {
        let first = label_for("/api/jobs/7d0f6a52-3b0e-4c4e-9a51-0c1f1d1f4e01").await;
        let second = label_for("/api/jobs/0b7f1f0e-58a1-4b43-bd0e-5f8d6a0a9c77").await;
        assert_eq!(first.as_deref(), Some("/api/jobs/{job_id}"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unrouted_request_gets_fixed_label() {
        let request = Request::builder()
            .uri("/api/jobs/7d0f6a52-3b0e-4c4e-9a51-0c1f1d1f4e01")
            .body(Body::empty())
            .unwrap();
        assert_eq!(path_label(&request), UNMATCHED_PATH);
    }
}
