//! CORS stage.
//!
//! Preflights are answered here and never reach authentication or the
//! handler. Other requests from allowed origins get the CORS headers on the
//! way out; requests from unlisted origins get none, or a 403 when the
//! policy rejects them.

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
        },
    },
    response::{IntoResponse, Response},
};
use carenet_config::CorsConfig;
use carenet_core::{AppError, ErrorCode};
use tracing::debug;

use crate::middleware::pipeline::{AfterHook, Flow};

pub fn apply(policy: &CorsConfig, request: &Request) -> Flow {
    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let allowed = origin
        .as_deref()
        .filter(|origin| policy.is_origin_allowed(origin));

    if request.method() == Method::OPTIONS {
        return Flow::Respond(preflight_response(policy, allowed));
    }

    match (origin.as_deref(), allowed) {
        (_, Some(origin)) => Flow::Continue(Some(AfterHook::Headers(cors_headers(policy, origin)))),
        (Some(origin), None) if policy.reject_disallowed => {
            debug!(origin, "Rejected request from disallowed origin");
            Flow::Respond(
                AppError::forbidden(ErrorCode::ForbiddenOrigin, "Origin not allowed")
                    .into_response(),
            )
        }
        _ => Flow::next(),
    }
}

/// OPTIONS handler mounted next to each route. The CORS stage answers
/// preflights before this is reached.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn preflight_response(policy: &CorsConfig, allowed_origin: Option<&str>) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;

    let headers = match allowed_origin {
        Some(origin) => cors_headers(policy, origin),
        None => method_headers(policy),
    };
    response.headers_mut().extend(headers);
    response
}

fn method_headers(policy: &CorsConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(methods) = HeaderValue::from_str(&policy.allowed_methods.join(", ")) {
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, methods);
    }
    if let Ok(allowed) = HeaderValue::from_str(&policy.allowed_headers.join(", ")) {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allowed);
    }
    if policy.allow_credentials {
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
    headers
}

fn cors_headers(policy: &CorsConfig, origin: &str) -> HeaderMap {
    let mut headers = method_headers(policy);

    // A wildcard cannot be combined with credentials; echo the origin instead.
    let allow_origin = if policy.allows_any_origin() && !policy.allow_credentials {
        Some(HeaderValue::from_static("*"))
    } else {
        HeaderValue::from_str(origin).ok()
    };

    if let Some(value) = allow_origin {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
    headers
}
