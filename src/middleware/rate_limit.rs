//! Fixed-window rate limiting stages.
//!
//! Counters live in the shared [`CounterStore`](carenet_cache::CounterStore)
//! so every replica enforces one budget. The IP stage runs before
//! authentication and the identity stage after it. If the store cannot be
//! reached the request is let through and the failure is logged.
//! Forwarding headers only name the client behind a configured proxy.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::IntoResponse,
};
use carenet_auth::Principal;
use carenet_auth::credentials::MISSING_CREDENTIAL_MESSAGE;
use carenet_cache::{WindowState, keys};
use carenet_config::{RateLimitConfig, WindowLimit};
use carenet_core::AppError;
use carenet_observability::{track_rate_limit_store_error, track_rate_limited};
use tracing::warn;

use crate::middleware::pipeline::{AfterHook, Flow};
use crate::state::AppState;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Client address. Forwarding headers (first `X-Forwarded-For` hop, then
/// `X-Real-IP`) are only believed when the socket peer is a trusted proxy;
/// otherwise a client could pick a fresh address for every request.
pub fn client_ip(request: &Request, config: &RateLimitConfig) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if peer.is_some_and(|peer| config.trusts_proxy(peer)) {
        if let Some(forwarded) = forwarded_ip(request.headers()) {
            return forwarded;
        }
    }

    peer.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    forwarded.or_else(real_ip).map(|ip| ip.to_string())
}

pub fn ip_key(scope: &str, request: &Request, config: &RateLimitConfig) -> String {
    keys::rate_limit::by_ip(scope, &client_ip(request, config))
}

/// Key for the authenticated principal. The authentication stage always
/// runs first, so a missing principal means no credential was accepted.
pub fn identity_key(scope: &str, request: &Request) -> Result<String, AppError> {
    request
        .extensions()
        .get::<Principal>()
        .map(|principal| keys::rate_limit::by_principal(scope, principal.id))
        .ok_or_else(|| AppError::unauthenticated(MISSING_CREDENTIAL_MESSAGE))
}

/// Whole seconds until the window resets, rounded up.
fn seconds_until_reset(window: &WindowState) -> u64 {
    (window.resets_in.as_millis() as u64).div_ceil(1000)
}

fn limit_headers(limit: WindowLimit, window: &WindowState) -> HeaderMap {
    let remaining = limit.max_requests.saturating_sub(window.count);
    let mut headers = HeaderMap::new();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit.max_requests));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(
        X_RATELIMIT_RESET,
        HeaderValue::from(seconds_until_reset(window)),
    );
    headers
}

pub async fn throttle(state: &AppState, scope: &str, limit: WindowLimit, key: &str) -> Flow {
    let window = match state.counters.hit(key, limit.window()).await {
        Ok(window) => window,
        Err(err) => {
            warn!(error = %err, scope, "Rate limit store unavailable, allowing request");
            track_rate_limit_store_error();
            return Flow::next();
        }
    };

    let headers = limit_headers(limit, &window);

    if window.count > limit.max_requests {
        warn!(scope, key, count = window.count, "Rate limit exceeded");
        track_rate_limited(scope);

        let retry_after = seconds_until_reset(&window).max(1);
        let mut response =
            AppError::too_many_requests("Too many requests", retry_after).into_response();
        response.headers_mut().extend(headers);
        return Flow::Respond(response);
    }

    Flow::Continue(Some(AfterHook::Headers(headers)))
}
