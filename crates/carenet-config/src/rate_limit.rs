//! Rate limiting configuration for API endpoints.
//!
//! Limits are fixed windows: at most `max_requests` per `window_ms`
//! milliseconds per client key, with the window starting at the first request.
//!
//! # Configuration
//!
//! Each tier is configured via environment variables:
//!
//! - `RATE_LIMIT_GENERAL_MAX_REQUESTS` / `RATE_LIMIT_GENERAL_WINDOW_MS`: per-IP limit
//!   for API routes (default: 100 per 15 minutes)
//! - `RATE_LIMIT_AUTH_MAX_REQUESTS` / `RATE_LIMIT_AUTH_WINDOW_MS`: per-IP limit for
//!   credential-sensitive routes (default: 5 per 15 minutes)
//! - `RATE_LIMIT_IDENTITY_MAX_REQUESTS` / `RATE_LIMIT_IDENTITY_WINDOW_MS`: per
//!   authenticated principal (default: 300 per 15 minutes)
//! - `RATE_LIMIT_BACKEND`: `memory` (process-local) or `redis` (shared across replicas)
//! - `TRUSTED_PROXIES`: comma-separated proxy addresses whose `X-Forwarded-For`
//!   and `X-Real-IP` headers are believed. Empty by default, so the socket peer
//!   is the client.

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const FIFTEEN_MINUTES_MS: u64 = 15 * 60 * 1000;

/// One fixed-window limit: `{ maxRequests, windowMs }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowLimit {
    pub max_requests: u64,
    pub window_ms: u64,
}

impl WindowLimit {
    pub const fn new(max_requests: u64, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    fn from_env(prefix: &str, default: WindowLimit) -> Self {
        Self {
            max_requests: env::var(format!("{prefix}_MAX_REQUESTS"))
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_requests),
            window_ms: env::var(format!("{prefix}_WINDOW_MS"))
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .unwrap_or(default.window_ms),
        }
    }
}

/// Where window counters live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Counters in this process only.
    #[default]
    Memory,
    /// Counters in Redis, shared by every replica.
    Redis,
}

/// Rate limit configuration for the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Per-IP limit applied to API routes before authentication.
    pub general: WindowLimit,
    /// Stricter per-IP limit for credential-sensitive routes.
    pub auth: WindowLimit,
    /// Per-principal limit applied after authentication.
    pub identity: WindowLimit,
    pub backend: RateLimitBackend,
    /// Peers allowed to name the client through forwarding headers.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general: WindowLimit::new(100, FIFTEEN_MINUTES_MS),
            auth: WindowLimit::new(5, FIFTEEN_MINUTES_MS),
            identity: WindowLimit::new(300, FIFTEEN_MINUTES_MS),
            backend: RateLimitBackend::Memory,
            trusted_proxies: Vec::new(),
        }
    }
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Falls back to default values if environment variables are not set
    /// or cannot be parsed.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            general: WindowLimit::from_env("RATE_LIMIT_GENERAL", defaults.general),
            auth: WindowLimit::from_env("RATE_LIMIT_AUTH", defaults.auth),
            identity: WindowLimit::from_env("RATE_LIMIT_IDENTITY", defaults.identity),
            backend: match env::var("RATE_LIMIT_BACKEND").as_deref() {
                Ok("redis") => RateLimitBackend::Redis,
                _ => RateLimitBackend::Memory,
            },
            trusted_proxies: env::var("TRUSTED_PROXIES")
                .map(|v| parse_trusted_proxies(&v))
                .unwrap_or_default(),
        }
    }

    pub fn trusts_proxy(&self, peer: IpAddr) -> bool {
        self.trusted_proxies.contains(&peer)
    }
}

/// Parses a comma-separated address list, skipping entries that are not IPs.
pub fn parse_trusted_proxies(value: &str) -> Vec<IpAddr> {
    value
        .split(',')
        .filter_map(|entry| entry.trim().parse().ok())
        .collect()
}
