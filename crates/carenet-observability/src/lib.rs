//! CareNet Observability Module
//!
//! Provides configurable observability features including:
//! - Tracing and distributed tracing via OpenTelemetry
//! - Metrics collection via Prometheus
//! - Per-request access logging
//!
//! This module can be enabled or disabled at compile time via the `observability` feature flag.
//! At runtime, observability can be further controlled via the `OBSERVABILITY_ENABLED` environment variable.
//!
//! # Features
//!
//! - `observability` (default): Enables OpenTelemetry export, file logging, and Prometheus metrics
//!
//! # Examples
//!
//! ```no_run
//! use carenet_observability::{init_tracing, shutdown_tracer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_tracing()?;
//!     // ... application code ...
//!     shutdown_tracer().await;
//!     Ok(())
//! }
//! ```

pub mod basic_logging;
pub mod request_log;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use request_log::RequestLog;

#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, is_observability_enabled, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, metrics_app, metrics_middleware, track_authentication_failure, track_auth_denied,
    track_jwt_issued, track_panic, track_rate_limit_store_error, track_rate_limited,
};

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{extract::Request, middleware::Next, response::Response};

    /// No-op observability check when feature disabled
    pub fn is_observability_enabled() -> bool {
        false
    }

    /// No-op metrics middleware when feature disabled
    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    /// Console logging only when feature disabled
    pub fn init_tracing() -> anyhow::Result<()> {
        crate::basic_logging::init_basic_console_logging();
        Ok(())
    }

    /// No-op tracer shutdown when feature disabled
    pub async fn shutdown_tracer() {}

    // No-op tracking functions
    pub fn track_auth_denied(_reason: &str, _role: &str) {}
    pub fn track_authentication_failure(_reason: &str) {}
    pub fn track_rate_limited(_scope: &str) {}
    pub fn track_rate_limit_store_error() {}
    pub fn track_panic() {}
    pub fn track_jwt_issued() {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
