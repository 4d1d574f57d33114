//! Per-request access logging.
//!
//! A [`RequestLog`] is opened when a request enters the pipeline and closed
//! with the final status. Severity follows the status class: 5xx logs at
//! error, 4xx at warn, everything else at info.

use std::time::Instant;

use axum::http::{Method, StatusCode};
use tracing::{Level, error, info, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct RequestLog {
    request_id: Uuid,
    method: Method,
    path: String,
    started: Instant,
}

impl RequestLog {
    pub fn begin(method: &Method, path: impl Into<String>) -> Self {
        let log = Self {
            request_id: Uuid::new_v4(),
            method: method.clone(),
            path: path.into(),
            started: Instant::now(),
        };

        info!(
            request_id = %log.request_id,
            method = %log.method,
            path = %log.path,
            "Incoming request"
        );

        log
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn finish(self, status: StatusCode) {
        let latency_ms = self.started.elapsed().as_millis();
        let status = status.as_u16();

        match level_for(status) {
            Level::ERROR => error!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                status,
                latency_ms,
                "Server error"
            ),
            Level::WARN => warn!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                status,
                latency_ms,
                "Client error"
            ),
            _ => info!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                status,
                latency_ms,
                "Request completed"
            ),
        }
    }
}

pub(crate) fn level_for(status: u16) -> Level {
    match status {
        500..=599 => Level::ERROR,
        400..=499 => Level::WARN,
        _ => Level::INFO,
    }
}
