//! Application error type and its JSON response shape.
//!
//! Every failure that leaves the service is an [`AppError`]: an HTTP status,
//! a stable [`ErrorCode`] from the access taxonomy, and the underlying cause.
//! Client errors expose their message; server errors are logged and replaced
//! by a generic message so internals never reach the caller.

use anyhow::Error;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message returned in place of any 5xx cause.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Stable, machine-readable failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No credential was presented.
    Unauthenticated,
    /// The credential is malformed, forged, expired, or names an unknown user.
    InvalidCredential,
    /// The principal's role is not permitted.
    ForbiddenRole,
    /// The principal does not own the target record.
    ForbiddenOwnership,
    /// The target record belongs to another company.
    ForbiddenTenant,
    /// The request origin is not on the CORS allow-list.
    ForbiddenOrigin,
    RateLimited,
    NotFound,
    BadRequest,
    Conflict,
    ValidationFailed,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::InvalidCredential => "INVALID_CREDENTIAL",
            ErrorCode::ForbiddenRole => "FORBIDDEN_ROLE",
            ErrorCode::ForbiddenOwnership => "FORBIDDEN_OWNERSHIP",
            ErrorCode::ForbiddenTenant => "FORBIDDEN_TENANT",
            ErrorCode::ForbiddenOrigin => "FORBIDDEN_ORIGIN",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
    pub code: ErrorCode,
    /// Seconds until a rate-limited client may retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub error: Error,
    pub retry_after: Option<u64>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, code: ErrorCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            code,
            error: err.into(),
            retry_after: None,
        }
    }

    fn message(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(status, code, anyhow::anyhow!(message.into()))
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::message(StatusCode::UNAUTHORIZED, ErrorCode::Unauthenticated, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::message(StatusCode::UNAUTHORIZED, ErrorCode::InvalidCredential, message)
    }

    pub fn forbidden(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::message(StatusCode::FORBIDDEN, code, message)
    }

    pub fn too_many_requests(message: impl Into<String>, retry_after_secs: u64) -> Self {
        let mut err = Self::message(StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimited, message);
        err.retry_after = Some(retry_after_secs);
        err
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::message(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::message(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::message(StatusCode::CONFLICT, ErrorCode::Conflict, message)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::ValidationFailed,
            err,
        )
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            err,
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::message(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            message,
        )
    }

    /// The body this error renders to.
    pub fn to_body(&self) -> ErrorResponse {
        let error = if self.status.is_server_error() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.error.to_string()
        };

        ErrorResponse {
            error,
            code: self.code,
            retry_after: self.retry_after,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.code.as_str(), self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status.as_u16(),
                code = self.code.as_str(),
                error = ?self.error,
                "Request failed with server error"
            );
        }

        let body = self.to_body();
        let mut response = (self.status, Json(body)).into_response();

        if let Some(secs) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::unprocessable(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_client_error_exposes_reason() {
        let response =
            AppError::forbidden(ErrorCode::ForbiddenRole, "insufficient role").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["error"], "insufficient role");
        assert_eq!(body["code"], "FORBIDDEN_ROLE");
        assert!(body.get("retry_after").is_none());
    }

    #[tokio::test]
    async fn test_server_error_hides_cause() {
        let response =
            AppError::internal(anyhow::anyhow!("connection refused: 10.0.0.5:5432")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::too_many_requests("Too many requests", 42).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "42");

        let body = body_json(response).await;
        assert_eq!(body["retry_after"], 42);
        assert_eq!(body["code"], "RATE_LIMITED");
    }

    #[test]
    fn test_unauthenticated_and_invalid_are_both_401() {
        assert_eq!(
            AppError::unauthenticated("Access token is required").status,
            StatusCode::UNAUTHORIZED
        );
        let invalid = AppError::unauthorized("Invalid or expired token");
        assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.code, ErrorCode::InvalidCredential);
    }

    #[test]
    fn test_error_code_serialization_matches_as_str() {
        for code in [
            ErrorCode::Unauthenticated,
            ErrorCode::ForbiddenTenant,
            ErrorCode::RateLimited,
            ErrorCode::InternalError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }
}
