//! Credential extraction from request headers.
//!
//! A bearer `Authorization` header wins over the session cookie. A present but
//! malformed header is an error on its own; it never falls back to the cookie.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::CookieJar;
use carenet_core::AppError;
use thiserror::Error;

pub const MISSING_CREDENTIAL_MESSAGE: &str = "Access token is required";
pub const INVALID_CREDENTIAL_MESSAGE: &str = "Invalid or expired token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Access token is required")]
    Missing,
    #[error("Invalid authorization header format")]
    Malformed,
    #[error("Invalid or expired token")]
    Invalid,
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Missing => AppError::unauthenticated(err.to_string()),
            CredentialError::Malformed | CredentialError::Invalid => {
                AppError::unauthorized(err.to_string())
            }
        }
    }
}

/// Pulls the raw token from `Authorization: Bearer <token>` or, failing that,
/// from the cookie named `cookie_name`.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Result<String, CredentialError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| CredentialError::Malformed)?;
        let (scheme, token) = value
            .split_once(' ')
            .ok_or(CredentialError::Malformed)?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(CredentialError::Malformed);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::Malformed);
        }

        return Ok(token.to_string());
    }

    let jar = CookieJar::from_headers(headers);
    match jar.get(cookie_name) {
        Some(cookie) if !cookie.value().is_empty() => Ok(cookie.value().to_string()),
        _ => Err(CredentialError::Missing),
    }
}
