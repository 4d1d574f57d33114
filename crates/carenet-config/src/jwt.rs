//! JWT signing configuration.

use std::env;

/// Secret and lifetimes for CareNet access and refresh tokens.
///
/// # Environment Variables
///
/// - `JWT_SECRET`: HMAC secret shared with the token issuer
/// - `JWT_ACCESS_EXPIRY`: access token lifetime in seconds (default: 900)
/// - `JWT_REFRESH_EXPIRY`: refresh token lifetime in seconds (default: 604800)
/// - `JWT_ISSUER`: expected `iss` claim (default: `carenet`)
/// - `AUTH_COOKIE_NAME`: cookie consulted when no bearer header is sent (default: `access_token`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    pub issuer: String,
    pub cookie_name: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key-change-in-production".to_string(),
            access_token_expiry: 900,     // 15 minutes
            refresh_token_expiry: 604800, // 7 days
            issuer: "carenet".to_string(),
            cookie_name: "access_token".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            access_token_expiry: env::var("JWT_ACCESS_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.access_token_expiry),
            refresh_token_expiry: env::var("JWT_REFRESH_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.refresh_token_expiry),
            issuer: env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            cookie_name: env::var("AUTH_COOKIE_NAME").unwrap_or(defaults.cookie_name),
        }
    }
}
