//! JWT (JSON Web Token) utilities for authentication.
//!
//! This module provides functions for creating and verifying the HS256 tokens
//! used by the CareNet API:
//!
//! - **Access tokens**: Short-lived tokens presented on every request
//! - **Refresh tokens**: Long-lived tokens for obtaining new access tokens
//!
//! Both are signed with the same secret and carry the configured issuer. The
//! `type` claim keeps a refresh token from being accepted as an access token.
//!
//! # Example
//!
//! ```ignore
//! use carenet_auth::{create_access_token, verify_token};
//! use carenet_config::JwtConfig;
//! use carenet_core::Role;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, Role::Guardian, None, None, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use carenet_config::JwtConfig;
use carenet_core::{AppError, Role};

use crate::claims::{Claims, RefreshTokenClaims, TokenType};
use crate::credentials::CredentialError;

fn validation(jwt_config: &JwtConfig) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[jwt_config.issuer.as_str()]);
    validation
}

/// Creates an access token for the given user.
///
/// # Errors
///
/// Returns an internal error if token encoding fails (e.g., invalid secret key).
pub fn create_access_token(
    user_id: Uuid,
    role: Role,
    company_id: Option<Uuid>,
    email: Option<&str>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        company_id,
        email: email.map(str::to_string),
        token_type: TokenType::Access,
        iss: jwt_config.issuer.clone(),
        exp,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns the embedded claims.
///
/// Signature, expiry, issuer, and the `type` claim are all checked. Any
/// failure collapses to [`CredentialError::Invalid`].
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, CredentialError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(jwt_config),
    )
    .map(|data| data.claims)
    .map_err(|_| CredentialError::Invalid)?;

    if claims.token_type != TokenType::Access {
        return Err(CredentialError::Invalid);
    }

    Ok(claims)
}

/// Creates a refresh token with a unique `jti`.
pub fn create_refresh_token(user_id: Uuid, jwt_config: &JwtConfig) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.refresh_token_expiry as usize;

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        token_type: TokenType::Refresh,
        iss: jwt_config.issuer.clone(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, CredentialError> {
    let claims = decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(jwt_config),
    )
    .map(|data| data.claims)
    .map_err(|_| CredentialError::Invalid)?;

    if claims.token_type != TokenType::Refresh {
        return Err(CredentialError::Invalid);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-for-jwt-verification".to_string(),
            ..JwtConfig::default()
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = config();
        let user_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();

        let token = create_access_token(
            user_id,
            Role::Company,
            Some(company_id),
            Some("ops@acme.test"),
            &config,
        )
        .unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, Role::Company);
        assert_eq!(claims.company_id, Some(company_id));
        assert_eq!(claims.iss, config.issuer);
        assert_eq!(claims.exp - claims.iat, config.access_token_expiry as usize);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_access_token(Uuid::new_v4(), Role::Guardian, None, None, &config())
            .unwrap();
        let other = JwtConfig {
            secret: "a-different-secret".to_string(),
            ..config()
        };
        assert_eq!(verify_token(&token, &other).unwrap_err(), CredentialError::Invalid);
    }

    #[test]
    fn test_wrong_issuer_is_invalid() {
        let token = create_access_token(Uuid::new_v4(), Role::Guardian, None, None, &config())
            .unwrap();
        let other = JwtConfig {
            issuer: "someone-else".to_string(),
            ..config()
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let config = config();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: Role::Caregiver,
            company_id: None,
            email: None,
            token_type: TokenType::Access,
            iss: config.issuer.clone(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify_token(&token, &config).unwrap_err(), CredentialError::Invalid);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = config();
        let user_id = Uuid::new_v4();
        let refresh = create_refresh_token(user_id, &config).unwrap();

        assert!(verify_token(&refresh, &config).is_err());
        let claims = verify_refresh_token(&refresh, &config).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let config = config();
        let access =
            create_access_token(Uuid::new_v4(), Role::Patient, None, None, &config).unwrap();
        assert!(verify_refresh_token(&access, &config).is_err());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let config = config();
        let user_id = Uuid::new_v4();
        let first = create_refresh_token(user_id, &config).unwrap();
        let second = create_refresh_token(user_id, &config).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(
            verify_token("not.a.jwt", &config()).unwrap_err(),
            CredentialError::Invalid
        );
    }
}
