//! JWT claim structures for CareNet tokens.
//!
//! - [`Claims`]: access token claims carrying the role and tenant fields
//! - [`RefreshTokenClaims`]: refresh token claims for token renewal

use carenet_core::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::CredentialError;

/// Distinguishes access tokens from refresh tokens signed with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims for access tokens.
///
/// The role and company embedded here are a snapshot taken at issue time;
/// request authentication re-reads them from the user directory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// Role at issue time
    pub role: Role,
    /// Employing company for tenant-scoped roles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issuer
    pub iss: String,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, CredentialError> {
        Uuid::parse_str(&self.sub).map_err(|_| CredentialError::Invalid)
    }
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// User ID (subject claim)
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token identifier (JWT ID) to ensure token uniqueness
    pub jti: String,
}
