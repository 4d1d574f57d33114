use carenet_auth::{Permission, Principal};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// The caller as the access pipeline resolved it.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub principal: Principal,
    /// Permissions held through the principal's role, e.g. `jobs:own:read`.
    #[schema(value_type = Vec<String>)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "refresh_token must not be empty"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}
