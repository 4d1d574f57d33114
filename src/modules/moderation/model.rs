use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

fn default_verified() -> bool {
    true
}

/// Body for the verification endpoints. `{}` verifies;
/// `{"verified": false}` revokes.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyDto {
    #[serde(default = "default_verified")]
    pub verified: bool,
}
