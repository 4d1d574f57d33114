use carenet_auth::credentials::INVALID_CREDENTIAL_MESSAGE;
use carenet_auth::permissions::permissions_for;
use carenet_auth::{Principal, create_access_token, create_refresh_token, verify_refresh_token};
use carenet_config::JwtConfig;
use carenet_core::AppError;
use carenet_observability::{track_authentication_failure, track_jwt_issued};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::auth::model::{MeResponse, TokenResponse};
use crate::store::CareStore;

pub struct AuthService;

impl AuthService {
    pub fn describe(principal: Principal) -> MeResponse {
        let permissions = permissions_for(principal.role);
        MeResponse {
            principal,
            permissions,
        }
    }

    /// Exchanges a refresh token for a fresh token pair. Role and company
    /// are read from the account, not from the old token.
    #[instrument(skip(store, jwt_config, refresh_token))]
    pub async fn refresh(
        store: &dyn CareStore,
        jwt_config: &JwtConfig,
        refresh_token: &str,
    ) -> Result<TokenResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config).map_err(|err| {
            track_authentication_failure("refresh_invalid");
            AppError::from(err)
        })?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized(INVALID_CREDENTIAL_MESSAGE))?;

        let Some(user) = store.find_user(user_id).await?.filter(|user| user.is_active) else {
            warn!(user_id = %user_id, "Refresh token names an unknown or inactive user");
            track_authentication_failure("refresh_unknown_user");
            return Err(AppError::unauthorized(INVALID_CREDENTIAL_MESSAGE));
        };

        let access_token = create_access_token(
            user.id,
            user.role,
            user.company_id,
            Some(user.email.as_str()),
            jwt_config,
        )?;
        let refresh_token = create_refresh_token(user.id, jwt_config)?;
        track_jwt_issued();

        info!(user_id = %user.id, "Tokens refreshed");
        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
        })
    }
}
