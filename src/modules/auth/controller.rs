use axum::{Json, extract::State};
use tracing::instrument;

use carenet_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::model::{MeResponse, RefreshTokenRequest, TokenResponse};
use crate::modules::auth::service::AuthService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated caller and its permissions", body = MeResponse),
        (status = 401, description = "Missing or invalid credential")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn me(AuthUser(principal): AuthUser) -> Json<MeResponse> {
    Json(AuthService::describe(principal))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 400, description = "Invalid request body"),
        (status = 401, description = "Invalid or expired refresh token"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens =
        AuthService::refresh(state.store.as_ref(), &state.jwt_config, &dto.refresh_token).await?;
    Ok(Json(tokens))
}
