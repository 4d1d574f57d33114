use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

use carenet_core::AppError;

use crate::modules::moderation::model::VerifyDto;
use crate::modules::moderation::service::ModerationService;
use crate::state::AppState;
use crate::store::{Company, User};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/moderation/companies/{company_id}/verify",
    params(
        ("company_id" = Uuid, Path, description = "Company ID")
    ),
    request_body = VerifyDto,
    responses(
        (status = 200, description = "Company verification updated", body = Company),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires companies:verify"),
        (status = 404, description = "Company not found")
    ),
    tag = "Moderation",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn verify_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<VerifyDto>,
) -> Result<Json<Company>, AppError> {
    let company =
        ModerationService::verify_company(state.store.as_ref(), company_id, dto.verified).await?;
    Ok(Json(company))
}

#[utoipa::path(
    post,
    path = "/api/moderation/caregivers/{user_id}/verify",
    params(
        ("user_id" = Uuid, Path, description = "Caregiver's user ID")
    ),
    request_body = VerifyDto,
    responses(
        (status = 200, description = "Caregiver verification updated", body = User),
        (status = 400, description = "User is not a caregiver"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires caregivers:verify"),
        (status = 404, description = "User not found")
    ),
    tag = "Moderation",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn verify_caregiver(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<VerifyDto>,
) -> Result<Json<User>, AppError> {
    let user =
        ModerationService::verify_caregiver(state.store.as_ref(), user_id, dto.verified).await?;
    Ok(Json(user))
}
