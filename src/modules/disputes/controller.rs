use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use carenet_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::disputes::model::{
    CreateDisputeDto, Dispute, DisputeListResponse, ResolveDisputeDto,
};
use crate::modules::disputes::service::DisputeService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/disputes",
    request_body = CreateDisputeDto,
    responses(
        (status = 201, description = "Dispute filed", body = Dispute),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires disputes:write and access to the job"),
        (status = 404, description = "Job not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Disputes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_dispute(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateDisputeDto>,
) -> Result<(StatusCode, Json<Dispute>), AppError> {
    let dispute = DisputeService::create_dispute(state.store.as_ref(), &principal, dto).await?;
    Ok((StatusCode::CREATED, Json(dispute)))
}

#[utoipa::path(
    get,
    path = "/api/disputes",
    responses(
        (status = 200, description = "Disputes the caller is party to", body = DisputeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires disputes:read")
    ),
    tag = "Disputes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_disputes(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<DisputeListResponse>, AppError> {
    let disputes = DisputeService::list_disputes(state.store.as_ref(), &principal).await?;
    Ok(Json(disputes))
}

#[utoipa::path(
    post,
    path = "/api/disputes/{dispute_id}/resolve",
    params(
        ("dispute_id" = Uuid, Path, description = "Dispute ID")
    ),
    request_body = ResolveDisputeDto,
    responses(
        (status = 200, description = "Dispute closed", body = Dispute),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires SUPER_ADMIN or MODERATOR"),
        (status = 404, description = "Dispute not found"),
        (status = 409, description = "Dispute already closed")
    ),
    tag = "Disputes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn resolve_dispute(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(dispute_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ResolveDisputeDto>,
) -> Result<Json<Dispute>, AppError> {
    let dispute =
        DisputeService::resolve_dispute(state.store.as_ref(), &principal, dispute_id, dto).await?;
    Ok(Json(dispute))
}
