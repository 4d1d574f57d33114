use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use carenet_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::jobs::model::{AssignJobDto, CreateJobDto, Job, JobListResponse};
use crate::modules::jobs::service::JobService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/jobs",
    responses(
        (status = 200, description = "Jobs visible to the caller", body = JobListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires jobs:read permission"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs = JobService::list_jobs(state.store.as_ref(), &principal).await?;
    Ok(Json(jobs))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobDto,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 400, description = "Invalid input or missing guardian_id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires GUARDIAN, COMPANY or SUPER_ADMIN"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_job(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateJobDto>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = JobService::create_job(state.store.as_ref(), &principal, dto).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job details", body = Job),
        (status = 400, description = "Malformed job ID"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - not the job's guardian, caregiver or agency"),
        (status = 404, description = "Job not found")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = JobService::get_job(state.store.as_ref(), job_id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{job_id}/assign",
    params(
        ("job_id" = Uuid, Path, description = "Job ID")
    ),
    request_body = AssignJobDto,
    responses(
        (status = 200, description = "Caregiver assigned", body = Job),
        (status = 400, description = "Not an active caregiver"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires jobs:assign within the caller's tenant"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job is not open")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn assign_job(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(job_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignJobDto>,
) -> Result<Json<Job>, AppError> {
    let job = JobService::assign_job(state.store.as_ref(), &principal, job_id, dto).await?;
    Ok(Json(job))
}
