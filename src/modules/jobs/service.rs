use carenet_auth::{AuthzError, Principal, authorize_tenant};
use carenet_core::{AppError, Role};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::jobs::model::{AssignJobDto, CreateJobDto, Job, JobListResponse, NewJob};
use crate::store::{CareStore, User};
use crate::utils::auth_helpers::{listing_scope, require_company_id};

pub struct JobService;

impl JobService {
    #[instrument(skip(store))]
    pub async fn list_jobs(
        store: &dyn CareStore,
        principal: &Principal,
    ) -> Result<JobListResponse, AppError> {
        let scope = listing_scope(principal)?;
        let data = store.list_jobs(scope).await?;
        let total = data.len();
        Ok(JobListResponse { data, total })
    }

    #[instrument(skip(store))]
    pub async fn get_job(store: &dyn CareStore, job_id: Uuid) -> Result<Job, AppError> {
        Ok(store.get_job(job_id).await?)
    }

    /// Guardians post for themselves. Agencies and administrators post on a
    /// guardian's behalf; an agency's jobs land in its own tenant.
    #[instrument(skip(store))]
    pub async fn create_job(
        store: &dyn CareStore,
        principal: &Principal,
        dto: CreateJobDto,
    ) -> Result<Job, AppError> {
        let (guardian_id, company_id) = match principal.role {
            Role::Guardian => (principal.id, None),
            Role::Company => {
                let company_id = require_company_id(principal)?;
                let guardian = Self::load_guardian(store, dto.guardian_id).await?;
                (guardian.id, Some(company_id))
            }
            Role::SuperAdmin => {
                let guardian = Self::load_guardian(store, dto.guardian_id).await?;
                (guardian.id, None)
            }
            _ => return Err(AuthzError::InsufficientRole.into()),
        };

        let job = store
            .create_job(NewJob {
                title: dto.title,
                description: dto.description,
                guardian_id,
                company_id,
            })
            .await?;

        info!(job_id = %job.id, guardian_id = %guardian_id, "Job created");
        Ok(job)
    }

    async fn load_guardian(
        store: &dyn CareStore,
        guardian_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        let guardian_id =
            guardian_id.ok_or_else(|| AppError::bad_request("guardian_id is required"))?;

        store
            .find_user(guardian_id)
            .await?
            .filter(|user| user.role == Role::Guardian && user.is_active)
            .ok_or_else(|| AppError::bad_request("guardian_id must reference an active guardian"))
    }

    /// Assigns a caregiver to an open job. Both the job and the caregiver
    /// must fall inside the caller's tenant.
    #[instrument(skip(store))]
    pub async fn assign_job(
        store: &dyn CareStore,
        principal: &Principal,
        job_id: Uuid,
        dto: AssignJobDto,
    ) -> Result<Job, AppError> {
        let job = store.get_job(job_id).await?;
        authorize_tenant(principal, job.company_id)?;

        let caregiver = store
            .find_user(dto.caregiver_id)
            .await?
            .filter(|user| user.role == Role::Caregiver && user.is_active)
            .ok_or_else(|| {
                AppError::bad_request("caregiver_id must reference an active caregiver")
            })?;
        authorize_tenant(principal, caregiver.company_id)?;

        let company_id = match principal.role {
            Role::Company => principal.company_id,
            _ => caregiver.company_id,
        };

        let job = store.assign_job(job.id, caregiver.id, company_id).await?;

        info!(job_id = %job.id, caregiver_id = %caregiver.id, "Caregiver assigned");
        Ok(job)
    }
}
