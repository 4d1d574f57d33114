use carenet_auth::{Action, Principal, Resource, authorize_own_resource};
use carenet_core::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::disputes::model::{
    CreateDisputeDto, Dispute, DisputeListResponse, NewDispute, ResolveDisputeDto,
};
use crate::store::CareStore;
use crate::utils::auth_helpers::participant_scope;

pub struct DisputeService;

impl DisputeService {
    /// Files a dispute. When it concerns a job, the filer must be able to see
    /// that job, the dispute inherits the job's tenant, and it is raised
    /// against the other side of the job unless the body names someone.
    #[instrument(skip(store))]
    pub async fn create_dispute(
        store: &dyn CareStore,
        principal: &Principal,
        dto: CreateDisputeDto,
    ) -> Result<Dispute, AppError> {
        let (company_id, against_id) = match dto.job_id {
            Some(job_id) => {
                let ownership = store
                    .resource_ownership(Resource::Jobs, job_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Job not found"))?;
                authorize_own_resource(principal, Resource::Jobs, Action::Read, &ownership)?;

                let counterparty = if ownership.owner_id == Some(principal.id) {
                    ownership.assignee_id
                } else if ownership.assignee_id == Some(principal.id) {
                    ownership.owner_id
                } else {
                    None
                };
                (ownership.company_id, dto.against_id.or(counterparty))
            }
            None => (principal.company_id, dto.against_id),
        };

        if against_id == Some(principal.id) {
            return Err(AppError::bad_request("Cannot raise a dispute against yourself"));
        }

        let dispute = store
            .create_dispute(NewDispute {
                job_id: dto.job_id,
                raised_by: principal.id,
                against_id,
                company_id,
                reason: dto.reason,
            })
            .await?;

        info!(dispute_id = %dispute.id, raised_by = %principal.id, "Dispute filed");
        Ok(dispute)
    }

    #[instrument(skip(store))]
    pub async fn list_disputes(
        store: &dyn CareStore,
        principal: &Principal,
    ) -> Result<DisputeListResponse, AppError> {
        let scope = participant_scope(principal)?;
        let data = store.list_disputes(scope).await?;
        let total = data.len();
        Ok(DisputeListResponse { data, total })
    }

    #[instrument(skip(store))]
    pub async fn resolve_dispute(
        store: &dyn CareStore,
        principal: &Principal,
        dispute_id: Uuid,
        dto: ResolveDisputeDto,
    ) -> Result<Dispute, AppError> {
        let dispute = store
            .resolve_dispute(dispute_id, dto.outcome.into(), dto.resolution, principal.id)
            .await?;

        info!(
            dispute_id = %dispute.id,
            status = %dispute.status,
            resolved_by = %principal.id,
            "Dispute closed"
        );
        Ok(dispute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::disputes::model::{DisputeOutcome, DisputeStatus};
    use crate::modules::jobs::model::NewJob;
    use crate::store::MemoryStore;
    use axum::http::StatusCode;
    use carenet_core::{ErrorCode, Role};

    async fn assigned_job(store: &MemoryStore, guardian: Uuid, caregiver: Uuid) -> Uuid {
        let job = store
            .create_job(NewJob {
                title: "Weekend care".to_string(),
                description: None,
                guardian_id: guardian,
                company_id: None,
            })
            .await
            .unwrap();
        store.assign_job(job.id, caregiver, None).await.unwrap();
        job.id
    }

    fn dto(job_id: Option<Uuid>) -> CreateDisputeDto {
        CreateDisputeDto {
            job_id,
            against_id: None,
            reason: "No-show".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispute_targets_other_side_of_job() {
        let store = MemoryStore::new();
        let (guardian, caregiver) = (Uuid::new_v4(), Uuid::new_v4());
        let job_id = assigned_job(&store, guardian, caregiver).await;

        let dispute = DisputeService::create_dispute(
            &store,
            &Principal::new(guardian, Role::Guardian),
            dto(Some(job_id)),
        )
        .await
        .unwrap();
        assert_eq!(dispute.against_id, Some(caregiver));
        assert_eq!(dispute.status, DisputeStatus::Open);

        let listed = DisputeService::list_disputes(&store, &Principal::new(caregiver, Role::Caregiver))
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
    }

    #[tokio::test]
    async fn test_outsider_cannot_dispute_a_job() {
        let store = MemoryStore::new();
        let job_id = assigned_job(&store, Uuid::new_v4(), Uuid::new_v4()).await;

        let err = DisputeService::create_dispute(
            &store,
            &Principal::new(Uuid::new_v4(), Role::Guardian),
            dto(Some(job_id)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ForbiddenOwnership);

        let err = DisputeService::create_dispute(
            &store,
            &Principal::new(Uuid::new_v4(), Role::Guardian),
            dto(Some(Uuid::new_v4())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_resolving_twice_conflicts() {
        let store = MemoryStore::new();
        let guardian = Principal::new(Uuid::new_v4(), Role::Guardian);
        let dispute = DisputeService::create_dispute(&store, &guardian, dto(None))
            .await
            .unwrap();

        let moderator = Principal::new(Uuid::new_v4(), Role::Moderator);
        let resolve = || ResolveDisputeDto {
            outcome: DisputeOutcome::Rejected,
            resolution: "Insufficient evidence".to_string(),
        };

        let closed = DisputeService::resolve_dispute(&store, &moderator, dispute.id, resolve())
            .await
            .unwrap();
        assert_eq!(closed.status, DisputeStatus::Rejected);
        assert_eq!(closed.resolved_by, Some(moderator.id));

        let err = DisputeService::resolve_dispute(&store, &moderator, dispute.id, resolve())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
