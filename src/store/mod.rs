//! Storage collaborators consulted by the access pipeline and the route
//! handlers.
//!
//! The pipeline only ever reads: users for authentication and record
//! ownership for own-resource checks. Handlers read and write through the
//! same trait. Two backends exist: [`memory::MemoryStore`] for development
//! and tests, and [`postgres::PgStore`] for deployments.

use async_trait::async_trait;
use carenet_auth::{Resource, ResourceOwnership};
use carenet_core::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::modules::disputes::model::{Dispute, DisputeStatus, NewDispute};
use crate::modules::jobs::model::{Job, NewJob};
use crate::modules::payments::model::Payment;

pub mod memory;
pub mod model;
pub mod postgres;

pub use memory::MemoryStore;
pub use model::{Company, User};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::not_found(format!("{what} not found")),
            StoreError::Conflict(reason) => AppError::conflict(reason),
            StoreError::Unexpected(err) => AppError::internal(err),
        }
    }
}

/// Which records a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Every record. Staff only.
    All,
    /// Records belonging to one company.
    Company(Uuid),
    /// Records the account owns (posted, paid, filed).
    Owner(Uuid),
    /// Records the account is assigned to (caregiver, payee, respondent).
    Assignee(Uuid),
    /// Records the account owns or is assigned to.
    Participant(Uuid),
}

impl ListScope {
    pub fn matches(&self, ownership: &ResourceOwnership) -> bool {
        match *self {
            ListScope::All => true,
            ListScope::Company(id) => ownership.company_id == Some(id),
            ListScope::Owner(id) => ownership.owner_id == Some(id),
            ListScope::Assignee(id) => ownership.assignee_id == Some(id),
            ListScope::Participant(id) => {
                ownership.owner_id == Some(id) || ownership.assignee_id == Some(id)
            }
        }
    }
}

#[async_trait]
pub trait CareStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>>;
    async fn set_company_verified(&self, id: Uuid, verified: bool) -> StoreResult<Company>;
    async fn set_caregiver_verified(&self, id: Uuid, verified: bool) -> StoreResult<User>;

    /// Ownership of one record, or `None` when no such record exists.
    async fn resource_ownership(
        &self,
        resource: Resource,
        id: Uuid,
    ) -> StoreResult<Option<ResourceOwnership>>;

    async fn list_jobs(&self, scope: ListScope) -> StoreResult<Vec<Job>>;
    async fn get_job(&self, id: Uuid) -> StoreResult<Job>;
    async fn create_job(&self, job: NewJob) -> StoreResult<Job>;
    /// Assigns an open job. An unscoped job joins `company_id` when given.
    /// A job that is no longer open is a conflict.
    async fn assign_job(
        &self,
        job_id: Uuid,
        caregiver_id: Uuid,
        company_id: Option<Uuid>,
    ) -> StoreResult<Job>;

    async fn list_payments(&self, scope: ListScope) -> StoreResult<Vec<Payment>>;
    async fn get_payment(&self, id: Uuid) -> StoreResult<Payment>;

    async fn create_dispute(&self, dispute: NewDispute) -> StoreResult<Dispute>;
    async fn list_disputes(&self, scope: ListScope) -> StoreResult<Vec<Dispute>>;
    /// Closes an open dispute. A dispute that is already closed is a conflict.
    async fn resolve_dispute(
        &self,
        id: Uuid,
        outcome: DisputeStatus,
        resolution: String,
        resolved_by: Uuid,
    ) -> StoreResult<Dispute>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
