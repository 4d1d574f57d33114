//! In-memory store.
//!
//! Maps guarded by `tokio::sync::RwLock`. Not durable; used for local
//! development, tests, and whenever `DATABASE_URL` is unset. The `insert_*`
//! helpers seed records directly.

use std::collections::HashMap;

use async_trait::async_trait;
use carenet_auth::{Resource, ResourceOwnership};
use carenet_core::Role;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CareStore, Company, ListScope, StoreError, StoreResult, User};
use crate::modules::disputes::model::{Dispute, DisputeStatus, NewDispute};
use crate::modules::jobs::model::{Job, JobStatus, NewJob};
use crate::modules::payments::model::Payment;

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    companies: RwLock<HashMap<Uuid, Company>>,
    jobs: RwLock<HashMap<Uuid, Job>>,
    payments: RwLock<HashMap<Uuid, Payment>>,
    disputes: RwLock<HashMap<Uuid, Dispute>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) -> User {
        self.users.write().await.insert(user.id, user.clone());
        user
    }

    pub async fn insert_company(&self, company: Company) -> Company {
        self.companies
            .write()
            .await
            .insert(company.id, company.clone());
        company
    }

    pub async fn insert_payment(&self, payment: Payment) -> Payment {
        self.payments
            .write()
            .await
            .insert(payment.id, payment.clone());
        payment
    }
}

/// Newest first, like the SQL backend's `ORDER BY created_at DESC`.
fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait]
impl CareStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.companies.read().await.get(&id).cloned())
    }

    async fn set_company_verified(&self, id: Uuid, verified: bool) -> StoreResult<Company> {
        let mut companies = self.companies.write().await;
        let company = companies
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Company".into()))?;
        company.is_verified = verified;
        Ok(company.clone())
    }

    async fn set_caregiver_verified(&self, id: Uuid, verified: bool) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .filter(|user| user.role == Role::Caregiver)
            .ok_or_else(|| StoreError::NotFound("Caregiver".into()))?;
        user.is_verified = verified;
        Ok(user.clone())
    }

    async fn resource_ownership(
        &self,
        resource: Resource,
        id: Uuid,
    ) -> StoreResult<Option<ResourceOwnership>> {
        let ownership = match resource {
            Resource::Jobs => self.jobs.read().await.get(&id).map(Job::ownership),
            Resource::Payments => self.payments.read().await.get(&id).map(Payment::ownership),
            Resource::Disputes => self.disputes.read().await.get(&id).map(Dispute::ownership),
            Resource::Companies => self.companies.read().await.get(&id).map(|company| {
                ResourceOwnership::owned_by(company.owner_id).in_company(company.id)
            }),
            Resource::Users | Resource::Caregivers | Resource::Patients => {
                self.users.read().await.get(&id).map(|user| ResourceOwnership {
                    owner_id: Some(user.id),
                    assignee_id: None,
                    company_id: user.company_id,
                })
            }
            _ => None,
        };
        Ok(ownership)
    }

    async fn list_jobs(&self, scope: ListScope) -> StoreResult<Vec<Job>> {
        let jobs = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| scope.matches(&job.ownership()))
            .cloned()
            .collect();
        Ok(newest_first(jobs, |job| job.created_at))
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Job> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Job".into()))
    }

    async fn create_job(&self, job: NewJob) -> StoreResult<Job> {
        let job = Job {
            id: Uuid::new_v4(),
            title: job.title,
            description: job.description,
            guardian_id: job.guardian_id,
            company_id: job.company_id,
            caregiver_id: None,
            status: JobStatus::Open,
            created_at: Utc::now(),
        };
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(job)
    }

    async fn assign_job(
        &self,
        job_id: Uuid,
        caregiver_id: Uuid,
        company_id: Option<Uuid>,
    ) -> StoreResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| StoreError::NotFound("Job".into()))?;

        if job.status != JobStatus::Open {
            return Err(StoreError::Conflict(format!(
                "Job is {} and cannot be assigned",
                job.status
            )));
        }

        job.caregiver_id = Some(caregiver_id);
        job.status = JobStatus::Assigned;
        if job.company_id.is_none() {
            job.company_id = company_id;
        }
        Ok(job.clone())
    }

    async fn list_payments(&self, scope: ListScope) -> StoreResult<Vec<Payment>> {
        let payments = self
            .payments
            .read()
            .await
            .values()
            .filter(|payment| scope.matches(&payment.ownership()))
            .cloned()
            .collect();
        Ok(newest_first(payments, |payment| payment.created_at))
    }

    async fn get_payment(&self, id: Uuid) -> StoreResult<Payment> {
        self.payments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Payment".into()))
    }

    async fn create_dispute(&self, dispute: NewDispute) -> StoreResult<Dispute> {
        let dispute = Dispute {
            id: Uuid::new_v4(),
            job_id: dispute.job_id,
            raised_by: dispute.raised_by,
            against_id: dispute.against_id,
            company_id: dispute.company_id,
            reason: dispute.reason,
            status: DisputeStatus::Open,
            resolution: None,
            resolved_by: None,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.disputes
            .write()
            .await
            .insert(dispute.id, dispute.clone());
        Ok(dispute)
    }

    async fn list_disputes(&self, scope: ListScope) -> StoreResult<Vec<Dispute>> {
        let disputes = self
            .disputes
            .read()
            .await
            .values()
            .filter(|dispute| scope.matches(&dispute.ownership()))
            .cloned()
            .collect();
        Ok(newest_first(disputes, |dispute| dispute.created_at))
    }

    async fn resolve_dispute(
        &self,
        id: Uuid,
        outcome: DisputeStatus,
        resolution: String,
        resolved_by: Uuid,
    ) -> StoreResult<Dispute> {
        let mut disputes = self.disputes.write().await;
        let dispute = disputes
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Dispute".into()))?;

        if dispute.status != DisputeStatus::Open {
            return Err(StoreError::Conflict(format!(
                "Dispute is already {}",
                dispute.status
            )));
        }

        dispute.status = outcome;
        dispute.resolution = Some(resolution);
        dispute.resolved_by = Some(resolved_by);
        dispute.resolved_at = Some(Utc::now());
        Ok(dispute.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
