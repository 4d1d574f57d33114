//! Postgres-backed store.
//!
//! Runtime-checked queries against the schema in `migrations/`. Enum columns
//! are stored as text and parsed into domain enums when rows are mapped.

use anyhow::anyhow;
use async_trait::async_trait;
use carenet_auth::{Resource, ResourceOwnership};
use carenet_core::Role;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use super::{CareStore, Company, ListScope, StoreError, StoreResult, User};
use crate::modules::disputes::model::{Dispute, DisputeStatus, NewDispute};
use crate::modules::jobs::model::{Job, JobStatus, NewJob};
use crate::modules::payments::model::Payment;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record".into()),
            other => StoreError::Unexpected(anyhow!(other)),
        }
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DbUser {
    id: Uuid,
    email: String,
    role: String,
    company_id: Option<Uuid>,
    is_active: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbCompany {
    id: Uuid,
    name: String,
    owner_id: Uuid,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbJob {
    id: Uuid,
    title: String,
    description: Option<String>,
    guardian_id: Uuid,
    company_id: Option<Uuid>,
    caregiver_id: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbPayment {
    id: Uuid,
    job_id: Uuid,
    payer_id: Uuid,
    payee_id: Uuid,
    company_id: Option<Uuid>,
    amount_cents: i64,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbDispute {
    id: Uuid,
    job_id: Option<Uuid>,
    raised_by: Uuid,
    against_id: Option<Uuid>,
    company_id: Option<Uuid>,
    reason: String,
    status: String,
    resolution: Option<String>,
    resolved_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct DbOwnership {
    owner_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
    company_id: Option<Uuid>,
}

fn parse_column<T>(value: &str) -> StoreResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|err: T::Err| StoreError::Unexpected(anyhow!("{err}")))
}

fn user_from_db(row: DbUser) -> StoreResult<User> {
    Ok(User {
        id: row.id,
        email: row.email,
        role: parse_column::<Role>(&row.role)?,
        company_id: row.company_id,
        is_active: row.is_active,
        is_verified: row.is_verified,
        created_at: row.created_at,
    })
}

fn company_from_db(row: DbCompany) -> Company {
    Company {
        id: row.id,
        name: row.name,
        owner_id: row.owner_id,
        is_verified: row.is_verified,
        created_at: row.created_at,
    }
}

fn job_from_db(row: DbJob) -> StoreResult<Job> {
    Ok(Job {
        id: row.id,
        title: row.title,
        description: row.description,
        guardian_id: row.guardian_id,
        company_id: row.company_id,
        caregiver_id: row.caregiver_id,
        status: parse_column::<JobStatus>(&row.status)?,
        created_at: row.created_at,
    })
}

fn payment_from_db(row: DbPayment) -> StoreResult<Payment> {
    Ok(Payment {
        id: row.id,
        job_id: row.job_id,
        payer_id: row.payer_id,
        payee_id: row.payee_id,
        company_id: row.company_id,
        amount_cents: row.amount_cents,
        currency: row.currency,
        status: parse_column(&row.status)?,
        created_at: row.created_at,
    })
}

fn dispute_from_db(row: DbDispute) -> StoreResult<Dispute> {
    Ok(Dispute {
        id: row.id,
        job_id: row.job_id,
        raised_by: row.raised_by,
        against_id: row.against_id,
        company_id: row.company_id,
        reason: row.reason,
        status: parse_column::<DisputeStatus>(&row.status)?,
        resolution: row.resolution,
        resolved_by: row.resolved_by,
        created_at: row.created_at,
        resolved_at: row.resolved_at,
    })
}

/// `WHERE` fragment for a listing scope over a table whose owner, assignee
/// and company columns are named as given. `$1` binds the scope id.
fn scope_clause(scope: ListScope, owner: &str, assignee: &str) -> String {
    match scope {
        ListScope::All => "TRUE".to_string(),
        ListScope::Company(_) => "company_id = $1".to_string(),
        ListScope::Owner(_) => format!("{owner} = $1"),
        ListScope::Assignee(_) => format!("{assignee} = $1"),
        ListScope::Participant(_) => format!("({owner} = $1 OR {assignee} = $1)"),
    }
}

fn scope_id(scope: ListScope) -> Option<Uuid> {
    match scope {
        ListScope::All => None,
        ListScope::Company(id)
        | ListScope::Owner(id)
        | ListScope::Assignee(id)
        | ListScope::Participant(id) => Some(id),
    }
}

const JOB_COLUMNS: &str =
    "id, title, description, guardian_id, company_id, caregiver_id, status, created_at";
const PAYMENT_COLUMNS: &str =
    "id, job_id, payer_id, payee_id, company_id, amount_cents, currency, status, created_at";
const DISPUTE_COLUMNS: &str = "id, job_id, raised_by, against_id, company_id, reason, status, \
     resolution, resolved_by, created_at, resolved_at";

#[async_trait]
impl CareStore for PgStore {
    #[instrument(skip(self))]
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id, email, role, company_id, is_active, is_verified, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_db).transpose()
    }

    #[instrument(skip(self))]
    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let row = sqlx::query_as::<_, DbCompany>(
            "SELECT id, name, owner_id, is_verified, created_at FROM companies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(company_from_db))
    }

    #[instrument(skip(self))]
    async fn set_company_verified(&self, id: Uuid, verified: bool) -> StoreResult<Company> {
        let row = sqlx::query_as::<_, DbCompany>(
            "UPDATE companies SET is_verified = $2 WHERE id = $1 \
             RETURNING id, name, owner_id, is_verified, created_at",
        )
        .bind(id)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?;

        row.map(company_from_db)
            .ok_or_else(|| StoreError::NotFound("Company".into()))
    }

    #[instrument(skip(self))]
    async fn set_caregiver_verified(&self, id: Uuid, verified: bool) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            "UPDATE users SET is_verified = $2 WHERE id = $1 AND role = 'CAREGIVER' \
             RETURNING id, email, role, company_id, is_active, is_verified, created_at",
        )
        .bind(id)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => user_from_db(row),
            None => Err(StoreError::NotFound("Caregiver".into())),
        }
    }

    #[instrument(skip(self))]
    async fn resource_ownership(
        &self,
        resource: Resource,
        id: Uuid,
    ) -> StoreResult<Option<ResourceOwnership>> {
        let sql = match resource {
            Resource::Jobs => {
                "SELECT guardian_id AS owner_id, caregiver_id AS assignee_id, company_id \
                 FROM jobs WHERE id = $1"
            }
            Resource::Payments => {
                "SELECT payer_id AS owner_id, payee_id AS assignee_id, company_id \
                 FROM payments WHERE id = $1"
            }
            Resource::Disputes => {
                "SELECT raised_by AS owner_id, against_id AS assignee_id, company_id \
                 FROM disputes WHERE id = $1"
            }
            Resource::Companies => {
                "SELECT owner_id, NULL::uuid AS assignee_id, id AS company_id \
                 FROM companies WHERE id = $1"
            }
            Resource::Users | Resource::Caregivers | Resource::Patients => {
                "SELECT id AS owner_id, NULL::uuid AS assignee_id, company_id \
                 FROM users WHERE id = $1"
            }
            _ => return Ok(None),
        };

        let row = sqlx::query_as::<_, DbOwnership>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| ResourceOwnership {
            owner_id: row.owner_id,
            assignee_id: row.assignee_id,
            company_id: row.company_id,
        }))
    }

    #[instrument(skip(self))]
    async fn list_jobs(&self, scope: ListScope) -> StoreResult<Vec<Job>> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE {} ORDER BY created_at DESC",
            scope_clause(scope, "guardian_id", "caregiver_id")
        );
        let mut query = sqlx::query_as::<_, DbJob>(&sql);
        if let Some(id) = scope_id(scope) {
            query = query.bind(id);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(job_from_db)
            .collect()
    }

    #[instrument(skip(self))]
    async fn get_job(&self, id: Uuid) -> StoreResult<Job> {
        let row = sqlx::query_as::<_, DbJob>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => job_from_db(row),
            None => Err(StoreError::NotFound("Job".into())),
        }
    }

    #[instrument(skip(self, job), fields(guardian_id = %job.guardian_id))]
    async fn create_job(&self, job: NewJob) -> StoreResult<Job> {
        let row = sqlx::query_as::<_, DbJob>(&format!(
            "INSERT INTO jobs (title, description, guardian_id, company_id, status) \
             VALUES ($1, $2, $3, $4, 'OPEN') RETURNING {JOB_COLUMNS}"
        ))
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.guardian_id)
        .bind(job.company_id)
        .fetch_one(&self.pool)
        .await?;

        job_from_db(row)
    }

    #[instrument(skip(self))]
    async fn assign_job(
        &self,
        job_id: Uuid,
        caregiver_id: Uuid,
        company_id: Option<Uuid>,
    ) -> StoreResult<Job> {
        let mut tx = self.pool.begin().await?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM jobs WHERE id = $1 FOR UPDATE")
                .bind(job_id)
                .fetch_optional(&mut *tx)
                .await?;

        let status = match status {
            Some(status) => parse_column::<JobStatus>(&status)?,
            None => return Err(StoreError::NotFound("Job".into())),
        };
        if status != JobStatus::Open {
            return Err(StoreError::Conflict(format!(
                "Job is {status} and cannot be assigned"
            )));
        }

        let row = sqlx::query_as::<_, DbJob>(&format!(
            "UPDATE jobs SET caregiver_id = $2, status = 'ASSIGNED', \
             company_id = COALESCE(company_id, $3) WHERE id = $1 RETURNING {JOB_COLUMNS}"
        ))
        .bind(job_id)
        .bind(caregiver_id)
        .bind(company_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        job_from_db(row)
    }

    #[instrument(skip(self))]
    async fn list_payments(&self, scope: ListScope) -> StoreResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE {} ORDER BY created_at DESC",
            scope_clause(scope, "payer_id", "payee_id")
        );
        let mut query = sqlx::query_as::<_, DbPayment>(&sql);
        if let Some(id) = scope_id(scope) {
            query = query.bind(id);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(payment_from_db)
            .collect()
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, id: Uuid) -> StoreResult<Payment> {
        let row = sqlx::query_as::<_, DbPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => payment_from_db(row),
            None => Err(StoreError::NotFound("Payment".into())),
        }
    }

    #[instrument(skip(self, dispute), fields(raised_by = %dispute.raised_by))]
    async fn create_dispute(&self, dispute: NewDispute) -> StoreResult<Dispute> {
        let row = sqlx::query_as::<_, DbDispute>(&format!(
            "INSERT INTO disputes (job_id, raised_by, against_id, company_id, reason, status) \
             VALUES ($1, $2, $3, $4, $5, 'OPEN') RETURNING {DISPUTE_COLUMNS}"
        ))
        .bind(dispute.job_id)
        .bind(dispute.raised_by)
        .bind(dispute.against_id)
        .bind(dispute.company_id)
        .bind(&dispute.reason)
        .fetch_one(&self.pool)
        .await?;

        dispute_from_db(row)
    }

    #[instrument(skip(self))]
    async fn list_disputes(&self, scope: ListScope) -> StoreResult<Vec<Dispute>> {
        let sql = format!(
            "SELECT {DISPUTE_COLUMNS} FROM disputes WHERE {} ORDER BY created_at DESC",
            scope_clause(scope, "raised_by", "against_id")
        );
        let mut query = sqlx::query_as::<_, DbDispute>(&sql);
        if let Some(id) = scope_id(scope) {
            query = query.bind(id);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(dispute_from_db)
            .collect()
    }

    #[instrument(skip(self, resolution))]
    async fn resolve_dispute(
        &self,
        id: Uuid,
        outcome: DisputeStatus,
        resolution: String,
        resolved_by: Uuid,
    ) -> StoreResult<Dispute> {
        let mut tx = self.pool.begin().await?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM disputes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let status = match status {
            Some(status) => parse_column::<DisputeStatus>(&status)?,
            None => return Err(StoreError::NotFound("Dispute".into())),
        };
        if status != DisputeStatus::Open {
            return Err(StoreError::Conflict(format!("Dispute is already {status}")));
        }

        let row = sqlx::query_as::<_, DbDispute>(&format!(
            "UPDATE disputes SET status = $2, resolution = $3, resolved_by = $4, \
             resolved_at = NOW() WHERE id = $1 RETURNING {DISPUTE_COLUMNS}"
        ))
        .bind(id)
        .bind(outcome.as_str())
        .bind(&resolution)
        .bind(resolved_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        dispute_from_db(row)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
