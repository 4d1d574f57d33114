use std::fmt;
use std::str::FromStr;

use carenet_auth::ResourceOwnership;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Open,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "OPEN",
            JobStatus::Assigned => "ASSIGNED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(JobStatus::Open),
            "ASSIGNED" => Ok(JobStatus::Assigned),
            "IN_PROGRESS" => Ok(JobStatus::InProgress),
            "COMPLETED" => Ok(JobStatus::Completed),
            "CANCELLED" => Ok(JobStatus::Cancelled),
            other => Err(format!("invalid job status: {other}")),
        }
    }
}

/// A care job posted by a guardian, optionally through an agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub guardian_id: Uuid,
    pub company_id: Option<Uuid>,
    pub caregiver_id: Option<Uuid>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn ownership(&self) -> ResourceOwnership {
        ResourceOwnership {
            owner_id: Some(self.guardian_id),
            assignee_id: self.caregiver_id,
            company_id: self.company_id,
        }
    }
}

/// Insert shape for a job; the store assigns id, status and timestamp.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: Option<String>,
    pub guardian_id: Uuid,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    /// Guardian the job is posted for. Required when an agency or
    /// administrator posts; ignored for guardians.
    pub guardian_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignJobDto {
    pub caregiver_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobListResponse {
    pub data: Vec<Job>,
    pub total: usize,
}
