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
pub enum DisputeStatus {
    Open,
    Resolved,
    Rejected,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "OPEN",
            DisputeStatus::Resolved => "RESOLVED",
            DisputeStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisputeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(DisputeStatus::Open),
            "RESOLVED" => Ok(DisputeStatus::Resolved),
            "REJECTED" => Ok(DisputeStatus::Rejected),
            other => Err(format!("invalid dispute status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Dispute {
    pub id: Uuid,
    pub job_id: Option<Uuid>,
    pub raised_by: Uuid,
    pub against_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub reason: String,
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    pub fn ownership(&self) -> ResourceOwnership {
        ResourceOwnership {
            owner_id: Some(self.raised_by),
            assignee_id: self.against_id,
            company_id: self.company_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewDispute {
    pub job_id: Option<Uuid>,
    pub raised_by: Uuid,
    pub against_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDisputeDto {
    /// Job the dispute concerns; the filer must be one of its participants.
    pub job_id: Option<Uuid>,
    pub against_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}

/// How a moderator closes a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeOutcome {
    Resolved,
    Rejected,
}

impl From<DisputeOutcome> for DisputeStatus {
    fn from(outcome: DisputeOutcome) -> Self {
        match outcome {
            DisputeOutcome::Resolved => DisputeStatus::Resolved,
            DisputeOutcome::Rejected => DisputeStatus::Rejected,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResolveDisputeDto {
    pub outcome: DisputeOutcome,
    #[validate(length(min = 1, max = 2000))]
    pub resolution: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisputeListResponse {
    pub data: Vec<Dispute>,
    pub total: usize,
}
