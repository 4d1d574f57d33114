use carenet_core::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A platform account as the access pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    /// Company a COMPANY account administers or an employed caregiver works for.
    pub company_id: Option<Uuid>,
    /// Deactivated accounts cannot authenticate.
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            role,
            company_id: None,
            is_active: true,
            is_verified: false,
            created_at: Utc::now(),
        }
    }

    pub fn in_company(mut self, company_id: Uuid) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// A care agency: the tenant boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            is_verified: false,
            created_at: Utc::now(),
        }
    }
}
