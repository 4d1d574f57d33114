use carenet_core::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated caller, as resolved from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    /// Company the principal belongs to (COMPANY accounts) or works for
    /// (employed caregivers).
    pub company_id: Option<Uuid>,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            company_id: None,
            email: None,
        }
    }

    pub fn with_company(mut self, company_id: Uuid) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }

    pub fn is_staff(&self) -> bool {
        self.role.bypasses_ownership()
    }
}
