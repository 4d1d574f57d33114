//! Authorization decisions.
//!
//! Every check is a pure function of the [`Principal`] and, for record-level
//! checks, the target's [`ResourceOwnership`]. Callers load ownership; nothing
//! here touches storage.

use carenet_core::{AppError, ErrorCode, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::permissions::{Action, Permission, Resource, has_permission};
use crate::principal::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("insufficient role")]
    InsufficientRole,
    #[error("not resource owner")]
    NotResourceOwner,
    #[error("cross-tenant access")]
    CrossTenant,
}

impl AuthzError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthzError::InsufficientRole => ErrorCode::ForbiddenRole,
            AuthzError::NotResourceOwner => ErrorCode::ForbiddenOwnership,
            AuthzError::CrossTenant => ErrorCode::ForbiddenTenant,
        }
    }

    /// Short label used in logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthzError::InsufficientRole => "role",
            AuthzError::NotResourceOwner => "ownership",
            AuthzError::CrossTenant => "tenant",
        }
    }
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        AppError::forbidden(err.code(), err.to_string())
    }
}

/// Who a record belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwnership {
    /// The account that created or owns the record (guardian, payer, filer).
    pub owner_id: Option<Uuid>,
    /// The account assigned to work on the record (caregiver, payee).
    pub assignee_id: Option<Uuid>,
    /// The tenant the record belongs to.
    pub company_id: Option<Uuid>,
}

impl ResourceOwnership {
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    pub fn with_assignee(mut self, assignee_id: Uuid) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    pub fn in_company(mut self, company_id: Uuid) -> Self {
        self.company_id = Some(company_id);
        self
    }
}

/// Exact role match: the principal's role must be one of `allowed`.
pub fn authorize(principal: &Principal, allowed: &[Role]) -> Result<(), AuthzError> {
    if principal.has_role(allowed) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole)
    }
}

/// The principal's role must hold `resource:action` for any record.
pub fn authorize_resource(
    principal: &Principal,
    resource: Resource,
    action: Action,
) -> Result<(), AuthzError> {
    if has_permission(principal.role, Permission::any(resource, action)) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole)
    }
}

/// Tenant check for a record belonging to `company_id`.
///
/// Staff and unscoped records always pass. A COMPANY principal must match
/// the record's company. A caregiver employed by a company may only reach
/// records of that company; independent caregivers are unrestricted here.
pub fn authorize_tenant(principal: &Principal, company_id: Option<Uuid>) -> Result<(), AuthzError> {
    if principal.is_staff() {
        return Ok(());
    }

    match principal.role {
        Role::Company => match (principal.company_id, company_id) {
            (Some(own), Some(target)) if own == target => Ok(()),
            (_, None) => Ok(()),
            _ => Err(AuthzError::CrossTenant),
        },
        Role::Caregiver => match (principal.company_id, company_id) {
            (Some(own), Some(target)) if own != target => Err(AuthzError::CrossTenant),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// The principal's role must hold `resource:action` in some scope (any,
/// own, or assigned). Staff always pass. Needs no record, so callers can
/// reject ineligible roles before looking anything up.
pub fn authorize_any_scope(
    principal: &Principal,
    resource: Resource,
    action: Action,
) -> Result<(), AuthzError> {
    if principal.is_staff() {
        return Ok(());
    }

    let eligible = [
        Permission::any(resource, action),
        Permission::own(resource, action),
        Permission::assigned(resource, action),
    ]
    .into_iter()
    .any(|permission| has_permission(principal.role, permission));

    if eligible {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole)
    }
}

/// Record-level check for `resource:action` on a record with `ownership`.
///
/// Order: staff bypass, role eligibility (any/own/assigned permission),
/// tenant scope, then ownership. The first failing step decides the error.
pub fn authorize_own_resource(
    principal: &Principal,
    resource: Resource,
    action: Action,
    ownership: &ResourceOwnership,
) -> Result<(), AuthzError> {
    if principal.is_staff() {
        return Ok(());
    }

    authorize_any_scope(principal, resource, action)?;
    authorize_tenant(principal, ownership.company_id)?;

    let is_owner = ownership.owner_id == Some(principal.id);
    let is_assignee = ownership.assignee_id == Some(principal.id);
    let is_tenant_owner = principal.role == Role::Company
        && principal.company_id.is_some()
        && principal.company_id == ownership.company_id;

    if is_owner || is_assignee || is_tenant_owner {
        Ok(())
    } else {
        Err(AuthzError::NotResourceOwner)
    }
}
