use carenet_auth::{AuthzError, Principal};
use carenet_core::{AppError, Role};
use uuid::Uuid;

use crate::store::ListScope;

/// Records a principal may list when each record has one owner and one
/// assignee: staff see everything, an agency sees its tenant, guardians and
/// patients what they own, caregivers what they are assigned to.
pub fn listing_scope(principal: &Principal) -> Result<ListScope, AppError> {
    match principal.role {
        Role::SuperAdmin | Role::Moderator => Ok(ListScope::All),
        Role::Company => company_scope(principal),
        Role::Guardian | Role::Patient => Ok(ListScope::Owner(principal.id)),
        Role::Caregiver => Ok(ListScope::Assignee(principal.id)),
    }
}

/// Like [`listing_scope`], but individuals see records on either side.
pub fn participant_scope(principal: &Principal) -> Result<ListScope, AppError> {
    match principal.role {
        Role::SuperAdmin | Role::Moderator => Ok(ListScope::All),
        Role::Company => company_scope(principal),
        Role::Guardian | Role::Patient | Role::Caregiver => {
            Ok(ListScope::Participant(principal.id))
        }
    }
}

fn company_scope(principal: &Principal) -> Result<ListScope, AppError> {
    principal
        .company_id
        .map(ListScope::Company)
        .ok_or_else(|| AuthzError::CrossTenant.into())
}

/// The tenant a COMPANY principal acts for.
pub fn require_company_id(principal: &Principal) -> Result<Uuid, AppError> {
    principal
        .company_id
        .ok_or_else(|| AuthzError::CrossTenant.into())
}
