//! The static role-to-permission table.
//!
//! A permission is `resource:action` (any record), `resource:own:action`
//! (records the principal owns), or `resource:assigned:action` (records the
//! principal is assigned to). Roles are flat; each entry lists every role it
//! admits.
//!
//! # Example
//!
//! ```ignore
//! use carenet_auth::permissions::{Action, Permission, Resource, has_permission};
//!
//! if has_permission(Role::Guardian, Permission::any(Resource::Jobs, Action::Write)) {
//!     // Guardian may post jobs
//! }
//! ```

use std::fmt;

use carenet_core::Role;
use carenet_core::Role::{Caregiver, Company, Guardian, Moderator, Patient, SuperAdmin};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Companies,
    Caregivers,
    Patients,
    Jobs,
    Payments,
    CareLogs,
    Feedback,
    Disputes,
    Analytics,
    System,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Companies => "companies",
            Resource::Caregivers => "caregivers",
            Resource::Patients => "patients",
            Resource::Jobs => "jobs",
            Resource::Payments => "payments",
            Resource::CareLogs => "care_logs",
            Resource::Feedback => "feedback",
            Resource::Disputes => "disputes",
            Resource::Analytics => "analytics",
            Resource::System => "system",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Delete,
    Manage,
    Create,
    Verify,
    Assign,
    Process,
    Moderate,
    Resolve,
    Config,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
            Action::Manage => "manage",
            Action::Create => "create",
            Action::Verify => "verify",
            Action::Assign => "assign",
            Action::Process => "process",
            Action::Moderate => "moderate",
            Action::Resolve => "resolve",
            Action::Config => "config",
        }
    }
}

/// Which records a permission covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Any,
    Own,
    Assigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
    pub scope: Scope,
}

impl Permission {
    pub const fn any(resource: Resource, action: Action) -> Self {
        Self {
            resource,
            action,
            scope: Scope::Any,
        }
    }

    pub const fn own(resource: Resource, action: Action) -> Self {
        Self {
            resource,
            action,
            scope: Scope::Own,
        }
    }

    pub const fn assigned(resource: Resource, action: Action) -> Self {
        Self {
            resource,
            action,
            scope: Scope::Assigned,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            Scope::Any => write!(f, "{}:{}", self.resource.as_str(), self.action.as_str()),
            Scope::Own => write!(f, "{}:own:{}", self.resource.as_str(), self.action.as_str()),
            Scope::Assigned => write!(
                f,
                "{}:assigned:{}",
                self.resource.as_str(),
                self.action.as_str()
            ),
        }
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

use Action::*;
use Resource::*;

pub static PERMISSION_TABLE: &[(Permission, &[Role])] = &[
    // =========================================================================
    // Users
    // =========================================================================
    (Permission::any(Users, Read), &[SuperAdmin, Moderator]),
    (Permission::any(Users, Write), &[SuperAdmin]),
    (Permission::any(Users, Delete), &[SuperAdmin]),
    // =========================================================================
    // Companies
    // =========================================================================
    (Permission::any(Companies, Read), &[SuperAdmin, Moderator]),
    (Permission::any(Companies, Write), &[SuperAdmin, Company]),
    (Permission::any(Companies, Verify), &[SuperAdmin, Moderator]),
    // =========================================================================
    // Caregivers
    // =========================================================================
    (Permission::any(Caregivers, Read), &[SuperAdmin, Moderator, Company]),
    (Permission::any(Caregivers, Write), &[SuperAdmin, Company]),
    (Permission::any(Caregivers, Verify), &[SuperAdmin, Moderator]),
    (Permission::any(Caregivers, Assign), &[SuperAdmin, Company]),
    // =========================================================================
    // Patients
    // =========================================================================
    (
        Permission::any(Patients, Read),
        &[SuperAdmin, Moderator, Company, Guardian, Caregiver],
    ),
    (Permission::any(Patients, Write), &[SuperAdmin, Company, Guardian]),
    (Permission::own(Patients, Read), &[Guardian, Patient, Caregiver]),
    (Permission::own(Patients, Write), &[Guardian]),
    // =========================================================================
    // Jobs
    // =========================================================================
    (
        Permission::any(Jobs, Read),
        &[SuperAdmin, Moderator, Company, Guardian, Caregiver],
    ),
    (Permission::any(Jobs, Write), &[SuperAdmin, Company, Guardian]),
    (Permission::any(Jobs, Assign), &[SuperAdmin, Company]),
    (Permission::own(Jobs, Read), &[Guardian, Caregiver]),
    (Permission::assigned(Jobs, Read), &[Caregiver]),
    // =========================================================================
    // Payments
    // =========================================================================
    (
        Permission::any(Payments, Read),
        &[SuperAdmin, Moderator, Company, Guardian],
    ),
    (Permission::any(Payments, Write), &[SuperAdmin, Company, Guardian]),
    (Permission::own(Payments, Read), &[Guardian, Caregiver]),
    (Permission::any(Payments, Process), &[SuperAdmin, Company]),
    // =========================================================================
    // Care logs
    // =========================================================================
    (
        Permission::any(CareLogs, Read),
        &[SuperAdmin, Moderator, Company, Guardian, Caregiver],
    ),
    (
        Permission::any(CareLogs, Write),
        &[SuperAdmin, Company, Guardian, Caregiver],
    ),
    (Permission::own(CareLogs, Read), &[Guardian, Patient, Caregiver]),
    (Permission::any(CareLogs, Create), &[Caregiver]),
    // =========================================================================
    // Feedback
    // =========================================================================
    (
        Permission::any(Feedback, Read),
        &[SuperAdmin, Moderator, Company, Guardian, Caregiver],
    ),
    (
        Permission::any(Feedback, Write),
        &[SuperAdmin, Company, Guardian, Caregiver],
    ),
    (Permission::any(Feedback, Moderate), &[SuperAdmin, Moderator]),
    // =========================================================================
    // Disputes
    // =========================================================================
    (
        Permission::any(Disputes, Read),
        &[SuperAdmin, Moderator, Company, Guardian, Caregiver],
    ),
    (
        Permission::any(Disputes, Write),
        &[SuperAdmin, Moderator, Company, Guardian, Caregiver],
    ),
    (Permission::any(Disputes, Resolve), &[SuperAdmin, Moderator]),
    // =========================================================================
    // Analytics
    // =========================================================================
    (Permission::any(Analytics, Read), &[SuperAdmin, Moderator, Company]),
    (Permission::own(Analytics, Read), &[Company]),
    // =========================================================================
    // System
    // =========================================================================
    (Permission::any(System, Read), &[SuperAdmin]),
    (Permission::any(System, Write), &[SuperAdmin]),
    (Permission::any(System, Config), &[SuperAdmin]),
];

/// Roles granted `permission`. Unlisted permissions grant nobody.
pub fn roles_for(permission: Permission) -> &'static [Role] {
    PERMISSION_TABLE
        .iter()
        .find(|(p, _)| *p == permission)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    roles_for(permission).contains(&role)
}

/// Every permission `role` holds, in table order.
pub fn permissions_for(role: Role) -> Vec<Permission> {
    PERMISSION_TABLE
        .iter()
        .filter(|(_, roles)| roles.contains(&role))
        .map(|(p, _)| *p)
        .collect()
}
