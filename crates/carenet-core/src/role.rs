//! Platform roles.
//!
//! Roles are flat: there is no inheritance between them. Every route lists
//! each role it admits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Moderator,
    Company,
    Caregiver,
    Guardian,
    Patient,
}

impl Role {
    pub const fn all() -> [Role; 6] {
        [
            Role::SuperAdmin,
            Role::Moderator,
            Role::Company,
            Role::Caregiver,
            Role::Guardian,
            Role::Patient,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Moderator => "MODERATOR",
            Role::Company => "COMPANY",
            Role::Caregiver => "CAREGIVER",
            Role::Guardian => "GUARDIAN",
            Role::Patient => "PATIENT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Full system access with platform management capabilities",
            Role::Moderator => "Can verify companies/caregivers and manage disputes",
            Role::Company => "Can manage caregivers, create packages, and handle jobs",
            Role::Caregiver => "Can view assigned jobs, log care activities, and manage profile",
            Role::Guardian => "Can manage patients, create jobs, and make payments",
            Role::Patient => "Can view own profile and care logs",
        }
    }

    /// Platform staff skip ownership checks on owner-scoped routes.
    pub fn bypasses_ownership(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Moderator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::all()
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_from_string() {
        assert_eq!("SUPER_ADMIN".parse::<Role>(), Ok(Role::SuperAdmin));
        assert_eq!("moderator".parse::<Role>(), Ok(Role::Moderator));
        assert_eq!(" COMPANY ".parse::<Role>(), Ok(Role::Company));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_round_trips_through_display() {
        for role in Role::all() {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_role_serde_uses_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            r#""SUPER_ADMIN""#
        );
        let role: Role = serde_json::from_str(r#""CAREGIVER""#).unwrap();
        assert_eq!(role, Role::Caregiver);
    }

    #[test]
    fn test_only_staff_bypass_ownership() {
        let bypassing: Vec<Role> = Role::all()
            .into_iter()
            .filter(Role::bypasses_ownership)
            .collect();
        assert_eq!(bypassing, vec![Role::SuperAdmin, Role::Moderator]);
    }
}
