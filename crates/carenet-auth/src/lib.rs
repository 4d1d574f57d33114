//! # CareNet Auth
//!
//! Authentication and authorization building blocks for the CareNet API.
//!
//! This crate provides:
//!
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification utilities
//! - [`credentials`]: Raw credential extraction from headers and cookies
//! - [`principal`]: The authenticated caller
//! - [`permissions`]: The static role-to-permission table
//! - [`resolver`]: Role, resource, ownership, and tenant checks
//!
//! # Example
//!
//! ```ignore
//! use carenet_auth::{Principal, authorize_own_resource, ResourceOwnership};
//! use carenet_auth::permissions::{Action, Resource};
//!
//! let ownership = ResourceOwnership::owned_by(guardian_id);
//! authorize_own_resource(&principal, Resource::Jobs, Action::Read, &ownership)?;
//! ```

pub mod claims;
pub mod credentials;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod resolver;

// Re-export commonly used types at crate root
pub use claims::{Claims, RefreshTokenClaims, TokenType};
pub use credentials::{CredentialError, extract_credential};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
pub use permissions::{Action, Permission, Resource, Scope};
pub use principal::Principal;
pub use resolver::{
    AuthzError, ResourceOwnership, authorize, authorize_any_scope, authorize_own_resource,
    authorize_resource, authorize_tenant,
};
