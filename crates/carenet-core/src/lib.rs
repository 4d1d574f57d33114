//! # CareNet Core
//!
//! Core types shared by every CareNet crate.
//!
//! - [`errors`]: the [`AppError`] taxonomy and its JSON response body
//! - [`role`]: the six platform roles
//!
//! # Example
//!
//! ```ignore
//! use carenet_core::{AppError, ErrorCode, Role};
//!
//! let denied = AppError::forbidden(ErrorCode::ForbiddenRole, "insufficient role");
//! let role: Role = "GUARDIAN".parse()?;
//! ```

pub mod errors;
pub mod role;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use role::Role;
