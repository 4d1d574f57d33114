//! Shared helpers for the route handlers.
//!
//! - [`auth_helpers`]: listing scopes and tenant selection for a principal

pub mod auth_helpers;
