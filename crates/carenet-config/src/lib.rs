//! # CareNet Config
//!
//! Configuration types for the CareNet API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`jwt`]: JWT verification and issuing configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) policy
//! - [`rate_limit`]: fixed-window rate limiting tiers
//! - [`server`]: listener addresses and storage selection
//!
//! # Example
//!
//! ```ignore
//! use carenet_config::{CorsConfig, JwtConfig, RateLimitConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::{RateLimitBackend, RateLimitConfig, WindowLimit};
pub use server::ServerConfig;
