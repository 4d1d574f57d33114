//! Request processing for the API.
//!
//! Cross-cutting concerns are not nested by hand. Each route declares a
//! [`pipeline::Pipeline`] and the dispatcher runs its stages in a fixed
//! order:
//!
//! 1. request logging
//! 2. error handler (panic boundary)
//! 3. CORS
//! 4. rate limiting by client IP
//! 5. authentication (required, or optional for routes that serve anonymous
//!    callers too)
//! 6. rate limiting by principal
//! 7. authorization (roles, resource permissions, record ownership)
//!
//! # Modules
//!
//! - [`pipeline`]: stage declarations, the builder and the dispatcher
//! - [`auth`]: credential verification and the [`auth::AuthUser`] extractor
//! - [`authorize`]: role, resource and own-resource checks
//! - [`cors`]: preflight handling and response headers
//! - [`rate_limit`]: fixed-window throttling on the shared counter store
//! - [`recover`]: turns handler panics into 500 responses
//!
//! # Example
//!
//! ```ignore
//! let read_one = base
//!     .clone()
//!     .with_own_resource_auth(Resource::Jobs, Action::Read, "job_id")
//!     .build();
//!
//! Router::new().route("/{job_id}", get(get_job.layer(read_one.layer(&state))));
//! ```

pub mod auth;
pub mod authorize;
pub mod cors;
pub mod pipeline;
pub mod rate_limit;
pub mod recover;
