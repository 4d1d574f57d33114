//! Redis connection configuration.

use std::env;

/// Redis settings loaded from environment variables.
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub redis_url: String,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
        }
    }
}
