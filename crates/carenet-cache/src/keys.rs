//! Counter key generation.
//!
//! Keys are namespaced so several limits can share one store without their
//! windows colliding.

use uuid::Uuid;

/// Prefix for all keys to avoid collisions with other Redis users.
const CACHE_PREFIX: &str = "carenet";

fn build_key(parts: &[&str]) -> String {
    format!("{}:{}", CACHE_PREFIX, parts.join(":"))
}

/// Keys for fixed-window rate limit counters.
pub mod rate_limit {
    use super::*;

    /// Counter for a client address under the named limit.
    pub fn by_ip(scope: &str, ip: &str) -> String {
        build_key(&["ratelimit", scope, "ip", ip])
    }

    /// Counter for an authenticated principal under the named limit.
    pub fn by_principal(scope: &str, principal_id: Uuid) -> String {
        build_key(&["ratelimit", scope, "user", &principal_id.to_string()])
    }
}
