//! Redis-backed counter store shared by every replica.
//!
//! Each hit runs one Lua script so the increment, the expiry on first hit, and
//! the remaining-time read happen atomically on the server.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use tracing::{debug, instrument};

use crate::counter::{CacheError, CounterStore, WindowState};

const HIT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
  ttl = tonumber(ARGV[1])
end
return {count, ttl}
"#;

/// Redis counter store with connection pooling.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    script: Script,
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore").finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if connection fails.
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            script: Script::new(HIT_SCRIPT),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    #[instrument(skip(self), fields(cache.operation = "RATE_LIMIT_HIT"))]
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowState, CacheError> {
        let mut conn = self.conn.clone();
        let window_ms = window.as_millis().max(1) as u64;

        let (count, ttl_ms): (i64, i64) = self
            .script
            .key(key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        if count < 1 {
            return Err(CacheError::UnexpectedReply(format!(
                "INCR returned {count} for {key}"
            )));
        }

        debug!(cache.key = %key, count, ttl_ms, "Rate limit hit recorded");

        Ok(WindowState {
            count: count as u64,
            resets_in: Duration::from_millis(ttl_ms.max(0) as u64),
        })
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn reset(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
