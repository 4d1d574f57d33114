//! The counter store abstraction behind fixed-window rate limiting.

use std::time::Duration;

use async_trait::async_trait;

/// Error type for counter store operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Unexpected counter reply: {0}")]
    UnexpectedReply(String),
}

/// A key's window after one hit was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Hits in the current window, including this one.
    pub count: u64,
    /// Time until the window closes and the count starts over.
    pub resets_in: Duration,
}

/// Atomic per-key hit counters with fixed windows.
///
/// A window opens on the first hit for a key and lasts `window`; hits after it
/// closes start a fresh window. Concurrent hits on one key never lose
/// increments.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Records one hit for `key` and returns the window it landed in.
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowState, CacheError>;

    /// Drops the window for `key`.
    async fn reset(&self, key: &str) -> Result<(), CacheError>;
}
