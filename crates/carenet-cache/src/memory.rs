//! Process-local counter store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::counter::{CacheError, CounterStore, WindowState};

/// Expired windows are swept once every this many hits.
const PURGE_INTERVAL: u64 = 1024;

#[derive(Debug)]
struct Window {
    count: u64,
    reset_at: Instant,
}

/// Counters held in this process. Suitable for a single replica and tests.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<String, Window>>,
    hits: AtomicU64,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked, expired or not.
    pub async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes every window that has closed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| w.reset_at > now);
        before - windows.len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowState, CacheError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        if self.hits.fetch_add(1, Ordering::Relaxed) % PURGE_INTERVAL == PURGE_INTERVAL - 1 {
            let before = windows.len();
            windows.retain(|_, w| w.reset_at > now);
            debug!(purged = before - windows.len(), "Purged expired rate limit windows");
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + window,
        });

        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + window;
        }

        entry.count += 1;

        Ok(WindowState {
            count: entry.count,
            resets_in: entry.reset_at.saturating_duration_since(now),
        })
    }

    async fn reset(&self, key: &str) -> Result<(), CacheError> {
        self.windows.lock().await.remove(key);
        Ok(())
    }
}
