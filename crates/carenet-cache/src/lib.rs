//! # CareNet Cache
//!
//! Atomic window counters for the CareNet API's rate limiter.
//!
//! This crate provides:
//! - The [`CounterStore`] abstraction
//! - [`MemoryCounterStore`] for single-process deployments and tests
//! - [`RedisCounterStore`] for counters shared across replicas
//! - Redis configuration from environment variables
//! - Counter key generation
//!
//! # Example
//!
//! ```ignore
//! use carenet_cache::{CacheConfig, CounterStore, RedisCounterStore, keys};
//!
//! let config = CacheConfig::from_env();
//! let store = RedisCounterStore::new(&config.redis_url).await?;
//!
//! let key = keys::rate_limit::by_ip("general", "203.0.113.9");
//! let state = store.hit(&key, Duration::from_secs(900)).await?;
//! ```

pub mod config;
pub mod counter;
pub mod keys;
pub mod memory;
pub mod redis;

pub use config::CacheConfig;
pub use counter::{CacheError, CounterStore, WindowState};
pub use memory::MemoryCounterStore;
pub use redis::RedisCounterStore;
