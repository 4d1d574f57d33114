use std::sync::Arc;

use anyhow::Context;
use carenet_cache::{CacheConfig, CounterStore, MemoryCounterStore, RedisCounterStore};
use carenet_config::{CorsConfig, JwtConfig, RateLimitBackend, RateLimitConfig, ServerConfig};
use carenet_db::{DbConfig, init_db_pool, run_migrations};
use tracing::info;

use crate::store::{CareStore, MemoryStore, PgStore};

/// Shared per-process state. Every collaborator is injected here; nothing
/// is reached through a global.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CareStore>,
    pub counters: Arc<dyn CounterStore>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
}

impl AppState {
    /// State with default configuration over the given backends.
    pub fn new(store: Arc<dyn CareStore>, counters: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            counters,
            jwt_config: JwtConfig::default(),
            cors_config: CorsConfig::default(),
            rate_limit_config: RateLimitConfig::default(),
        }
    }
}

pub async fn init_app_state(server: &ServerConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn CareStore> = match &server.database_url {
        Some(url) => {
            let pool = init_db_pool(&DbConfig::new(url.as_str()))
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let rate_limit_config = RateLimitConfig::from_env();
    let counters: Arc<dyn CounterStore> = match rate_limit_config.backend {
        RateLimitBackend::Redis => {
            let cache = CacheConfig::from_env();
            Arc::new(
                RedisCounterStore::new(&cache.redis_url)
                    .await
                    .context("Failed to connect to Redis")?,
            )
        }
        RateLimitBackend::Memory => Arc::new(MemoryCounterStore::new()),
    };

    info!(
        store = store.backend_name(),
        counters = ?rate_limit_config.backend,
        "Application state ready"
    );

    Ok(AppState {
        store,
        counters,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config,
    })
}
