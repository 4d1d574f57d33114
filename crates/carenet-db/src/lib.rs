//! # CareNet DB
//!
//! Database pool initialization for the CareNet API.
//!
//! This crate creates the PostgreSQL connection pool used by the
//! Postgres-backed store, using SQLx.
//!
//! # Example
//!
//! ```ignore
//! use carenet_db::{DbConfig, init_db_pool};
//!
//! let pool = init_db_pool(&DbConfig::new(database_url)).await?;
//! ```

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Pool sizing and connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Initializes a PostgreSQL connection pool.
///
/// This function should typically be called once during application startup.
/// The returned pool is cheaply cloneable and is handed to the store.
///
/// # Errors
///
/// Returns the driver error if the database cannot be reached.
pub async fn init_db_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await?;

    tracing::info!(max_connections = config.max_connections, "Database pool ready");

    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
