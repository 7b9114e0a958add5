//! Database connection and pool management for Rentwear
//!
//! PostgreSQL pooling, embedded migrations and health probing.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

/// Attempts made before giving up on the database at startup
const CONNECT_ATTEMPTS: u32 = 5;

/// Database connection error
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Failed to run migrations: {0}")]
    MigrationError(String),

    #[error("Database health check failed: {0}")]
    HealthCheckError(String),
}

fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
}

/// Create a database connection pool, retrying with backoff while the
/// database comes up.
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!("Connecting to database at {}", config.database_url_masked());

    let mut delay = Duration::from_millis(500);
    let mut attempt = 1;
    loop {
        match pool_options(config.db_max_connections)
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!(attempt, "Database connection pool created");
                return Ok(pool);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(attempt, "Database not reachable yet: {}", e);
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(DbError::ConnectionError(e.to_string())),
        }
    }
}

/// Pool that connects on first use; for routers whose requests never reach
/// the database.
pub fn lazy_pool(database_url: &str) -> Result<PgPool, DbError> {
    pool_options(1)
        .connect_lazy(database_url)
        .map_err(|e| DbError::ConnectionError(e.to_string()))
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationError(e.to_string()))?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Check database connectivity (for health checks)
pub async fn check_health(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| DbError::HealthCheckError(e.to_string()))?;

    Ok(())
}
