use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::{ConfigError, DatabaseConfig};

/// Errors from DatabaseManager and the queries built on it
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Lazily-connected pool for the hosted Postgres database.
///
/// The pool is created on first use so the service starts (and serves the
/// local-auth paths) without a reachable database.
pub struct DatabaseManager {
    config: DatabaseConfig,
    pool: RwLock<Option<PgPool>>,
}

impl DatabaseManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.require_url().is_ok()
    }

    /// Get the existing pool or create it
    pub async fn pool(&self) -> Result<PgPool, DatabaseError> {
        // Fast path: try read lock
        {
            let pool = self.pool.read().await;
            if let Some(pool) = pool.as_ref() {
                return Ok(pool.clone());
            }
        }

        let url = self.config.require_url()?;

        let mut slot = self.pool.write().await;
        // Another task may have connected while we waited for the write lock
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(self.config.connection_timeout.max(1)))
            .connect(url)
            .await?;

        *slot = Some(pool.clone());
        info!("Created database pool ({} max connections)", self.config.max_connections);
        Ok(pool)
    }

    /// Pings the database to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_url_is_a_configuration_error() {
        let manager = DatabaseManager::new(DatabaseConfig::default());
        assert!(!manager.is_configured());

        match manager.pool().await {
            Err(DatabaseError::Config(ConfigError::Missing(name))) => assert_eq!(name, "DATABASE_URL"),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }
}
