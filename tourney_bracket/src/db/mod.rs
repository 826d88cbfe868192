//! PostgreSQL pool that backs [`PgStore`].
//!
//! [`Database::tournament_store`] hands out a store over the shared pool with
//! the tournament schema applied; the server keeps the [`Database`] itself
//! for health reporting and shutdown.

use std::time::Duration;

use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};

pub mod config;
pub mod timeouts;

pub use config::DatabaseConfig;

use crate::store::{PgStore, StoreResult};
use timeouts::{db_error, with_default_timeout};

/// Snapshot of pool state for the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolHealth {
    /// `SELECT 1` completed within the query timeout
    pub reachable: bool,
    pub connections: u32,
    pub idle: u32,
}

/// Shared PostgreSQL pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the pool with the limits from `config`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tourney_bracket::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let db = Database::new(&DatabaseConfig::from_env()).await?;
    ///     let _store = db.tournament_store().await?;
    ///     println!("reachable: {}", db.health().await.reachable);
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await
            .map_err(db_error)?;

        log::info!(
            "Tournament database pool open ({}..={} connections)",
            config.min_connections,
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Tournament store over this pool, schema applied
    pub async fn tournament_store(&self) -> StoreResult<PgStore> {
        let store = PgStore::new(self.pool.clone());
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health(&self) -> PoolHealth {
        let reachable = with_default_timeout(sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .is_ok();
        PoolHealth {
            reachable,
            connections: self.pool.size(),
            idle: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
        }
    }

    /// Wait for checked-out connections, then close the pool
    pub async fn close(self) {
        self.pool.close().await;
        log::info!("Tournament database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_health_json_shape() {
        let health = PoolHealth {
            reachable: true,
            connections: 4,
            idle: 3,
        };
        let value = serde_json::to_value(health).unwrap();
        assert_eq!(value["reachable"], true);
        assert_eq!(value["connections"], 4);
        assert_eq!(value["idle"], 3);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
    async fn test_store_from_pool_is_migrated() {
        let db = Database::new(&DatabaseConfig::from_env())
            .await
            .expect("Failed to connect to database");
        let store = db.tournament_store().await.expect("Failed to migrate");
        assert!(crate::TournamentStore::tournaments(&store).await.is_ok());

        let health = db.health().await;
        assert!(health.reachable);
        assert!(health.connections >= 1);
        db.close().await;
    }
}
