//! Postgres connection pool and the per-entity query modules that sit on
//! top of it. Mirrors the teacher's pool-setup shape (env-tunable sizing,
//! `after_connect` search_path, `PoolStats`) without its repository-trait
//! layer, which this crate's smaller entity set doesn't need.

pub mod containers;
pub mod issues;
pub mod jobs;
pub mod libraries;
pub mod people;
pub mod progress;
pub mod series_volumes;
pub mod settings;
pub mod users;

use std::fmt;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::error::{CoreError, Result};

/// Snapshot of pool occupancy, surfaced on `GET /healthz` (§10/§11).
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
    pub min_size: u32,
}

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
    max_connections: u32,
    min_connections: u32,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl Db {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or_else(|| num_cpus::get() as u32);
        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(2);

        let connect_options: PgConnectOptions = database_url
            .parse()
            .map_err(|e| CoreError::Internal(format!("invalid database url: {e}")))?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| CoreError::Internal(format!("database connection failed: {e}")))?;

        tracing::info!(max_connections, min_connections, "database pool initialized");

        Ok(Self {
            pool,
            max_connections,
            min_connections,
        })
    }

    /// Wraps a pool a test harness already provisioned (e.g. via
    /// `#[sqlx::test]`), skipping the env-driven sizing `connect` does.
    pub fn from_pool(pool: PgPool) -> Self {
        let max_connections = pool.size();
        Self { pool, max_connections, min_connections: 0 }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::Internal(format!("migration failed: {e}")))
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.max_connections,
            min_size: self.min_connections,
        }
    }
}
