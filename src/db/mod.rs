//! Database connection management

mod context;

pub use context::OperationContext;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(database_url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            "PostgreSQL connection pool established"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A query that must yield exactly one row did not.
///
/// Always a schema invariant violation, never a caller mistake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowCountError {
    #[error("{0}: no row found")]
    NotFound(&'static str),

    #[error("{0}: expected exactly one row, got {1}")]
    TooManyRows(&'static str, usize),
}

/// Take the single element of `rows`, naming the lookup in the error.
pub fn exactly_one<T>(mut rows: Vec<T>, what: &'static str) -> Result<T, RowCountError> {
    match rows.len() {
        0 => Err(RowCountError::NotFound(what)),
        1 => Ok(rows.remove(0)),
        n => Err(RowCountError::TooManyRows(what, n)),
    }
}
