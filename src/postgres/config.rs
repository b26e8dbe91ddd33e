use deadpool_postgres::{Config as PgConfig, ManagerConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

use crate::config::{FixtureConfig, RECYCLE_SQL};
use crate::error::SqlFixtureError;
use crate::pool::DbPool;

impl DbPool {
    /// Build a pool from fixture settings. No connection is opened until the first acquire.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::ConfigError` if required settings are empty or
    /// `SqlFixtureError::ConnectionError` if pool creation fails.
    pub fn open(config: &FixtureConfig) -> Result<Self, SqlFixtureError> {
        if config.max_size == 0 {
            return Err(SqlFixtureError::ConfigError(
                "max_size must be at least 1".to_string(),
            ));
        }
        let pool = Self::from_pg_config(config.to_pg_config())?;
        info!(url = %config.display_url(), max_size = config.max_size, "opened pool");
        Ok(pool)
    }

    /// Build a pool from a raw `deadpool_postgres` config.
    ///
    /// A config without a manager section gets the `ROLLBACK` recycle step.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::ConfigError` if required config fields are missing or
    /// `SqlFixtureError::ConnectionError` if pool creation fails.
    pub fn from_pg_config(mut pg_config: PgConfig) -> Result<Self, SqlFixtureError> {
        // Validate all required config fields are present
        if pg_config.dbname.as_deref().is_none_or(str::is_empty) {
            return Err(SqlFixtureError::ConfigError(
                "dbname is required".to_string(),
            ));
        }
        if pg_config.host.as_deref().is_none_or(str::is_empty) {
            return Err(SqlFixtureError::ConfigError(
                "host is required".to_string(),
            ));
        }
        if pg_config.port.is_none() {
            return Err(SqlFixtureError::ConfigError(
                "port is required".to_string(),
            ));
        }
        if pg_config.user.as_deref().is_none_or(str::is_empty) {
            return Err(SqlFixtureError::ConfigError(
                "user is required".to_string(),
            ));
        }
        if pg_config.password.is_none() {
            return Err(SqlFixtureError::ConfigError(
                "password is required".to_string(),
            ));
        }

        if pg_config.manager.is_none() {
            pg_config.manager = Some(ManagerConfig {
                recycling_method: RecyclingMethod::Custom(RECYCLE_SQL.to_string()),
            });
        }

        let acquire_timeout = pg_config.pool.as_ref().and_then(|p| p.timeouts.wait);

        let pg_pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| {
                SqlFixtureError::ConnectionError(format!("Failed to create Postgres pool: {e}"))
            })?;

        Ok(DbPool::from_parts(pg_pool, acquire_timeout))
    }
}
