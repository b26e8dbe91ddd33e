//! Connection settings read once at process start.

use std::time::Duration;

use deadpool_postgres::{Config as PgConfig, ManagerConfig, PoolConfig, RecyclingMethod};
use serde::Serialize;

use crate::error::SqlFixtureError;

pub const ENV_USER: &str = "DB_USER";
pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_NAME: &str = "DB_NAME";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_POOL_MAX_SIZE: &str = "DB_POOL_MAX_SIZE";
pub const ENV_POOL_TIMEOUT_MS: &str = "DB_POOL_TIMEOUT_MS";

/// Pool size used when `DB_POOL_MAX_SIZE` is not set.
pub const DEFAULT_MAX_SIZE: usize = 10;

/// Run on every idle connection before it is lent again.
pub const RECYCLE_SQL: &str = "ROLLBACK";

/// Credentials, address and pool bounds for one database.
#[derive(Clone, Serialize)]
pub struct FixtureConfig {
    pub user: String,
    pub host: String,
    pub dbname: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub port: u16,
    /// Upper bound on simultaneously lent connections.
    pub max_size: usize,
    /// How long `acquire` waits for a free connection; `None` waits indefinitely.
    pub acquire_timeout: Option<Duration>,
}

impl std::fmt::Debug for FixtureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureConfig")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("dbname", &self.dbname)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("max_size", &self.max_size)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl FixtureConfig {
    /// Settings with the default pool bounds.
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            dbname: dbname.into(),
            password: password.into(),
            port,
            max_size: DEFAULT_MAX_SIZE,
            acquire_timeout: None,
        }
    }

    /// Read `DB_USER`, `DB_HOST`, `DB_NAME`, `DB_PASSWORD`, `DB_PORT` and the optional
    /// `DB_POOL_MAX_SIZE` / `DB_POOL_TIMEOUT_MS` from the process environment.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::ConfigError` if a required variable is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, SqlFixtureError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FixtureConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::ConfigError` if a required key is missing or a numeric key does
    /// not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SqlFixtureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SqlFixtureError::ConfigError(format!("{key} is required")))
        };

        let port = parse_number::<u16>(ENV_PORT, &required(ENV_PORT)?)?;
        let max_size = match lookup(ENV_POOL_MAX_SIZE) {
            Some(raw) => parse_number::<usize>(ENV_POOL_MAX_SIZE, &raw)?,
            None => DEFAULT_MAX_SIZE,
        };
        if max_size == 0 {
            return Err(SqlFixtureError::ConfigError(format!(
                "{ENV_POOL_MAX_SIZE} must be at least 1"
            )));
        }
        let acquire_timeout = lookup(ENV_POOL_TIMEOUT_MS)
            .map(|raw| parse_number::<u64>(ENV_POOL_TIMEOUT_MS, &raw))
            .transpose()?
            .map(Duration::from_millis);

        Ok(Self {
            user: required(ENV_USER)?,
            host: required(ENV_HOST)?,
            dbname: required(ENV_NAME)?,
            password: lookup(ENV_PASSWORD).unwrap_or_default(),
            port,
            max_size,
            acquire_timeout,
        })
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// The equivalent `deadpool_postgres` configuration, pool bounds included.
    ///
    /// Recycling sends [`RECYCLE_SQL`], so a connection never reaches its next borrower inside a
    /// transaction.
    #[must_use]
    pub fn to_pg_config(&self) -> PgConfig {
        let mut cfg = PgConfig::new();
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Custom(RECYCLE_SQL.to_string()),
        });
        let mut pool = PoolConfig::new(self.max_size);
        pool.timeouts.wait = self.acquire_timeout;
        cfg.pool = Some(pool);
        cfg
    }

    /// `postgres://user@host:port/dbname`, password omitted.
    #[must_use]
    pub fn display_url(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{}",
            self.user, self.host, self.port, self.dbname
        )
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T, SqlFixtureError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| SqlFixtureError::ConfigError(format!("{key}={raw:?} is not valid: {e}")))
}
