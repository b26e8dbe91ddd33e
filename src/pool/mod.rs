pub mod session;

pub use session::{PooledSession, TxState};

use std::time::Duration;

use deadpool::managed::{PoolError, TimeoutType};
use deadpool_postgres::Pool;
use serde::Serialize;
use tracing::debug;

use crate::error::SqlFixtureError;

/// Bounded pool of `PostgreSQL` connections.
///
/// Cloning is cheap and shares the same underlying pool, so one `DbPool` can be handed to every
/// task that needs the database.
#[derive(Clone)]
pub struct DbPool {
    pool: Pool,
    acquire_timeout: Option<Duration>,
}

impl std::fmt::Debug for DbPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbPool")
            .field("status", &self.status())
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub max_size: usize,
    /// Connections currently open, lent or idle
    pub size: usize,
    /// Idle connections ready to be lent
    pub available: usize,
    /// Callers blocked in `acquire`
    pub waiting: usize,
}

impl DbPool {
    pub(crate) fn from_parts(pool: Pool, acquire_timeout: Option<Duration>) -> Self {
        Self {
            pool,
            acquire_timeout,
        }
    }

    /// How long `acquire` waits before giving up; `None` waits indefinitely.
    #[must_use]
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout
    }

    /// Borrow a connection for exclusive use.
    ///
    /// Waits for an idle connection or for room to open a new one. The connection goes back to
    /// the pool when the session is released or dropped.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::PoolExhausted` if the configured wait timeout elapses and
    /// `SqlFixtureError::ConnectionError` if connecting fails or the pool has been closed.
    pub async fn acquire(&self) -> Result<PooledSession, SqlFixtureError> {
        match self.pool.get().await {
            Ok(client) => {
                debug!(status = ?self.status(), "acquired connection");
                Ok(PooledSession::new(client))
            }
            Err(PoolError::Timeout(TimeoutType::Wait)) => Err(SqlFixtureError::PoolExhausted(
                self.acquire_timeout.unwrap_or_default(),
            )),
            Err(PoolError::Closed) => Err(SqlFixtureError::ConnectionError(
                "pool is closed".to_string(),
            )),
            Err(e) => Err(SqlFixtureError::ConnectionError(format!(
                "failed to obtain a connection: {e}"
            ))),
        }
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    /// Close the pool. Idle connections are dropped now, lent ones when they come back; every
    /// later `acquire` fails.
    pub fn close_all(&self) {
        debug!("closing pool");
        self.pool.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
