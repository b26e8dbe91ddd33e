use deadpool_postgres::Object;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::SqlFixtureError;
use crate::postgres::run_on_client;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Transaction state of a [`PooledSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    InTransaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxControl {
    Begin,
    Commit,
    Rollback,
}

impl TxControl {
    /// Recognise a lone transaction-control statement.
    ///
    /// `ROLLBACK TO SAVEPOINT`, `COMMIT PREPARED` and multi-statement text are ordinary SQL.
    pub(crate) fn parse(sql: &str) -> Option<Self> {
        let stmt = sql.trim().trim_end_matches(';').trim_end();
        if stmt.contains(';') {
            return None;
        }
        let mut words = stmt.split_whitespace().map(str::to_ascii_uppercase);
        let first = words.next()?;
        let rest: Vec<String> = words.collect();
        let only_noise = rest.len() <= 1
            && rest
                .first()
                .is_none_or(|w| w == "WORK" || w == "TRANSACTION");

        match first.as_str() {
            // BEGIN accepts transaction modes (ISOLATION LEVEL ..., READ ONLY)
            "BEGIN" => Some(TxControl::Begin),
            "START" if rest.first().is_some_and(|w| w == "TRANSACTION") => Some(TxControl::Begin),
            "COMMIT" | "END" if only_noise => Some(TxControl::Commit),
            "ROLLBACK" | "ABORT" if only_noise => Some(TxControl::Rollback),
            _ => None,
        }
    }
}

/// A connection borrowed from a [`crate::DbPool`], lent to one caller until released.
///
/// All statements run on the same physical connection in call order, which is what makes
/// `BEGIN ... COMMIT` sequences work. Releasing (or dropping) a session that is still inside a
/// transaction rolls the transaction back before the connection can be lent again.
///
/// `TxState` only tracks control statements the session recognises. Batches and text it cannot
/// classify mark the session so that `release` sends `ROLLBACK` regardless, and the pool's
/// recycle step issues one more before the connection is lent again.
pub struct PooledSession {
    client: Option<Object>,
    state: TxState,
    reset_on_release: bool,
}

impl std::fmt::Debug for PooledSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledSession")
            .field("state", &self.state)
            .field("reset_on_release", &self.reset_on_release)
            .finish_non_exhaustive()
    }
}

impl PooledSession {
    pub(crate) fn new(client: Object) -> Self {
        Self {
            client: Some(client),
            state: TxState::Idle,
            reset_on_release: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.state == TxState::InTransaction
    }

    fn client(&self) -> Result<&Object, SqlFixtureError> {
        self.client
            .as_ref()
            .ok_or_else(|| SqlFixtureError::ExecutionError("session already released".to_string()))
    }

    /// Run one parameterized statement on this connection.
    ///
    /// Transaction-control text (`BEGIN`, `COMMIT`, `ROLLBACK` and their synonyms) goes through
    /// [`PooledSession::begin`]/[`commit`](PooledSession::commit)/[`rollback`](PooledSession::rollback)
    /// so the session always knows whether it holds an open transaction.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::QueryError` if the statement fails and
    /// `SqlFixtureError::TransactionState` for control statements issued in the wrong state.
    pub async fn run(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlFixtureError> {
        if let Some(control) = TxControl::parse(query) {
            if !params.is_empty() {
                return Err(SqlFixtureError::ParameterError(format!(
                    "transaction control statement takes no parameters: {query}"
                )));
            }
            self.control(control, query).await?;
            return Ok(ResultSet::default());
        }
        debug!(sql = query, params = params.len(), "run");
        run_on_client(self.client()?, query, params).await
    }

    /// Send `query` to the server as is, without transaction bookkeeping.
    ///
    /// The session is reset with `ROLLBACK` on release, so whatever the text opened does not
    /// outlive this borrow.
    pub(crate) async fn run_unchecked(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlFixtureError> {
        self.reset_on_release = true;
        debug!(sql = query, params = params.len(), "run unchecked");
        run_on_client(self.client()?, query, params).await
    }

    /// Run multi-statement text without parameters (simple query protocol).
    ///
    /// The text is not inspected, so a batch that opens a transaction is rolled back on
    /// release unless the session closes it first.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::QueryError` if any statement fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlFixtureError> {
        self.reset_on_release = true;
        debug!(bytes = sql.len(), "execute batch");
        self.client()?.batch_execute(sql).await?;
        Ok(())
    }

    /// # Errors
    /// Returns `SqlFixtureError::TransactionState` if a transaction is already open.
    pub async fn begin(&mut self) -> Result<(), SqlFixtureError> {
        self.control(TxControl::Begin, "BEGIN").await
    }

    /// # Errors
    /// Returns `SqlFixtureError::TransactionState` if no transaction is open, or the
    /// database error if `COMMIT` fails.
    pub async fn commit(&mut self) -> Result<(), SqlFixtureError> {
        self.control(TxControl::Commit, "COMMIT").await
    }

    /// # Errors
    /// Returns `SqlFixtureError::TransactionState` if no transaction is open, or the
    /// database error if `ROLLBACK` fails.
    pub async fn rollback(&mut self) -> Result<(), SqlFixtureError> {
        self.control(TxControl::Rollback, "ROLLBACK").await
    }

    async fn control(&mut self, control: TxControl, sql: &str) -> Result<(), SqlFixtureError> {
        let next = match (self.state, control) {
            (TxState::Idle, TxControl::Begin) => TxState::InTransaction,
            (TxState::InTransaction, TxControl::Commit | TxControl::Rollback) => TxState::Idle,
            (TxState::InTransaction, TxControl::Begin) => {
                return Err(SqlFixtureError::TransactionState(
                    "transaction already in progress".to_string(),
                ));
            }
            (TxState::Idle, _) => {
                return Err(SqlFixtureError::TransactionState(format!(
                    "no transaction in progress for {sql}"
                )));
            }
        };
        // State moves only once the server acknowledged, so a failed COMMIT still rolls back
        // on release.
        self.client()?.simple_query(sql).await?;
        debug!(from = ?self.state, to = ?next, "transaction state");
        self.state = next;
        Ok(())
    }

    /// Hand the connection back to the pool, rolling back an open transaction first.
    ///
    /// If that `ROLLBACK` fails the connection is closed instead of returned; the error is
    /// logged.
    pub async fn release(mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        let tracked = self.state == TxState::InTransaction;
        if tracked || self.reset_on_release {
            if tracked {
                warn!("releasing session with an open transaction, rolling back");
            }
            if let Err(e) = client.simple_query("ROLLBACK").await {
                warn!(error = %e, "rollback on release failed, discarding connection");
                drop(Object::take(client));
                return;
            }
        }
        debug!("released connection");
        drop(client);
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        if self.state == TxState::InTransaction
            && let Some(client) = self.client.take()
        {
            match Handle::try_current() {
                Ok(handle) => {
                    warn!("session dropped with an open transaction, rolling back");
                    handle.spawn(async move {
                        if let Err(e) = client.simple_query("ROLLBACK").await {
                            warn!(error = %e, "rollback after drop failed, discarding connection");
                            drop(Object::take(client));
                        }
                    });
                }
                Err(_) => {
                    warn!("session dropped outside a runtime with an open transaction, discarding connection");
                    drop(Object::take(client));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_begin_forms() {
        assert_eq!(TxControl::parse("BEGIN"), Some(TxControl::Begin));
        assert_eq!(TxControl::parse("  begin;  "), Some(TxControl::Begin));
        assert_eq!(
            TxControl::parse("BEGIN ISOLATION LEVEL SERIALIZABLE"),
            Some(TxControl::Begin)
        );
        assert_eq!(TxControl::parse("start transaction"), Some(TxControl::Begin));
    }

    #[test]
    fn recognises_commit_and_rollback_synonyms() {
        assert_eq!(TxControl::parse("COMMIT"), Some(TxControl::Commit));
        assert_eq!(TxControl::parse("end work"), Some(TxControl::Commit));
        assert_eq!(TxControl::parse("ROLLBACK;"), Some(TxControl::Rollback));
        assert_eq!(TxControl::parse("abort transaction"), Some(TxControl::Rollback));
    }

    #[test]
    fn savepoints_and_batches_are_plain_sql() {
        assert_eq!(TxControl::parse("ROLLBACK TO SAVEPOINT sp1"), None);
        assert_eq!(TxControl::parse("COMMIT PREPARED 'tx1'"), None);
        assert_eq!(TxControl::parse("BEGIN; INSERT INTO users VALUES (1)"), None);
        assert_eq!(TxControl::parse("SELECT 1"), None);
        assert_eq!(TxControl::parse(""), None);
        assert_eq!(TxControl::parse("START"), None);
    }
}
