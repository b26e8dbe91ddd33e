use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::SqlFixtureError;
use crate::pool::{DbPool, PooledSession};
use crate::query::QueryAndParams;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Anything statements can be sent to: the pool (one connection per call) or a pinned session.
///
/// Fixture code is written against this trait so the same setup runs inside or outside a
/// transaction.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes a single parameterized statement and returns its rows and affected-row count.
    async fn run(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlFixtureError>;

    async fn run_query(&mut self, query: &QueryAndParams) -> Result<ResultSet, SqlFixtureError> {
        self.run(&query.query, &query.params).await
    }

    /// Executes multi-statement SQL text. No parameters are supported.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlFixtureError>;
}

impl DbPool {
    /// Run one statement on a freshly acquired connection and release it afterwards.
    ///
    /// The connection is back in the pool before the result is returned, whether the statement
    /// succeeded or not. Nothing is wrapped in a transaction: use
    /// [`DbPool::with_transaction`] or [`DbPool::run_in_transaction`] for that.
    ///
    /// The text goes to the server unchanged, control statements included. The connection is
    /// reset with `ROLLBACK` on release, so a `BEGIN` sent here ends with this call.
    ///
    /// ```rust,no_run
    /// # use sql_fixture::prelude::*;
    /// # async fn demo(pool: &DbPool) -> Result<(), SqlFixtureError> {
    /// let rs = pool
    ///     .run("SELECT name FROM products WHERE stock > $1", &[RowValues::Int(10)])
    ///     .await?;
    /// for row in &rs.results {
    ///     println!("{:?}", row.get("name"));
    /// }
    /// # Ok(()) }
    /// ```
    ///
    /// # Errors
    /// Returns acquire errors (`PoolExhausted`, `ConnectionError`) and the statement's
    /// `QueryError` unchanged. No retry is attempted.
    pub async fn run(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlFixtureError> {
        let mut session = self.acquire().await?;
        let result = session.run_unchecked(query, params).await;
        session.release().await;
        result
    }

    /// # Errors
    /// Same as [`DbPool::run`].
    pub async fn run_query(&self, query: &QueryAndParams) -> Result<ResultSet, SqlFixtureError> {
        self.run(&query.query, &query.params).await
    }

    /// Run multi-statement SQL text on one connection, reset with `ROLLBACK` on release.
    ///
    /// # Errors
    /// Returns acquire errors and the first failing statement's `QueryError`.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlFixtureError> {
        let mut session = self.acquire().await?;
        let result = session.execute_batch(sql).await;
        session.release().await;
        result
    }

    /// Lend one connection to `f` and release it when `f` finishes, however it finishes.
    ///
    /// ```rust,no_run
    /// # use sql_fixture::prelude::*;
    /// # async fn demo(pool: &DbPool) -> Result<(), SqlFixtureError> {
    /// let count = pool
    ///     .with_connection(|session| {
    ///         Box::pin(async move {
    ///             session.begin().await?;
    ///             session.run("DELETE FROM users WHERE email = $1", &["a@b.c".into()]).await?;
    ///             session.rollback().await?;
    ///             let rs = session.run("SELECT COUNT(*) AS n FROM users", &[]).await?;
    ///             Ok(rs.results[0].get("n").and_then(RowValues::as_int).copied())
    ///         })
    ///     })
    ///     .await?;
    /// # let _ = count;
    /// # Ok(()) }
    /// ```
    ///
    /// # Errors
    /// Returns acquire errors, or whatever `f` returns.
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, SqlFixtureError>
    where
        F: for<'c> FnOnce(&'c mut PooledSession) -> BoxFuture<'c, Result<T, SqlFixtureError>>,
    {
        let mut session = self.acquire().await?;
        let result = f(&mut session).await;
        session.release().await;
        result
    }

    /// Like [`DbPool::with_connection`] inside `BEGIN`: commits when `f` returns `Ok`, rolls back
    /// when it returns `Err`.
    ///
    /// # Errors
    /// Returns acquire errors, `f`'s error (after rollback), or the `COMMIT` failure.
    pub async fn with_transaction<T, F>(&self, f: F) -> Result<T, SqlFixtureError>
    where
        F: for<'c> FnOnce(&'c mut PooledSession) -> BoxFuture<'c, Result<T, SqlFixtureError>>,
    {
        let mut session = self.acquire().await?;
        if let Err(e) = session.begin().await {
            session.release().await;
            return Err(e);
        }
        let result = f(&mut session).await;
        let outcome = finish(&mut session, result).await;
        session.release().await;
        outcome
    }

    /// Run `statements` in order on one connection inside a single transaction.
    ///
    /// Either every statement's result is returned and the transaction committed, or the first
    /// failure is returned and nothing persists.
    ///
    /// # Errors
    /// Returns acquire errors, the first failing statement's error, or the `COMMIT` failure.
    pub async fn run_in_transaction(
        &self,
        statements: &[QueryAndParams],
    ) -> Result<Vec<ResultSet>, SqlFixtureError> {
        let mut session = self.acquire().await?;
        if let Err(e) = session.begin().await {
            session.release().await;
            return Err(e);
        }
        let mut results = Vec::with_capacity(statements.len());
        let mut failure = None;
        for (idx, statement) in statements.iter().enumerate() {
            match session.run_query(statement).await {
                Ok(rs) => results.push(rs),
                Err(e) => {
                    debug!(statement = idx, error = %e, "statement failed inside transaction");
                    failure = Some(e);
                    break;
                }
            }
        }
        let outcome = finish(&mut session, failure.map_or(Ok(results), Err)).await;
        session.release().await;
        outcome
    }
}

/// Commit on success, roll back on failure. A rollback failure is logged; the original error
/// wins and release discards the connection if it is still inside the transaction.
async fn finish<T>(
    session: &mut PooledSession,
    result: Result<T, SqlFixtureError>,
) -> Result<T, SqlFixtureError> {
    match result {
        Ok(value) if session.in_transaction() => {
            session.commit().await?;
            Ok(value)
        }
        // The closure already ended the transaction itself.
        Ok(value) => Ok(value),
        Err(e) => {
            if session.in_transaction()
                && let Err(rollback_err) = session.rollback().await
            {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(e)
        }
    }
}

impl PooledSession {
    /// # Errors
    /// Same as [`PooledSession::run`].
    pub async fn run_query(
        &mut self,
        query: &QueryAndParams,
    ) -> Result<ResultSet, SqlFixtureError> {
        self.run(&query.query, &query.params).await
    }
}

#[async_trait]
impl QueryExecutor for DbPool {
    async fn run(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlFixtureError> {
        DbPool::run(self, query, params).await
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlFixtureError> {
        DbPool::execute_batch(self, sql).await
    }
}

#[async_trait]
impl QueryExecutor for PooledSession {
    async fn run(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlFixtureError> {
        PooledSession::run(self, query, params).await
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlFixtureError> {
        PooledSession::execute_batch(self, sql).await
    }
}
