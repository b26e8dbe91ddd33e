//! Pooled `PostgreSQL` executor and fixture harness for a `users`/`products` test schema.
//!
//! Every statement goes through an explicitly constructed [`DbPool`]: one-shot statements with
//! [`DbPool::run`], multi-statement transactions on a pinned connection with
//! [`DbPool::with_connection`], [`DbPool::with_transaction`] or [`DbPool::run_in_transaction`].
//!
//! ```rust,no_run
//! use sql_fixture::prelude::*;
//! use sql_fixture::fixture::{queries, schema};
//!
//! # async fn demo() -> Result<(), SqlFixtureError> {
//! let mut pool = DbPool::open(&FixtureConfig::from_env()?)?;
//! schema::reset(&mut pool).await?;
//!
//! pool.run(
//!     queries::INSERT_USER,
//!     &[RowValues::Text("Bob".into()), RowValues::Text("bob@example.com".into())],
//! )
//! .await?;
//! let rs = pool
//!     .run(queries::SELECT_USER_BY_EMAIL, &[RowValues::Text("bob@example.com".into())])
//!     .await?;
//! assert_eq!(rs.results[0].get("name").and_then(RowValues::as_text), Some("Bob"));
//!
//! pool.close_all();
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod fixture;
pub mod pool;
pub mod postgres;
pub mod prelude;
pub mod query;
pub mod results;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::FixtureConfig;
pub use error::{QueryError, QueryErrorKind, SqlFixtureError};
pub use executor::QueryExecutor;
pub use pool::{DbPool, PoolStatus, PooledSession, TxState};
pub use query::QueryAndParams;
pub use results::{CustomDbRow, ResultSet};
pub use types::RowValues;
