//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::FixtureConfig;
pub use crate::error::{QueryError, QueryErrorKind, SqlFixtureError};
pub use crate::executor::QueryExecutor;
pub use crate::pool::{DbPool, PoolStatus, PooledSession, TxState};
pub use crate::query::QueryAndParams;
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::types::RowValues;
