use crate::types::RowValues;

/// A SQL string and its bound parameters bundled together.
///
/// The unit of work for [`crate::DbPool::run_in_transaction`] and
/// [`crate::QueryExecutor::run_query`]:
/// ```rust
/// use sql_fixture::prelude::*;
///
/// let qp = QueryAndParams::new(
///     "INSERT INTO users (name, email) VALUES ($1, $2)",
///     vec![RowValues::Text("Alice".into()), RowValues::Text("alice@example.com".into())],
/// );
/// # let _ = qp;
/// ```
#[derive(Debug, Clone)]
pub struct QueryAndParams {
    /// The SQL query string
    pub query: String,
    /// The parameters to be bound to the query
    pub params: Vec<RowValues>,
}

impl QueryAndParams {
    /// Create a new `QueryAndParams` with the given query string and parameters
    ///
    /// # Arguments
    ///
    /// * `query` - The SQL query string
    /// * `params` - The parameters to bind to the query
    pub fn new(query: impl Into<String>, params: Vec<RowValues>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }

    /// Create a new `QueryAndParams` with no parameters
    pub fn new_without_params(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: Vec::new(),
        }
    }
}
