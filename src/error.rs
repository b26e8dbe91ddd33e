use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Debug, Error)]
pub enum SqlFixtureError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Pool exhausted: no connection became available within {0:?}")]
    PoolExhausted(Duration),

    #[error(transparent)]
    QueryError(#[from] QueryError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("Transaction state error: {0}")]
    TransactionState(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl SqlFixtureError {
    /// The statement failure, if this error came from the database.
    #[must_use]
    pub fn as_query_error(&self) -> Option<&QueryError> {
        match self {
            SqlFixtureError::QueryError(err) => Some(err),
            _ => None,
        }
    }

    /// Classified kind of a statement failure; `None` for pool, config and state errors.
    #[must_use]
    pub fn query_kind(&self) -> Option<QueryErrorKind> {
        self.as_query_error().map(QueryError::kind)
    }
}

impl From<tokio_postgres::Error> for SqlFixtureError {
    fn from(err: tokio_postgres::Error) -> Self {
        SqlFixtureError::QueryError(QueryError::from(err))
    }
}

/// Constraint class of a rejected statement, derived from the SQLSTATE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// `23505`: a unique index or constraint already holds the value.
    UniqueViolation,
    /// `23502`: a `NOT NULL` column received no value.
    NotNullViolation,
    Other,
}

impl QueryErrorKind {
    #[must_use]
    pub fn from_sqlstate(code: &SqlState) -> Self {
        if *code == SqlState::UNIQUE_VIOLATION {
            QueryErrorKind::UniqueViolation
        } else if *code == SqlState::NOT_NULL_VIOLATION {
            QueryErrorKind::NotNullViolation
        } else {
            QueryErrorKind::Other
        }
    }
}

/// A statement the database rejected or could not complete.
///
/// `Display` is the engine's own message (for example
/// `duplicate key value violates unique constraint "users_email_key"`), so callers that only
/// have the text still see what the server said. Prefer [`QueryError::kind`] for decisions.
#[derive(Debug, Clone)]
pub struct QueryError {
    kind: QueryErrorKind,
    code: Option<String>,
    message: String,
    constraint: Option<String>,
    column: Option<String>,
}

impl QueryError {
    /// Build an error that did not come from a server response (driver or transport failure).
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Other,
            code: None,
            message: message.into(),
            constraint: None,
            column: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> QueryErrorKind {
        self.kind
    }

    /// Five-character SQLSTATE code, when the server supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }

    #[must_use]
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for QueryError {}

impl From<tokio_postgres::Error> for QueryError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db) => Self {
                kind: QueryErrorKind::from_sqlstate(db.code()),
                code: Some(db.code().code().to_string()),
                message: db.message().to_string(),
                constraint: db.constraint().map(str::to_string),
                column: db.column().map(str::to_string),
            },
            // No server response: closed connection, protocol or conversion failure.
            None => Self::other(err.to_string()),
        }
    }
}
