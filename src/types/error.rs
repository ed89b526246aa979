//! Error types for query parsing and evaluation.
//!
//! Uses `thiserror` for error definitions with automatic `From` implementations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors raised while building or applying a query.
///
/// Construction of a [`RecordFilter`](crate::RecordFilter) fails with
/// `InvalidToken` or `UnexpectedToken`. Evaluating a record fails with
/// `UnrecognisedReference` or `TypeMismatch`.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A span of query text is not a valid token
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token stream does not match the grammar at this point
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// A reference names a field the record does not have
    #[error("Unrecognised reference: {0}")]
    UnrecognisedReference(String),

    /// An ordering comparator was applied to operands that cannot be ordered
    #[error("Type mismatch: cannot apply '{comparator}' to {left} and {right}")]
    TypeMismatch {
        comparator: String,
        left: String,
        right: String,
    },

    /// The collection handed to the filter does not fit the query
    #[error("Invalid collection: {0}")]
    InvalidCollection(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    /// Whether this error was raised while evaluating a single record.
    ///
    /// Record errors are the ones a [`MissingReferencePolicy::Skip`]
    /// filter is allowed to step over.
    ///
    /// [`MissingReferencePolicy::Skip`]: crate::config::MissingReferencePolicy::Skip
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            QueryError::UnrecognisedReference(_) | QueryError::TypeMismatch { .. }
        )
    }
}
