//! Error types for pgchain

use thiserror::Error;
use tokio_postgres::types::WrongType;

/// Result type alias for pgchain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors raised while building or executing a statement.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Invalid builder input (operator, direction, identifier, row width, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Declared slot count does not match the bound value count
    #[error("Slot mismatch: {slots} slot(s) but {values} bound value(s)")]
    SlotMismatch { slots: usize, values: usize },

    /// Unset or unrecognized operation at execute time
    #[error("Operation error: {0}")]
    Operation(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Expected row was not returned
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row value could not be converted
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Session configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl ChainError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an operation error
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the database driver or connection.
    ///
    /// The executor rolls back on every failure after the statement was
    /// sent, not only on these.
    pub fn is_driver(&self) -> bool {
        matches!(
            self,
            Self::Query(_)
                | Self::UniqueViolation(_)
                | Self::ForeignKeyViolation(_)
                | Self::CheckViolation(_)
                | Self::Connection(_)
        )
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific ChainError
    ///
    /// A bound value whose Rust type does not match its column type (`i32`
    /// for a `bigint` column) becomes a [`ChainError::Validation`].
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let wrong_type = std::error::Error::source(&err)
            .and_then(|source| source.downcast_ref::<WrongType>())
            .map(ToString::to_string);
        if let Some(wrong_type) = wrong_type {
            return Self::Validation(format!("{err}: {wrong_type}"));
        }
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Query(err)
    }
}
