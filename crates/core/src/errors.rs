//! Core error types for ad platform synchronization.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer,
//! and transport-level failures are converted by the connect layer.
//!
//! These are the raw failures. The caller-facing shape is produced by
//! [`crate::classification::classify`].

use chrono::ParseError as ChronoParseError;
use serde_json::Value;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Remote platform error: {0}")]
    Remote(#[from] RemoteApiError),

    /// The remote platform rejected the access credential.
    #[error("Credential rejected: {0}")]
    CredentialRejected(String),

    /// A local or remote rate limit was hit.
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The caller cancelled the operation before the remote call completed.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated.
    #[error("Unique constraint violation on '{field}'")]
    UniqueViolation {
        field: String,
        value: Option<String>,
    },

    /// The row changed between load and save (optimistic version check failed).
    #[error("Concurrent write conflict: {0}")]
    WriteConflict(String),

    /// A stored document could not be encoded or decoded.
    #[error("Stored document is invalid: {0}")]
    Serialization(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Field '{field}' is invalid: {message}")]
    InvalidField { field: String, message: String },

    #[error("Field '{0}' cannot be changed here")]
    ForbiddenField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl ValidationError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A non-2xx response from the remote platform, with its body kept intact.
#[derive(Error, Debug, Clone)]
#[error("HTTP {status}: {message}")]
pub struct RemoteApiError {
    pub status: u16,
    pub message: String,
    pub payload: Option<Value>,
    /// Parsed `Retry-After` header, in seconds.
    pub retry_after: Option<u64>,
}

impl RemoteApiError {
    pub fn new(status: u16, message: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            status,
            message: message.into(),
            payload,
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<u64>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

impl Error {
    /// Whether a load-merge-save cycle should be retried.
    pub fn is_write_conflict(&self) -> bool {
        matches!(self, Error::Database(DatabaseError::WriteConflict(_)))
    }
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
