//! Storage-specific error types for SQLite operations.
//!
//! This module wraps Diesel-specific errors and converts them to the
//! database-agnostic error types defined in `adsync_core`.

use adsync_core::errors::{DatabaseError, Error};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Storage-specific errors that wrap Diesel and r2d2 types.
///
/// These errors are internal to the storage layer and are converted to
/// `adsync_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    /// A core error raised inside a write job. Kept intact so that write
    /// conflicts and validation failures survive the transaction wrapper.
    #[error("{0}")]
    Core(Error),
}

impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::Core(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation {
                field: unique_violation_field(info.message()),
                value: None,
            }),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::Core(e) => e,
        }
    }
}

/// Extracts the column name from a SQLite unique constraint message,
/// e.g. `UNIQUE constraint failed: campaigns.campaign_id` yields `campaign_id`.
pub fn unique_violation_field(message: &str) -> String {
    message
        .rsplit(':')
        .next()
        .and_then(|columns| columns.split(',').next())
        .map(|column| column.trim())
        .map(|column| column.rsplit('.').next().unwrap_or(column))
        .filter(|column| !column.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Fills in the offending value of a unique violation from the row being written.
pub fn with_unique_value(err: Error, values: &[(&str, &str)]) -> Error {
    match err {
        Error::Database(DatabaseError::UniqueViolation { field, value: None }) => {
            let value = values
                .iter()
                .find(|(name, _)| *name == field)
                .map(|(_, value)| value.to_string());
            Error::Database(DatabaseError::UniqueViolation { field, value })
        }
        other => other,
    }
}

/// Extension trait for converting Diesel and r2d2 results to core results.
pub trait IntoCore<T> {
    fn into_core(self) -> adsync_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> adsync_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> adsync_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_field_parses_sqlite_message() {
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: connected_accounts.user_id"),
            "user_id"
        );
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: campaigns.campaign_id"),
            "campaign_id"
        );
        assert_eq!(unique_violation_field(""), "unknown");
    }

    #[test]
    fn test_with_unique_value_fills_matching_field() {
        let err = Error::Database(DatabaseError::UniqueViolation {
            field: "user_id".to_string(),
            value: None,
        });
        match with_unique_value(err, &[("user_id", "user-1"), ("remote_account_id", "r-1")]) {
            Error::Database(DatabaseError::UniqueViolation { field, value }) => {
                assert_eq!(field, "user_id");
                assert_eq!(value.as_deref(), Some("user-1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
