//! Column encoding helpers shared by the repositories.
//!
//! Timestamps are stored as RFC 3339 text and nested documents as JSON text.

use adsync_core::errors::{DatabaseError, Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| {
            Error::Database(DatabaseError::Serialization(format!(
                "{}: invalid timestamp '{}': {}",
                column, raw, e
            )))
        })
}

pub fn encode_json<T: Serialize>(column: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        Error::Database(DatabaseError::Serialization(format!("{}: {}", column, e)))
    })
}

pub fn decode_json<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        Error::Database(DatabaseError::Serialization(format!("{}: {}", column, e)))
    })
}
