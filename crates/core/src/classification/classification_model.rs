//! Classified error record and the typed failure description it is built from.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::constants::DEFAULT_RETRY_AFTER_SECS;
use crate::errors::{DatabaseError, Error, ValidationError};

/// Bounded error taxonomy shared with the caller-facing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    Auth,
    Forbidden,
    NotFound,
    Duplicate,
    RateLimit,
    RemoteApi,
    Database,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Auth => "AUTH",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Duplicate => "DUPLICATE",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::RemoteApi => "REMOTE_API",
            ErrorCode::Database => "DATABASE",
        }
    }

    /// HTTP-equivalent status used when the failure does not carry its own.
    pub fn default_status(&self) -> u16 {
        match self {
            ErrorCode::Validation => 400,
            ErrorCode::Auth => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Duplicate => 409,
            ErrorCode::RateLimit => 429,
            ErrorCode::RemoteApi | ErrorCode::Database => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure record returned by every Sync Engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub code: ErrorCode,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ClassifiedError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status_code: code.default_status(),
            details: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Rate-limited failures may be retried by the caller after `retry_after` seconds.
    pub fn is_retryable(&self) -> bool {
        self.code == ErrorCode::RateLimit
    }

    pub fn retry_after(&self) -> Option<u64> {
        self.details
            .as_ref()
            .and_then(|d| d.get("retryAfter"))
            .and_then(Value::as_u64)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.code, self.status_code, self.message)
    }
}

impl std::error::Error for ClassifiedError {}

/// Where a rate-limit signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitSource {
    Local,
    Remote,
}

/// Typed description of a failure, decided before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Local persistence uniqueness violation.
    Duplicate { field: String, value: Option<String> },
    /// Remote call returned a non-2xx status with (possibly) a structured body.
    RemoteStatus {
        status: u16,
        message: String,
        payload: Option<Value>,
    },
    /// Credential invalid or expired, as reported by the remote platform.
    CredentialRejected { message: String },
    RateLimited {
        retry_after: u64,
        source: RateLimitSource,
    },
    Invalid {
        field: Option<String>,
        message: String,
    },
    Forbidden { message: String },
    Missing { message: String },
    Persistence { message: String },
    Cancelled,
    Unknown { message: String },
}

impl Failure {
    /// Decides the failure shape from a raised error.
    pub fn describe(err: &Error) -> Failure {
        match err {
            Error::Database(DatabaseError::UniqueViolation { field, value }) => Failure::Duplicate {
                field: field.clone(),
                value: value.clone(),
            },
            Error::Database(DatabaseError::NotFound(message)) => Failure::Missing {
                message: message.clone(),
            },
            Error::Database(other) => Failure::Persistence {
                message: other.to_string(),
            },
            Error::Remote(remote) => match remote.status {
                401 => Failure::CredentialRejected {
                    message: remote.message.clone(),
                },
                429 => Failure::RateLimited {
                    retry_after: remote.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
                    source: RateLimitSource::Remote,
                },
                status => Failure::RemoteStatus {
                    status,
                    message: remote.message.clone(),
                    payload: remote.payload.clone(),
                },
            },
            Error::CredentialRejected(message) => Failure::CredentialRejected {
                message: message.clone(),
            },
            Error::RateLimited { retry_after } => Failure::RateLimited {
                retry_after: *retry_after,
                source: RateLimitSource::Local,
            },
            Error::Validation(validation) => Failure::Invalid {
                field: match validation {
                    ValidationError::MissingField(field)
                    | ValidationError::ForbiddenField(field)
                    | ValidationError::InvalidField { field, .. } => Some(field.clone()),
                    _ => None,
                },
                message: validation.to_string(),
            },
            Error::NotFound(message) => Failure::Missing {
                message: message.clone(),
            },
            Error::Forbidden(message) => Failure::Forbidden {
                message: message.clone(),
            },
            Error::Cancelled => Failure::Cancelled,
            Error::Unexpected(message) => Failure::Unknown {
                message: message.clone(),
            },
        }
    }
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        Failure::describe(err)
    }
}
