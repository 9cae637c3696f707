//! Maps typed failures onto the bounded error taxonomy.

use serde_json::json;

use super::classification_model::{ClassifiedError, ErrorCode, Failure};
use crate::errors::Error;

/// Message shown for unclassified failures when internals must not leak.
const REDACTED_MESSAGE: &str = "An unexpected error occurred";

/// Status used for operations abandoned by the caller (nginx-style "client closed request").
const CANCELLED_STATUS: u16 = 499;

/// How much of an internal failure message reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageMode {
    #[default]
    Verbose,
    ProductionSafe,
}

/// Classifies a typed failure.
pub fn classify(failure: Failure, mode: MessageMode) -> ClassifiedError {
    match failure {
        Failure::Duplicate { field, value } => {
            ClassifiedError::new(ErrorCode::Duplicate, "A record already exists with this value")
                .with_details(json!({ "field": field, "value": value }))
        }
        Failure::RemoteStatus {
            status,
            message,
            payload,
        } => {
            let status_code = if status >= 400 { status } else { 500 };
            ClassifiedError::new(ErrorCode::RemoteApi, message)
                .with_status(status_code)
                .with_details(json!({ "status": status, "payload": payload }))
        }
        Failure::CredentialRejected { message } => {
            let classified =
                ClassifiedError::new(ErrorCode::Auth, "Platform credential is invalid or expired");
            match mode {
                MessageMode::Verbose => classified.with_details(json!({ "reason": message })),
                MessageMode::ProductionSafe => classified,
            }
        }
        Failure::RateLimited {
            retry_after,
            source,
        } => ClassifiedError::new(ErrorCode::RateLimit, "Too many requests, retry later")
            .with_details(json!({ "retryAfter": retry_after, "source": source })),
        Failure::Invalid { field, message } => {
            let classified = ClassifiedError::new(ErrorCode::Validation, message);
            match field {
                Some(field) => classified.with_details(json!({ "field": field })),
                None => classified,
            }
        }
        Failure::Forbidden { message } => ClassifiedError::new(ErrorCode::Forbidden, message),
        Failure::Missing { message } => ClassifiedError::new(ErrorCode::NotFound, message),
        Failure::Persistence { message } => ClassifiedError::new(
            ErrorCode::Database,
            redact(message, "Database operation failed", mode),
        ),
        Failure::Cancelled => {
            ClassifiedError::new(ErrorCode::RemoteApi, "Operation cancelled")
                .with_status(CANCELLED_STATUS)
        }
        Failure::Unknown { message } => {
            ClassifiedError::new(ErrorCode::RemoteApi, redact(message, REDACTED_MESSAGE, mode))
        }
    }
}

/// Describes then classifies a raised error.
pub fn classify_error(err: &Error, mode: MessageMode) -> ClassifiedError {
    classify(Failure::describe(err), mode)
}

fn redact(message: String, generic: &str, mode: MessageMode) -> String {
    match mode {
        MessageMode::Verbose => message,
        MessageMode::ProductionSafe => generic.to_string(),
    }
}
