//! Tests for failure description and classification.

use super::*;
use crate::errors::{DatabaseError, Error, RemoteApiError, ValidationError};
use serde_json::json;

fn verbose(err: Error) -> ClassifiedError {
    classify_error(&err, MessageMode::Verbose)
}

#[test]
fn test_unique_violation_is_duplicate_with_field_and_value() {
    let classified = verbose(Error::Database(DatabaseError::UniqueViolation {
        field: "campaign_id".to_string(),
        value: Some("cmp_9".to_string()),
    }));

    assert_eq!(classified.code, ErrorCode::Duplicate);
    assert_eq!(classified.status_code, 409);
    let details = classified.details.unwrap();
    assert_eq!(details["field"], "campaign_id");
    assert_eq!(details["value"], "cmp_9");
}

#[test]
fn test_remote_status_mirrors_status_and_keeps_payload() {
    let payload = json!({ "code": 2, "message": "Invalid ad account" });
    let classified = verbose(Error::Remote(RemoteApiError::new(
        400,
        "Invalid ad account",
        Some(payload.clone()),
    )));

    assert_eq!(classified.code, ErrorCode::RemoteApi);
    assert_eq!(classified.status_code, 400);
    assert_eq!(classified.details.unwrap()["payload"], payload);
}

#[test]
fn test_remote_status_below_400_falls_back_to_500() {
    let classified = verbose(Error::Remote(RemoteApiError::new(302, "moved", None)));
    assert_eq!(classified.status_code, 500);
}

#[test]
fn test_remote_401_is_auth() {
    let classified = verbose(Error::Remote(RemoteApiError::new(401, "expired token", None)));
    assert_eq!(classified.code, ErrorCode::Auth);
    assert_eq!(classified.status_code, 401);
}

#[test]
fn test_remote_429_is_rate_limit_with_retry_after() {
    let err = Error::Remote(RemoteApiError::new(429, "slow down", None).with_retry_after(Some(12)));
    let classified = verbose(err);

    assert_eq!(classified.code, ErrorCode::RateLimit);
    assert_eq!(classified.status_code, 429);
    assert_eq!(classified.retry_after(), Some(12));
    assert!(classified.is_retryable());
}

#[test]
fn test_remote_429_without_header_uses_default_hint() {
    let classified = verbose(Error::Remote(RemoteApiError::new(429, "slow down", None)));
    assert_eq!(
        classified.retry_after(),
        Some(crate::constants::DEFAULT_RETRY_AFTER_SECS)
    );
}

#[test]
fn test_local_rate_limit_is_classified_the_same_way() {
    let classified = verbose(Error::RateLimited { retry_after: 900 });
    assert_eq!(classified.code, ErrorCode::RateLimit);
    assert_eq!(classified.details.unwrap()["source"], "local");
}

#[test]
fn test_unknown_failure_is_redacted_in_production_mode() {
    let err = Error::Unexpected("socket hang up at 10.0.0.3".to_string());

    let safe = classify_error(&err, MessageMode::ProductionSafe);
    assert_eq!(safe.code, ErrorCode::RemoteApi);
    assert_eq!(safe.status_code, 500);
    assert!(!safe.message.contains("10.0.0.3"));

    let raw = classify_error(&err, MessageMode::Verbose);
    assert_eq!(raw.message, "socket hang up at 10.0.0.3");
}

#[test]
fn test_validation_carries_field() {
    let classified = verbose(Error::Validation(ValidationError::field(
        "dailyBudget",
        "must be at least 1",
    )));
    assert_eq!(classified.code, ErrorCode::Validation);
    assert_eq!(classified.status_code, 400);
    assert_eq!(classified.details.unwrap()["field"], "dailyBudget");
}

#[test]
fn test_other_database_failures_are_database() {
    let classified = verbose(Error::Database(DatabaseError::QueryFailed("disk I/O".into())));
    assert_eq!(classified.code, ErrorCode::Database);
    assert_eq!(classified.status_code, 500);
}

#[test]
fn test_cancelled_is_remote_api_499() {
    let classified = verbose(Error::Cancelled);
    assert_eq!(classified.code, ErrorCode::RemoteApi);
    assert_eq!(classified.status_code, 499);
}

#[test]
fn test_code_serializes_screaming_snake_case() {
    let classified = ClassifiedError::new(ErrorCode::RateLimit, "x");
    let value = serde_json::to_value(&classified).unwrap();
    assert_eq!(value["code"], "RATE_LIMIT");
    assert_eq!(value["statusCode"], 429);
    assert!(value.get("details").is_none());
}
