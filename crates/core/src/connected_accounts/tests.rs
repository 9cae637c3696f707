//! Tests for connected account credential rules.

use super::*;
use crate::constants::ERROR_RING_CAPACITY;
use crate::utils::upsert_by_key;
use chrono::{Duration, TimeZone, Utc};

fn account_refreshed_at(days_ago: i64) -> ConnectedAccount {
    let now = Utc::now();
    let mut account = ConnectedAccount::new(
        NewConnectedAccount {
            user_id: "user-1".to_string(),
            remote_account_id: "549755885175".to_string(),
            username: "  studio_lumen ".to_string(),
            access_credential: "pina_access".to_string(),
            refresh_credential: Some("pinr_refresh".to_string()),
        },
        now,
    )
    .unwrap();
    account.last_credential_refresh = now - Duration::days(days_ago);
    account
}

#[test]
fn test_new_account_is_connected_and_trimmed() {
    let account = account_refreshed_at(0);
    assert_eq!(account.connection_status, ConnectionStatus::Connected);
    assert_eq!(account.username, "studio_lumen");
    assert_eq!(account.version, 0);
    assert!(account.recent_errors.is_empty());
}

#[test]
fn test_new_account_requires_credential() {
    let result = ConnectedAccount::new(
        NewConnectedAccount {
            user_id: "user-1".to_string(),
            remote_account_id: "1".to_string(),
            username: "x".to_string(),
            access_credential: String::new(),
            refresh_credential: None,
        },
        Utc::now(),
    );
    assert!(result.is_err());
}

#[test]
fn test_is_expired_after_thirty_days() {
    let now = Utc::now();
    assert!(!account_refreshed_at(29).is_expired(now));
    assert!(account_refreshed_at(31).is_expired(now));
}

#[test]
fn test_normalize_downgrades_expired_regardless_of_stored_status() {
    let now = Utc::now();
    let mut account = account_refreshed_at(31);
    assert!(account.normalize(now));
    assert_eq!(account.connection_status, ConnectionStatus::Disconnected);

    // Already downgraded: nothing more to do.
    assert!(!account.normalize(now));
}

#[test]
fn test_normalize_leaves_suspended_alone() {
    let now = Utc::now();
    let mut account = account_refreshed_at(45);
    account.connection_status = ConnectionStatus::Suspended;
    assert!(!account.normalize(now));
    assert_eq!(account.connection_status, ConnectionStatus::Suspended);
}

#[test]
fn test_refresh_resets_age_and_reconnects() {
    let now = Utc::now();
    let mut account = account_refreshed_at(40);
    account.normalize(now);

    account.refresh("pina_new".to_string(), None, now);

    assert_eq!(account.access_credential, "pina_new");
    assert_eq!(account.refresh_credential.as_deref(), Some("pinr_refresh"));
    assert_eq!(account.last_credential_refresh, now);
    assert_eq!(account.connection_status, ConnectionStatus::Connected);
    assert!(!account.is_expired(now));
}

#[test]
fn test_needs_refresh_inside_margin() {
    let now = Utc::now();
    let account = account_refreshed_at(29);
    assert!(account.needs_refresh(now, Duration::days(2)));
    assert!(!account.needs_refresh(now, Duration::hours(1)));
}

#[test]
fn test_record_error_is_bounded() {
    let now = Utc::now();
    let mut account = account_refreshed_at(0);
    for i in 0..=ERROR_RING_CAPACITY {
        account.record_error("REMOTE_API", &format!("failure {}", i), now);
    }
    assert_eq!(account.recent_errors.len(), ERROR_RING_CAPACITY);
    assert_eq!(account.recent_errors.oldest().unwrap().message, "failure 1");
    assert_eq!(
        account.recent_errors.newest().unwrap().message,
        format!("failure {}", ERROR_RING_CAPACITY)
    );
}

#[test]
fn test_ad_account_upsert_merges_by_id() {
    let first_sync = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let second_sync = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    let mut account = account_refreshed_at(0);

    upsert_by_key(
        &mut account.ad_accounts,
        AdAccountPatch {
            id: "act_1".to_string(),
            name: "Lumen EU".to_string(),
            status: AdAccountStatus::Pending,
            currency: "EUR".to_string(),
            country: Some("FR".to_string()),
        },
        first_sync,
    );
    upsert_by_key(
        &mut account.ad_accounts,
        AdAccountPatch {
            id: "act_1".to_string(),
            name: "Lumen Europe".to_string(),
            status: AdAccountStatus::Active,
            currency: "EUR".to_string(),
            country: None,
        },
        second_sync,
    );

    assert_eq!(account.ad_accounts.len(), 1);
    let merged = &account.ad_accounts[0];
    assert_eq!(merged.name, "Lumen Europe");
    assert_eq!(merged.status, AdAccountStatus::Active);
    assert_eq!(merged.country.as_deref(), Some("FR"));
    assert_eq!(merged.last_sync, second_sync);
}

#[test]
fn test_ad_account_status_from_remote() {
    assert_eq!(AdAccountStatus::from_remote(Some("ACTIVE")), AdAccountStatus::Active);
    assert_eq!(AdAccountStatus::from_remote(Some("inactive")), AdAccountStatus::Inactive);
    assert_eq!(AdAccountStatus::from_remote(None), AdAccountStatus::Pending);
}

#[test]
fn test_serialization_omits_credentials() {
    let account = account_refreshed_at(0);
    let json = serde_json::to_value(&account).unwrap();
    assert!(json.get("accessCredential").is_none());
    assert!(json.get("refreshCredential").is_none());
    assert_eq!(json["connectionStatus"], "connected");
    assert!(!format!("{:?}", account).contains("pina_access"));
}
