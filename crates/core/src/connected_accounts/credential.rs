//! Credential Store rules: expiry, refresh bookkeeping, error history.
//!
//! Invariant: a `Connected` account has a credential younger than
//! [`CREDENTIAL_MAX_AGE_DAYS`]. [`ConnectedAccount::normalize`] restores the
//! invariant and is applied by every repository load and save.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use super::connected_accounts_model::{ConnectedAccount, ConnectionStatus, ConnectionSummary};
use crate::constants::CREDENTIAL_MAX_AGE_DAYS;
use crate::utils::time_utils::elapsed_since;
use crate::utils::ErrorEntry;

pub fn credential_max_age() -> Duration {
    Duration::days(CREDENTIAL_MAX_AGE_DAYS)
}

impl ConnectedAccount {
    /// `now - last_credential_refresh > 30 days`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        elapsed_since(self.last_credential_refresh, now) > credential_max_age()
    }

    /// Expired, or within `margin` of expiring.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        elapsed_since(self.last_credential_refresh, now) > credential_max_age() - margin
    }

    pub fn credential_expires_at(&self) -> DateTime<Utc> {
        self.last_credential_refresh + credential_max_age()
    }

    /// Installs a fresh credential and marks the account connected.
    pub fn refresh(
        &mut self,
        access_credential: String,
        refresh_credential: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.access_credential = access_credential;
        if let Some(refresh) = refresh_credential {
            self.refresh_credential = Some(refresh);
        }
        self.last_credential_refresh = now;
        self.connection_status = ConnectionStatus::Connected;
        self.updated_at = now;
    }

    /// Appends to the bounded error history, evicting the oldest entry when full.
    pub fn record_error(&mut self, code: &str, message: &str, now: DateTime<Utc>) {
        self.recent_errors.push(ErrorEntry::new(code, message, now));
        self.updated_at = now;
    }

    /// Downgrades a connected account whose credential has expired.
    ///
    /// Returns `true` when the status changed. This does not persist anything.
    pub fn normalize(&mut self, now: DateTime<Utc>) -> bool {
        self.username = self.username.trim().to_string();
        if self.connection_status == ConnectionStatus::Connected && self.is_expired(now) {
            debug!(
                "Credential for remote account {} expired at {}, marking disconnected",
                self.remote_account_id,
                self.credential_expires_at()
            );
            self.connection_status = ConnectionStatus::Disconnected;
            return true;
        }
        false
    }

    pub fn summary(&self, now: DateTime<Utc>) -> ConnectionSummary {
        ConnectionSummary {
            connected: self.is_connected(),
            status: self.connection_status,
            username: self.username.clone(),
            remote_account_id: self.remote_account_id.clone(),
            last_credential_refresh: self.last_credential_refresh,
            credential_expired: self.is_expired(now),
        }
    }
}
