//! Connected account domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result, ValidationError};
use crate::utils::{ErrorRing, MergeById};

/// Health of the link between a user and the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Disconnected,
    Suspended,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for ConnectionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "connected" => Ok(ConnectionStatus::Connected),
            "disconnected" => Ok(ConnectionStatus::Disconnected),
            "suspended" => Ok(ConnectionStatus::Suspended),
            other => Err(Error::Validation(ValidationError::field(
                "connectionStatus",
                format!("unknown connection status '{}'", other),
            ))),
        }
    }
}

/// Status of an ad account as reported by the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdAccountStatus {
    Active,
    Inactive,
    #[default]
    Pending,
}

impl AdAccountStatus {
    /// Lenient parse of a remote status; anything unrecognised is pending.
    pub fn from_remote(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_uppercase).as_deref() {
            Some("ACTIVE") => AdAccountStatus::Active,
            Some("INACTIVE") | Some("CLOSED") | Some("DELETED") => AdAccountStatus::Inactive,
            _ => AdAccountStatus::Pending,
        }
    }
}

/// Ad account embedded in a connected account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdAccountRef {
    pub id: String,
    pub name: String,
    pub status: AdAccountStatus,
    pub currency: String,
    pub country: Option<String>,
    pub last_sync: DateTime<Utc>,
}

/// Remote-owned ad account fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AdAccountPatch {
    pub id: String,
    pub name: String,
    pub status: AdAccountStatus,
    pub currency: String,
    pub country: Option<String>,
}

impl MergeById for AdAccountRef {
    type Patch = AdAccountPatch;

    fn merge_key(&self) -> &str {
        &self.id
    }

    fn patch_key(patch: &Self::Patch) -> &str {
        &patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>) {
        self.name = patch.name;
        self.status = patch.status;
        self.currency = patch.currency;
        if patch.country.is_some() {
            self.country = patch.country;
        }
        self.last_sync = now;
    }

    fn from_patch(patch: Self::Patch, now: DateTime<Utc>) -> Self {
        Self {
            id: patch.id,
            name: patch.name,
            status: patch.status,
            currency: patch.currency,
            country: patch.country,
            last_sync: now,
        }
    }
}

/// A user's link to the remote ad platform.
///
/// Credentials are never serialized; storage persists them through its own
/// row model.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedAccount {
    pub id: String,
    pub user_id: String,
    pub remote_account_id: String,
    #[serde(skip_serializing, default)]
    pub access_credential: String,
    #[serde(skip_serializing, default)]
    pub refresh_credential: Option<String>,
    pub username: String,
    pub connection_status: ConnectionStatus,
    pub last_credential_refresh: DateTime<Utc>,
    pub ad_accounts: Vec<AdAccountRef>,
    pub recent_errors: ErrorRing,
    /// Optimistic concurrency token, bumped by every successful save.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for ConnectedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedAccount")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("remote_account_id", &self.remote_account_id)
            .field("access_credential", &"<redacted>")
            .field(
                "refresh_credential",
                &self.refresh_credential.as_ref().map(|_| "<redacted>"),
            )
            .field("username", &self.username)
            .field("connection_status", &self.connection_status)
            .field("last_credential_refresh", &self.last_credential_refresh)
            .field("ad_accounts", &self.ad_accounts.len())
            .field("recent_errors", &self.recent_errors.len())
            .field("version", &self.version)
            .finish()
    }
}

/// Input for the first successful platform authorization.
#[derive(Debug, Clone)]
pub struct NewConnectedAccount {
    pub user_id: String,
    pub remote_account_id: String,
    pub username: String,
    pub access_credential: String,
    pub refresh_credential: Option<String>,
}

impl NewConnectedAccount {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId".to_string()).into());
        }
        if self.remote_account_id.trim().is_empty() {
            return Err(ValidationError::MissingField("remoteAccountId".to_string()).into());
        }
        if self.access_credential.is_empty() {
            return Err(ValidationError::MissingField("accessCredential".to_string()).into());
        }
        Ok(())
    }
}

impl ConnectedAccount {
    pub fn new(input: NewConnectedAccount, now: DateTime<Utc>) -> Result<Self> {
        input.validate()?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: input.user_id,
            remote_account_id: input.remote_account_id,
            access_credential: input.access_credential,
            refresh_credential: input.refresh_credential,
            username: input.username.trim().to_string(),
            connection_status: ConnectionStatus::Connected,
            last_credential_refresh: now,
            ad_accounts: Vec::new(),
            recent_errors: ErrorRing::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected
    }

    pub fn find_ad_account(&self, ad_account_id: &str) -> Option<&AdAccountRef> {
        self.ad_accounts.iter().find(|a| a.id == ad_account_id)
    }
}

/// Connection summary returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub connected: bool,
    pub status: ConnectionStatus,
    pub username: String,
    pub remote_account_id: String,
    pub last_credential_refresh: DateTime<Utc>,
    pub credential_expired: bool,
}
