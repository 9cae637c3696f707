//! Database model for connected accounts.

use diesel::prelude::*;

use adsync_core::connected_accounts::ConnectedAccount;
use adsync_core::errors::Result;

use crate::utils::{decode_json, decode_timestamp, encode_json, encode_timestamp};

/// One row per user. Ad accounts and the error ring are JSON columns.
#[derive(Queryable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::connected_accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ConnectedAccountDB {
    pub id: String,
    pub user_id: String,
    pub remote_account_id: String,
    pub access_credential: String,
    pub refresh_credential: Option<String>,
    pub username: String,
    pub connection_status: String,
    pub last_credential_refresh: String,
    pub ad_accounts: String,
    pub recent_errors: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ConnectedAccountDB {
    pub fn from_domain(account: &ConnectedAccount) -> Result<Self> {
        Ok(Self {
            id: account.id.clone(),
            user_id: account.user_id.clone(),
            remote_account_id: account.remote_account_id.clone(),
            access_credential: account.access_credential.clone(),
            refresh_credential: account.refresh_credential.clone(),
            username: account.username.clone(),
            connection_status: account.connection_status.as_str().to_string(),
            last_credential_refresh: encode_timestamp(account.last_credential_refresh),
            ad_accounts: encode_json("ad_accounts", &account.ad_accounts)?,
            recent_errors: encode_json("recent_errors", &account.recent_errors)?,
            version: account.version,
            created_at: encode_timestamp(account.created_at),
            updated_at: encode_timestamp(account.updated_at),
        })
    }

    pub fn into_domain(self) -> Result<ConnectedAccount> {
        Ok(ConnectedAccount {
            connection_status: self.connection_status.parse()?,
            last_credential_refresh: decode_timestamp(
                "last_credential_refresh",
                &self.last_credential_refresh,
            )?,
            ad_accounts: decode_json("ad_accounts", &self.ad_accounts)?,
            recent_errors: decode_json("recent_errors", &self.recent_errors)?,
            created_at: decode_timestamp("created_at", &self.created_at)?,
            updated_at: decode_timestamp("updated_at", &self.updated_at)?,
            id: self.id,
            user_id: self.user_id,
            remote_account_id: self.remote_account_id,
            access_credential: self.access_credential,
            refresh_credential: self.refresh_credential,
            username: self.username,
            version: self.version,
        })
    }
}
