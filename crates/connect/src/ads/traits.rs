//! Traits defining the contract for remote calls and sync operations.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::models::{
    AdAccountsResponse, AnalyticsParams, CampaignFilters, CreatedCampaign, CredentialGrant,
    ListCampaignsResponse, RemoteAdAccount, RemoteCampaignRequest, RemotePage,
    RemoteUserAccount, TokenGrant,
};
use adsync_core::campaigns::{Campaign, CampaignStatus, NewCampaign};
use adsync_core::classification::ClassifiedError;
use adsync_core::connected_accounts::ConnectionSummary;
use adsync_core::errors::Result;

/// Remote ad platform API, bound to one access credential.
///
/// Non-2xx responses surface as `Error::Remote` with the status and JSON body intact.
#[async_trait]
pub trait AdPlatformApi: Send + Sync {
    /// `GET /user_account`
    async fn get_user_account(&self) -> Result<RemoteUserAccount>;

    /// `GET /ad_accounts`
    async fn list_ad_accounts(&self, owner_user_id: &str) -> Result<RemotePage<RemoteAdAccount>>;

    /// `POST /ad_accounts/{id}/campaigns`
    async fn create_campaign(
        &self,
        ad_account_id: &str,
        request: &RemoteCampaignRequest,
    ) -> Result<CreatedCampaign>;

    /// `GET /ad_accounts/{id}/campaigns`, one page of up to 100 items.
    async fn list_campaigns(
        &self,
        ad_account_id: &str,
        filters: &CampaignFilters,
    ) -> Result<RemotePage<Value>>;

    /// `PATCH /ad_accounts/{id}/campaigns`
    async fn update_campaign_status(
        &self,
        ad_account_id: &str,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<()>;

    /// `GET /ad_accounts/{id}/analytics`. The payload is returned verbatim.
    async fn get_analytics(&self, ad_account_id: &str, params: &AnalyticsParams) -> Result<Value>;
}

/// Builds an API client for a given access credential.
pub trait ApiClientProvider: Send + Sync {
    fn for_credential(&self, access_credential: &str) -> Result<Arc<dyn AdPlatformApi>>;
}

/// Exchanges a refresh credential for a new access credential.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn refresh(&self, refresh_credential: &str) -> Result<TokenGrant>;
}

/// Caller-facing sync operations. Every failure is returned classified.
#[async_trait]
pub trait SyncServiceTrait: Send + Sync {
    /// Verifies `grant` with the remote platform and links it to `user_id`.
    async fn connect_account(
        &self,
        user_id: &str,
        grant: CredentialGrant,
        cancel: &CancellationToken,
    ) -> std::result::Result<ConnectionSummary, ClassifiedError>;

    /// Removes the user's connected account. Campaign rows are kept.
    async fn disconnect_account(&self, user_id: &str) -> std::result::Result<(), ClassifiedError>;

    fn connection_status(&self, user_id: &str)
        -> std::result::Result<ConnectionSummary, ClassifiedError>;

    /// Exchanges the refresh credential when the access credential is close to expiry.
    async fn refresh_if_needed(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<ConnectionSummary, ClassifiedError>;

    async fn list_ad_accounts(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<AdAccountsResponse, ClassifiedError>;

    async fn create_campaign(
        &self,
        user_id: &str,
        ad_account_id: &str,
        request: NewCampaign,
        cancel: &CancellationToken,
    ) -> std::result::Result<Campaign, ClassifiedError>;

    async fn list_campaigns(
        &self,
        user_id: &str,
        ad_account_id: &str,
        filters: CampaignFilters,
        cancel: &CancellationToken,
    ) -> std::result::Result<ListCampaignsResponse, ClassifiedError>;

    /// Status-only mutation. `patch` must be `{"status": ...}`.
    async fn update_campaign(
        &self,
        campaign_id: &str,
        patch: Value,
        cancel: &CancellationToken,
    ) -> std::result::Result<Campaign, ClassifiedError>;

    async fn get_analytics(
        &self,
        user_id: &str,
        ad_account_id: &str,
        params: AnalyticsParams,
        cancel: &CancellationToken,
    ) -> std::result::Result<Value, ClassifiedError>;
}
