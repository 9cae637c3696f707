//! Sync engine: orchestrates remote calls and reconciles their results locally.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::mapping::{to_ad_account_patch, to_remote_campaign, to_sync_patch};
use super::models::{
    AdAccountsResponse, AnalyticsParams, CampaignFilters, CredentialGrant, ListCampaignsResponse,
    RemoteCampaign,
};
use super::traits::{AdPlatformApi, ApiClientProvider, SyncServiceTrait, TokenExchange};
use crate::config::ConnectConfig;
use adsync_core::campaigns::{
    Campaign, CampaignOwner, CampaignRepositoryTrait, CampaignStatus, CampaignStatusUpdate,
    NewCampaign,
};
use adsync_core::classification::{classify_error, ClassifiedError};
use adsync_core::connected_accounts::{
    ConnectedAccount, ConnectedAccountRepositoryTrait, ConnectionSummary, NewConnectedAccount,
};
use adsync_core::errors::{DatabaseError, Error, Result, ValidationError};
use adsync_core::utils::{upsert_by_key, upsert_one};

type Classified<T> = std::result::Result<T, ClassifiedError>;

/// Races a remote call against the caller's cancellation token.
async fn race<T, F>(cancel: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}

/// A lost optimistic write, or a concurrent insert of the same key.
fn is_contended(err: &Error, inserting: bool) -> bool {
    err.is_write_conflict()
        || (inserting
            && matches!(
                err,
                Error::Database(DatabaseError::UniqueViolation { .. })
            ))
}

/// Sync engine over the remote ad platform and the local repositories.
pub struct SyncService {
    accounts: Arc<dyn ConnectedAccountRepositoryTrait>,
    campaigns: Arc<dyn CampaignRepositoryTrait>,
    clients: Arc<dyn ApiClientProvider>,
    token_exchange: Option<Arc<dyn TokenExchange>>,
    config: ConnectConfig,
}

impl SyncService {
    pub fn new(
        accounts: Arc<dyn ConnectedAccountRepositoryTrait>,
        campaigns: Arc<dyn CampaignRepositoryTrait>,
        clients: Arc<dyn ApiClientProvider>,
        config: ConnectConfig,
    ) -> Self {
        Self {
            accounts,
            campaigns,
            clients,
            token_exchange: None,
            config,
        }
    }

    /// Enables credential refresh through `token_exchange`.
    pub fn with_token_exchange(mut self, token_exchange: Arc<dyn TokenExchange>) -> Self {
        self.token_exchange = Some(token_exchange);
        self
    }

    fn fail(&self, operation: &str, err: &Error) -> ClassifiedError {
        let classified = classify_error(err, self.config.message_mode());
        match err {
            Error::Cancelled => info!("[SyncEngine] {} cancelled", operation),
            Error::Validation(_) | Error::NotFound(_) => {
                debug!("[SyncEngine] {} rejected: {}", operation, err)
            }
            _ => warn!(
                "[SyncEngine] {} failed with {}: {}",
                operation, classified.code, err
            ),
        }
        classified
    }

    fn load_account(&self, user_id: &str) -> Result<ConnectedAccount> {
        self.accounts
            .get_by_user(user_id)?
            .ok_or_else(|| Error::NotFound(format!("No connected account for user {}", user_id)))
    }

    /// Load-modify-save on the user's account, retried on write conflicts.
    async fn update_account<F>(&self, user_id: &str, mut modify: F) -> Result<ConnectedAccount>
    where
        F: FnMut(&mut ConnectedAccount) -> Result<()> + Send,
    {
        let attempts = self.config.max_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            let mut account = self.load_account(user_id)?;
            modify(&mut account)?;
            match self.accounts.save(account).await {
                Err(err) if err.is_write_conflict() && attempt < attempts => {
                    debug!(
                        "[SyncEngine] Write conflict on account of {} (attempt {}/{})",
                        user_id, attempt, attempts
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Load-build-store on one campaign row, retried on write conflicts.
    /// `build` receives the current row, or `None` when it does not exist yet.
    async fn write_campaign<F>(&self, campaign_id: &str, mut build: F) -> Result<Campaign>
    where
        F: FnMut(Option<Campaign>) -> Result<Campaign> + Send,
    {
        let attempts = self.config.max_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            let existing = self.campaigns.get(campaign_id)?;
            let inserting = existing.is_none();
            let next = build(existing)?;
            let result = if inserting {
                self.campaigns.create(next).await
            } else {
                self.campaigns.save(next).await
            };
            match result {
                Err(err) if is_contended(&err, inserting) && attempt < attempts => {
                    debug!(
                        "[SyncEngine] Write conflict on campaign {} (attempt {}/{})",
                        campaign_id, attempt, attempts
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Appends a remote failure to the account's error ring. Never fails.
    async fn record_account_error(&self, user_id: &str, err: &Error) {
        if matches!(err, Error::Cancelled) {
            return;
        }
        let classified = classify_error(err, self.config.message_mode());
        let now = Utc::now();
        let result = self
            .update_account(user_id, |account| {
                account.record_error(classified.code.as_str(), &classified.message, now);
                Ok(())
            })
            .await;
        if let Err(record_err) = result {
            warn!(
                "[SyncEngine] Could not record {} for user {}: {}",
                classified.code, user_id, record_err
            );
        }
    }

    async fn record_campaign_error(&self, campaign_id: &str, err: &Error) {
        if matches!(err, Error::Cancelled) {
            return;
        }
        let classified = classify_error(err, self.config.message_mode());
        let now = Utc::now();
        let result = self
            .write_campaign(campaign_id, |existing| {
                let mut campaign = existing.ok_or_else(|| {
                    Error::NotFound(format!("Campaign {} not found", campaign_id))
                })?;
                campaign.record_error(classified.code.as_str(), &classified.message, now);
                Ok(campaign)
            })
            .await;
        if let Err(record_err) = result {
            warn!(
                "[SyncEngine] Could not record {} for campaign {}: {}",
                classified.code, campaign_id, record_err
            );
        }
    }

    /// Runs a remote call for `user_id`, recording any failure on the account.
    async fn call_remote<T, F>(&self, user_id: &str, cancel: &CancellationToken, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        match race(cancel, call).await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.record_account_error(user_id, &err).await;
                Err(err)
            }
        }
    }

    /// Refreshes the access credential when it is within the configured
    /// margin of expiry and a refresh credential is available.
    async fn ensure_fresh_credential(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ConnectedAccount> {
        let account = self.load_account(user_id)?;
        let now = Utc::now();
        if !account.needs_refresh(now, self.config.credential_refresh_margin) {
            return Ok(account);
        }

        let (refresh_credential, exchange) =
            match (account.refresh_credential.clone(), self.token_exchange.clone()) {
                (Some(refresh_credential), Some(exchange)) => (refresh_credential, exchange),
                _ => {
                    debug!(
                        "[SyncEngine] Credential of {} is due for refresh but cannot be refreshed",
                        user_id
                    );
                    return Ok(account);
                }
            };

        let grant = self
            .call_remote(user_id, cancel, exchange.refresh(&refresh_credential))
            .await?;

        let refreshed_at = Utc::now();
        let account = self
            .update_account(user_id, |account| {
                account.refresh(
                    grant.access_token.clone(),
                    grant.refresh_token.clone(),
                    refreshed_at,
                );
                Ok(())
            })
            .await?;
        info!("[SyncEngine] Refreshed credential for user {}", user_id);
        Ok(account)
    }

    async fn api_for(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(ConnectedAccount, Arc<dyn AdPlatformApi>)> {
        let account = self.ensure_fresh_credential(user_id, cancel).await?;
        let api = self.clients.for_credential(&account.access_credential)?;
        Ok((account, api))
    }

    async fn connect_account_inner(
        &self,
        user_id: &str,
        grant: CredentialGrant,
        cancel: &CancellationToken,
    ) -> Result<ConnectionSummary> {
        if grant.access_credential.trim().is_empty() {
            return Err(ValidationError::MissingField("accessCredential".to_string()).into());
        }
        let input = NewConnectedAccount {
            user_id: user_id.to_string(),
            remote_account_id: String::new(),
            username: String::new(),
            access_credential: grant.access_credential.clone(),
            refresh_credential: grant.refresh_credential.clone(),
        };

        let api = self.clients.for_credential(&input.access_credential)?;
        let remote = race(cancel, api.get_user_account()).await;
        let remote = match remote {
            Ok(remote) => remote,
            Err(err) => {
                if self.accounts.get_by_user(user_id)?.is_some() {
                    self.record_account_error(user_id, &err).await;
                }
                return Err(err);
            }
        };
        let remote_id = remote.remote_id().to_string();

        if let Some(linked) = self.accounts.get_by_remote_id(&remote_id)? {
            if linked.user_id != user_id {
                return Err(Error::Forbidden(format!(
                    "Remote account {} is linked to another user",
                    remote_id
                )));
            }
        }

        let input = NewConnectedAccount {
            remote_account_id: remote_id.clone(),
            username: remote.username.clone(),
            ..input
        };
        let attempts = self.config.max_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            let now = Utc::now();
            let result = match self.accounts.get_by_user(user_id)? {
                Some(existing) if existing.remote_account_id == remote_id => {
                    let mut account = existing;
                    account.refresh(
                        input.access_credential.clone(),
                        input.refresh_credential.clone(),
                        now,
                    );
                    account.username = input.username.trim().to_string();
                    self.accounts.save(account).await
                }
                Some(previous) => {
                    info!(
                        "[SyncEngine] User {} switched remote account {} -> {}",
                        user_id, previous.remote_account_id, remote_id
                    );
                    let account = ConnectedAccount::new(input.clone(), now)?;
                    self.accounts.replace_for_user(account).await
                }
                None => {
                    let account = ConnectedAccount::new(input.clone(), now)?;
                    self.accounts.create(account).await
                }
            };
            match result {
                Err(err) if is_contended(&err, true) && attempt < attempts => attempt += 1,
                Err(err) => return Err(err),
                Ok(account) => {
                    info!(
                        "[SyncEngine] Connected remote account {} for user {}",
                        remote_id, user_id
                    );
                    return Ok(account.summary(now));
                }
            }
        }
    }

    async fn list_ad_accounts_inner(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AdAccountsResponse> {
        let (account, api) = self.api_for(user_id, cancel).await?;
        let page = self
            .call_remote(
                user_id,
                cancel,
                api.list_ad_accounts(&account.remote_account_id),
            )
            .await?;

        let patches: Vec<_> = page
            .items
            .into_iter()
            .map(|remote| to_ad_account_patch(remote, &self.config.default_currency))
            .collect();
        let now = Utc::now();
        let account = self
            .update_account(user_id, |account| {
                for patch in patches.iter().cloned() {
                    upsert_by_key(&mut account.ad_accounts, patch, now);
                }
                account.updated_at = now;
                Ok(())
            })
            .await?;

        info!(
            "[SyncEngine] User {} has {} ad accounts after sync",
            user_id,
            account.ad_accounts.len()
        );
        Ok(AdAccountsResponse {
            ad_accounts: account.ad_accounts,
        })
    }

    async fn create_campaign_inner(
        &self,
        user_id: &str,
        ad_account_id: &str,
        mut request: NewCampaign,
        cancel: &CancellationToken,
    ) -> Result<Campaign> {
        let now = Utc::now();
        request.validate(now)?;
        if request.currency.as_deref().map_or(true, |c| c.trim().is_empty()) {
            request.currency = Some(self.config.default_currency.clone());
        }
        let remote_request = to_remote_campaign(&request)?;

        let (account, api) = self.api_for(user_id, cancel).await?;
        let created = self
            .call_remote(
                user_id,
                cancel,
                api.create_campaign(ad_account_id, &remote_request),
            )
            .await?;

        // From here on the remote campaign exists; the local write always runs.
        let status = created
            .status
            .as_deref()
            .and_then(|raw| raw.parse::<CampaignStatus>().ok())
            .or(request.status)
            .unwrap_or_default();
        let owner = CampaignOwner {
            user_id: user_id.to_string(),
            connected_account_id: account.id.clone(),
            ad_account_id: ad_account_id.to_string(),
        };
        let campaign_id = created.id.clone();
        let campaign = Campaign::from_creation(request, created.id, status, owner, Utc::now());

        match self.campaigns.create(campaign).await {
            Ok(campaign) => {
                info!(
                    "[SyncEngine] Created campaign {} for user {}",
                    campaign_id, user_id
                );
                Ok(campaign)
            }
            Err(err) => {
                error!(
                    "[SyncEngine] Campaign {} exists remotely but was not stored: {}. \
                     It will be adopted by the next campaign list.",
                    campaign_id, err
                );
                Err(err)
            }
        }
    }

    async fn list_campaigns_inner(
        &self,
        user_id: &str,
        ad_account_id: &str,
        mut filters: CampaignFilters,
        cancel: &CancellationToken,
    ) -> Result<ListCampaignsResponse> {
        if let Some(raw) = filters.status.as_deref() {
            let status: CampaignStatus = raw.parse()?;
            filters.status = Some(status.as_remote().to_string());
        }

        let (account, api) = self.api_for(user_id, cancel).await?;
        let page = self
            .call_remote(user_id, cancel, api.list_campaigns(ad_account_id, &filters))
            .await?;

        let currency = account
            .find_ad_account(ad_account_id)
            .map(|ad_account| ad_account.currency.clone())
            .unwrap_or_else(|| self.config.default_currency.clone());
        let owner = CampaignOwner {
            user_id: user_id.to_string(),
            connected_account_id: account.id.clone(),
            ad_account_id: ad_account_id.to_string(),
        };

        let mut reconciled = Vec::with_capacity(page.items.len());
        let mut adopted = 0usize;
        for item in &page.items {
            let remote = match serde_json::from_value::<RemoteCampaign>(item.clone()) {
                Ok(remote) => remote,
                Err(e) => {
                    warn!(
                        "[SyncEngine] Skipping unreadable campaign item in {}: {}",
                        ad_account_id, e
                    );
                    continue;
                }
            };
            let now = Utc::now();
            let patch = to_sync_patch(&remote, owner.clone(), &currency, now);

            if let Some(existing) = self.campaigns.get(&patch.campaign_id)? {
                if existing.user_id != user_id {
                    warn!(
                        "[SyncEngine] Campaign {} belongs to another user, not reconciled",
                        patch.campaign_id
                    );
                    continue;
                }
            } else {
                adopted += 1;
            }

            let campaign = self
                .write_campaign(&remote.id, |existing| {
                    Ok(upsert_one(existing, patch.clone(), now).0)
                })
                .await?;
            reconciled.push(campaign);
        }

        if adopted > 0 {
            info!(
                "[SyncEngine] Adopted {} remote campaigns without a local row for user {}",
                adopted, user_id
            );
        }
        debug!(
            "[SyncEngine] Reconciled {} campaigns in {}",
            reconciled.len(),
            ad_account_id
        );

        Ok(ListCampaignsResponse {
            items: page.items,
            bookmark: page.bookmark,
            reconciled,
        })
    }

    async fn update_campaign_inner(
        &self,
        campaign_id: &str,
        patch: Value,
        cancel: &CancellationToken,
    ) -> Result<Campaign> {
        let update = CampaignStatusUpdate::from_patch(&patch)?;
        let campaign = self
            .campaigns
            .get(campaign_id)?
            .ok_or_else(|| Error::NotFound(format!("Campaign {} not found", campaign_id)))?;

        let (_, api) = self.api_for(&campaign.user_id, cancel).await?;
        let pushed = race(
            cancel,
            api.update_campaign_status(&campaign.ad_account_id, campaign_id, update.status),
        )
        .await;
        if let Err(err) = pushed {
            self.record_campaign_error(campaign_id, &err).await;
            return Err(err);
        }

        let now = Utc::now();
        let updated = self
            .write_campaign(campaign_id, |existing| {
                let mut campaign = existing.ok_or_else(|| {
                    Error::NotFound(format!("Campaign {} not found", campaign_id))
                })?;
                campaign.set_status(update.status, now);
                Ok(campaign)
            })
            .await?;
        info!(
            "[SyncEngine] Campaign {} is now {}",
            campaign_id,
            update.status.as_str()
        );
        Ok(updated)
    }

    async fn get_analytics_inner(
        &self,
        user_id: &str,
        ad_account_id: &str,
        params: AnalyticsParams,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        params.validate()?;
        let (_, api) = self.api_for(user_id, cancel).await?;
        self.call_remote(user_id, cancel, api.get_analytics(ad_account_id, &params))
            .await
    }
}

#[async_trait]
impl SyncServiceTrait for SyncService {
    async fn connect_account(
        &self,
        user_id: &str,
        grant: CredentialGrant,
        cancel: &CancellationToken,
    ) -> Classified<ConnectionSummary> {
        self.connect_account_inner(user_id, grant, cancel)
            .await
            .map_err(|e| self.fail("connect_account", &e))
    }

    async fn disconnect_account(&self, user_id: &str) -> Classified<()> {
        let removed = self
            .accounts
            .delete_by_user(user_id)
            .await
            .map_err(|e| self.fail("disconnect_account", &e))?;
        if removed == 0 {
            let err = Error::NotFound(format!("No connected account for user {}", user_id));
            return Err(self.fail("disconnect_account", &err));
        }
        info!("[SyncEngine] Disconnected user {}", user_id);
        Ok(())
    }

    fn connection_status(&self, user_id: &str) -> Classified<ConnectionSummary> {
        self.load_account(user_id)
            .map(|account| account.summary(Utc::now()))
            .map_err(|e| self.fail("connection_status", &e))
    }

    async fn refresh_if_needed(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Classified<ConnectionSummary> {
        self.ensure_fresh_credential(user_id, cancel)
            .await
            .map(|account| account.summary(Utc::now()))
            .map_err(|e| self.fail("refresh_if_needed", &e))
    }

    async fn list_ad_accounts(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Classified<AdAccountsResponse> {
        self.list_ad_accounts_inner(user_id, cancel)
            .await
            .map_err(|e| self.fail("list_ad_accounts", &e))
    }

    async fn create_campaign(
        &self,
        user_id: &str,
        ad_account_id: &str,
        request: NewCampaign,
        cancel: &CancellationToken,
    ) -> Classified<Campaign> {
        self.create_campaign_inner(user_id, ad_account_id, request, cancel)
            .await
            .map_err(|e| self.fail("create_campaign", &e))
    }

    async fn list_campaigns(
        &self,
        user_id: &str,
        ad_account_id: &str,
        filters: CampaignFilters,
        cancel: &CancellationToken,
    ) -> Classified<ListCampaignsResponse> {
        self.list_campaigns_inner(user_id, ad_account_id, filters, cancel)
            .await
            .map_err(|e| self.fail("list_campaigns", &e))
    }

    async fn update_campaign(
        &self,
        campaign_id: &str,
        patch: Value,
        cancel: &CancellationToken,
    ) -> Classified<Campaign> {
        self.update_campaign_inner(campaign_id, patch, cancel)
            .await
            .map_err(|e| self.fail("update_campaign", &e))
    }

    async fn get_analytics(
        &self,
        user_id: &str,
        ad_account_id: &str,
        params: AnalyticsParams,
        cancel: &CancellationToken,
    ) -> Classified<Value> {
        self.get_analytics_inner(user_id, ad_account_id, params, cancel)
            .await
            .map_err(|e| self.fail("get_analytics", &e))
    }
}
