//! Campaign repository trait.

use async_trait::async_trait;

use super::campaigns_model::Campaign;
use crate::errors::Result;

/// Persistence contract for campaigns, keyed by the remote `campaign_id`.
#[async_trait]
pub trait CampaignRepositoryTrait: Send + Sync {
    fn get(&self, campaign_id: &str) -> Result<Option<Campaign>>;

    /// Inserts a new campaign.
    ///
    /// An existing `campaign_id` fails with `DatabaseError::UniqueViolation`.
    async fn create(&self, campaign: Campaign) -> Result<Campaign>;

    /// Compare-and-swap save keyed by `campaign_id` and `version`.
    ///
    /// Fails with `DatabaseError::WriteConflict` when the stored version moved.
    async fn save(&self, campaign: Campaign) -> Result<Campaign>;
}
