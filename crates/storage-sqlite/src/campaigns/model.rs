//! Database model for campaigns.

use diesel::prelude::*;

use adsync_core::campaigns::Campaign;
use adsync_core::errors::Result;

use crate::utils::{decode_json, decode_timestamp, encode_json, encode_timestamp};

/// Campaign row. Nested value objects are stored as JSON columns.
#[derive(Queryable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::campaigns)]
#[diesel(primary_key(campaign_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct CampaignDB {
    pub campaign_id: String,
    pub user_id: String,
    pub connected_account_id: String,
    pub ad_account_id: String,
    pub name: String,
    pub status: String,
    pub objective: String,
    pub budget: String,
    pub schedule: String,
    pub targeting: String,
    pub creatives: String,
    pub tracking: Option<String>,
    pub performance: String,
    pub last_sync: String,
    pub errors: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl CampaignDB {
    pub fn from_domain(campaign: &Campaign) -> Result<Self> {
        Ok(Self {
            campaign_id: campaign.campaign_id.clone(),
            user_id: campaign.user_id.clone(),
            connected_account_id: campaign.connected_account_id.clone(),
            ad_account_id: campaign.ad_account_id.clone(),
            name: campaign.name.clone(),
            status: campaign.status.as_str().to_string(),
            objective: campaign.objective.as_str().to_string(),
            budget: encode_json("budget", &campaign.budget)?,
            schedule: encode_json("schedule", &campaign.schedule)?,
            targeting: encode_json("targeting", &campaign.targeting)?,
            creatives: encode_json("creatives", &campaign.creatives)?,
            tracking: campaign
                .tracking
                .as_ref()
                .map(|tracking| encode_json("tracking", tracking))
                .transpose()?,
            performance: encode_json("performance", &campaign.performance)?,
            last_sync: encode_timestamp(campaign.last_sync),
            errors: encode_json("errors", &campaign.errors)?,
            version: campaign.version,
            created_at: encode_timestamp(campaign.created_at),
            updated_at: encode_timestamp(campaign.updated_at),
        })
    }

    pub fn into_domain(self) -> Result<Campaign> {
        Ok(Campaign {
            status: self.status.parse()?,
            objective: self.objective.parse()?,
            budget: decode_json("budget", &self.budget)?,
            schedule: decode_json("schedule", &self.schedule)?,
            targeting: decode_json("targeting", &self.targeting)?,
            creatives: decode_json("creatives", &self.creatives)?,
            tracking: self
                .tracking
                .as_deref()
                .map(|raw| decode_json("tracking", raw))
                .transpose()?,
            performance: decode_json("performance", &self.performance)?,
            last_sync: decode_timestamp("last_sync", &self.last_sync)?,
            errors: decode_json("errors", &self.errors)?,
            created_at: decode_timestamp("created_at", &self.created_at)?,
            updated_at: decode_timestamp("updated_at", &self.updated_at)?,
            campaign_id: self.campaign_id,
            user_id: self.user_id,
            connected_account_id: self.connected_account_id,
            ad_account_id: self.ad_account_id,
            name: self.name,
            version: self.version,
        })
    }
}
