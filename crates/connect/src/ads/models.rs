//! Wire shapes of the remote ad platform API and the results of sync operations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use adsync_core::campaigns::Campaign;
use adsync_core::connected_accounts::AdAccountRef;
use adsync_core::errors::{Result, ValidationError};

/// Fixed metric columns requested from the analytics endpoint.
pub const ANALYTICS_COLUMNS: [&str; 8] = [
    "SPEND",
    "IMPRESSION",
    "CLICK",
    "CTR",
    "ENGAGEMENT",
    "ENGAGEMENT_RATE",
    "CONVERSION",
    "COST_PER_CONVERSION",
];
pub const DEFAULT_ANALYTICS_LEVEL: &str = "CAMPAIGN";
pub const DEFAULT_CLICK_WINDOW_DAYS: u32 = 30;
pub const CAMPAIGN_PAGE_SIZE: u32 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Remote responses
// ─────────────────────────────────────────────────────────────────────────────

/// A bookmark-paginated list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
}

/// `GET /user_account`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUserAccount {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub account_type: Option<String>,
}

impl RemoteUserAccount {
    /// Stable remote identity: the account id, or the username when absent.
    pub fn remote_id(&self) -> &str {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAdAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SummaryStats {
    pub impressions: Option<u64>,
    pub clicks: Option<u64>,
    pub spend: Option<Decimal>,
    pub ctr: Option<f64>,
    pub conversions: Option<u64>,
}

/// Typed view of a campaign list item, read only to build the sync patch.
/// The item itself is handed back to callers untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCampaign {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub objective_type: Option<String>,
    #[serde(default)]
    pub daily_spend_cap: Option<i64>,
    #[serde(default)]
    pub lifetime_spend_cap: Option<i64>,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub summary_stats: Option<SummaryStats>,
}

/// `POST /ad_accounts/{id}/campaigns` response. Only id and status are used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedCampaign {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Remote requests
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteCampaignRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub objective_type: String,
    pub daily_spend_cap: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime_spend_cap: Option<i64>,
    /// Unix seconds.
    pub start_time: i64,
    /// Unix seconds, `null` when open-ended.
    pub end_time: Option<i64>,
    pub tracking_urls: RemoteTrackingUrls,
    pub campaign_targeting: RemoteTargeting,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RemoteTrackingUrls {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub impression: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub click: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteTargeting {
    pub geo_targeting: RemoteGeoTargeting,
    pub demographic_targeting: RemoteDemographics,
    pub interests: Vec<String>,
    pub keywords: Vec<RemoteKeyword>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteGeoTargeting {
    pub locations: Vec<RemoteLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteLocation {
    #[serde(rename = "type")]
    pub location_type: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteDemographics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<RemoteAgeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteAgeRange {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteKeyword {
    pub value: String,
    pub match_type: String,
}

/// `PATCH /ad_accounts/{id}/campaigns` body item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteStatusUpdate {
    pub id: String,
    pub status: String,
}

/// `POST /oauth/token` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Caller-facing inputs and results
// ─────────────────────────────────────────────────────────────────────────────

/// Filters for a campaign list call. Defaults to newest-first by creation time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignFilters {
    pub order: Option<String>,
    pub sort_by: Option<String>,
    pub status: Option<String>,
}

impl CampaignFilters {
    pub fn order_or_default(&self) -> &str {
        self.order.as_deref().unwrap_or("DESCENDING")
    }

    pub fn sort_by_or_default(&self) -> &str {
        self.sort_by.as_deref().unwrap_or("CREATED_TIME")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub click_window_days: Option<u32>,
}

impl AnalyticsParams {
    pub fn validate(&self) -> Result<()> {
        if self.end_date <= self.start_date {
            return Err(ValidationError::field("endDate", "must be after startDate").into());
        }
        Ok(())
    }

    pub fn level_or_default(&self) -> &str {
        self.level
            .as_deref()
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(DEFAULT_ANALYTICS_LEVEL)
    }

    pub fn click_window_or_default(&self) -> u32 {
        self.click_window_days.unwrap_or(DEFAULT_CLICK_WINDOW_DAYS)
    }
}

/// Credential grant handed over by the authorization flow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialGrant {
    pub access_credential: String,
    #[serde(default)]
    pub refresh_credential: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdAccountsResponse {
    pub ad_accounts: Vec<AdAccountRef>,
}

/// The remote page exactly as received, next to the local rows it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCampaignsResponse {
    pub items: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
    pub reconciled: Vec<Campaign>,
}
