//! Campaign domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{DEFAULT_CURRENCY, DEFAULT_TIMEZONE};
use crate::errors::{Error, Result, ValidationError};
use crate::utils::ErrorRing;

/// Lifecycle status of a campaign. Archival is a status, never a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Archived,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Archived => "archived",
        }
    }

    /// Upper-case form used on the wire.
    pub fn as_remote(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Active => "ACTIVE",
            CampaignStatus::Paused => "PAUSED",
            CampaignStatus::Archived => "ARCHIVED",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(CampaignStatus::Draft),
            "ACTIVE" => Ok(CampaignStatus::Active),
            "PAUSED" => Ok(CampaignStatus::Paused),
            "ARCHIVED" => Ok(CampaignStatus::Archived),
            other => Err(Error::Validation(ValidationError::field(
                "status",
                format!("unknown campaign status '{}'", other),
            ))),
        }
    }
}

impl TryFrom<String> for CampaignStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CampaignObjective {
    Awareness,
    Consideration,
    Conversion,
}

impl CampaignObjective {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignObjective::Awareness => "awareness",
            CampaignObjective::Consideration => "consideration",
            CampaignObjective::Conversion => "conversion",
        }
    }

    pub fn as_remote(&self) -> &'static str {
        match self {
            CampaignObjective::Awareness => "AWARENESS",
            CampaignObjective::Consideration => "CONSIDERATION",
            CampaignObjective::Conversion => "CONVERSION",
        }
    }
}

impl FromStr for CampaignObjective {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AWARENESS" => Ok(CampaignObjective::Awareness),
            "CONSIDERATION" => Ok(CampaignObjective::Consideration),
            "CONVERSION" | "CONVERSIONS" => Ok(CampaignObjective::Conversion),
            other => Err(Error::Validation(ValidationError::field(
                "objective",
                format!("unknown objective '{}'", other),
            ))),
        }
    }
}

impl TryFrom<String> for CampaignObjective {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// An amount in major currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub daily: Option<Money>,
    pub lifetime: Option<Money>,
    pub spent: Money,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            daily: None,
            lifetime: None,
            spent: Money::zero(DEFAULT_CURRENCY),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub timezone: String,
}

impl Schedule {
    pub fn starting(start_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            end_date: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    #[default]
    Country,
    Region,
    Metro,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetLocation {
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    All,
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeywordMatch {
    #[default]
    Broad,
    Exact,
    Phrase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub text: String,
    #[serde(default)]
    pub match_type: KeywordMatch,
}

/// Audience selection. Owned by the creation request; list syncs never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Targeting {
    pub locations: Vec<TargetLocation>,
    pub languages: Vec<String>,
    pub age_range: Option<AgeRange>,
    pub gender: Option<Gender>,
    pub interests: Vec<Interest>,
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreativeType {
    Pin,
    Image,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreativeStatus {
    Active,
    Paused,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreativeStats {
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub spend: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    pub id: String,
    #[serde(rename = "type")]
    pub creative_type: CreativeType,
    pub pin_id: Option<String>,
    pub image_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination_url: Option<String>,
    pub status: Option<CreativeStatus>,
    #[serde(default)]
    pub statistics: CreativeStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrackingUrls {
    pub impression: Vec<String>,
    pub click: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UtmParameters {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tracking {
    pub urls: TrackingUrls,
    pub parameters: UtmParameters,
}

/// One row of performance figures. `ctr` and `cost_per_conversion` are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub spend: Decimal,
    pub ctr: f64,
    pub conversions: u64,
    pub cost_per_conversion: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPerformance {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Performance {
    /// Ordered by date, at most one entry per day.
    pub daily: Vec<DailyPerformance>,
    pub total: PerformanceMetrics,
}

/// Partial statistics merged into `performance`. Absent fields keep their value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsPatch {
    pub impressions: Option<u64>,
    pub clicks: Option<u64>,
    pub spend: Option<Decimal>,
    pub ctr: Option<f64>,
    pub conversions: Option<u64>,
}

impl StatsPatch {
    pub fn is_empty(&self) -> bool {
        self.impressions.is_none()
            && self.clicks.is_none()
            && self.spend.is_none()
            && self.ctr.is_none()
            && self.conversions.is_none()
    }
}

/// One campaign, identified by its remote id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub campaign_id: String,
    pub user_id: String,
    /// Lookup reference only; deleting the connected account keeps the campaign.
    pub connected_account_id: String,
    pub ad_account_id: String,
    pub name: String,
    pub status: CampaignStatus,
    pub objective: CampaignObjective,
    pub budget: Budget,
    pub schedule: Schedule,
    pub targeting: Targeting,
    pub creatives: Vec<Creative>,
    pub tracking: Option<Tracking>,
    pub performance: Performance,
    pub last_sync: DateTime<Utc>,
    pub errors: ErrorRing,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campaign creation payload as sent by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    pub name: String,
    pub objective: CampaignObjective,
    #[serde(default)]
    pub status: Option<CampaignStatus>,
    #[serde(default)]
    pub daily_budget: Option<Decimal>,
    #[serde(default)]
    pub lifetime_budget: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub creatives: Vec<Creative>,
    #[serde(default)]
    pub tracking: Option<Tracking>,
}

impl NewCampaign {
    pub fn currency_or_default(&self) -> String {
        self.currency
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
    }
}

/// The only mutation callers may apply directly to a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CampaignStatusUpdate {
    pub status: CampaignStatus,
}

/// Owner references stamped on a campaign created or adopted locally.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignOwner {
    pub user_id: String,
    pub connected_account_id: String,
    pub ad_account_id: String,
}

/// Remote-owned campaign fields from a list sync.
///
/// `seed` is only used when the campaign has no local row yet (orphan adoption);
/// merges into existing rows ignore it.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSyncPatch {
    pub campaign_id: String,
    pub status: Option<CampaignStatus>,
    pub stats: StatsPatch,
    pub seed: CampaignSeed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSeed {
    pub owner: CampaignOwner,
    pub name: String,
    pub objective: CampaignObjective,
    pub budget: Budget,
    pub schedule: Schedule,
}
