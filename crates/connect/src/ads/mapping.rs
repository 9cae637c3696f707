//! Schema translation between local campaign models and remote wire shapes.
//!
//! Pure functions: no I/O, no clock reads. Money crosses the boundary as
//! integer micro-units (`amount * 1_000_000`, rounded half away from zero).

use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use adsync_core::campaigns::{
    Budget, CampaignObjective, CampaignOwner, CampaignSeed, CampaignStatus, CampaignSyncPatch,
    Gender, Money, NewCampaign, Schedule, StatsPatch, Targeting,
};
use adsync_core::connected_accounts::{AdAccountPatch, AdAccountStatus};
use adsync_core::constants::{CURRENCY_DECIMAL_PRECISION, MICROS_PER_UNIT};
use adsync_core::errors::{Result, ValidationError};

use super::models::{
    RemoteAdAccount, RemoteAgeRange, RemoteCampaign, RemoteCampaignRequest, RemoteDemographics,
    RemoteGeoTargeting, RemoteKeyword, RemoteLocation, RemoteTargeting, RemoteTrackingUrls,
};

/// Converts a major-unit amount to integer micro-units.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    amount
        .checked_mul(Decimal::from(MICROS_PER_UNIT))
        .map(|micros| micros.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|micros| micros.to_i64())
        .ok_or_else(|| {
            ValidationError::InvalidInput(format!("amount {} is out of range", amount)).into()
        })
}

/// Converts micro-units back to a major-unit amount at currency precision.
pub fn from_minor_units(micros: i64) -> Decimal {
    (Decimal::from(micros) / Decimal::from(MICROS_PER_UNIT))
        .round_dp_with_strategy(
            CURRENCY_DECIMAL_PRECISION,
            RoundingStrategy::MidpointAwayFromZero,
        )
        .normalize()
}

fn to_unix_seconds(instant: DateTime<Utc>) -> i64 {
    instant.timestamp()
}

fn from_unix_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

/// Builds the remote create payload for a validated creation request.
pub fn to_remote_campaign(request: &NewCampaign) -> Result<RemoteCampaignRequest> {
    let tracking_urls = request
        .tracking
        .as_ref()
        .map(|tracking| RemoteTrackingUrls {
            impression: tracking.urls.impression.clone(),
            click: tracking.urls.click.clone(),
        })
        .unwrap_or_default();

    Ok(RemoteCampaignRequest {
        name: request.name.trim().to_string(),
        status: request.status.map(|status| status.as_remote().to_string()),
        objective_type: request.objective.as_remote().to_string(),
        daily_spend_cap: request.daily_budget.map(to_minor_units).transpose()?,
        lifetime_spend_cap: request.lifetime_budget.map(to_minor_units).transpose()?,
        start_time: to_unix_seconds(request.start_date),
        end_time: request.end_date.map(to_unix_seconds),
        tracking_urls,
        campaign_targeting: to_remote_targeting(&request.targeting),
    })
}

pub fn to_remote_targeting(targeting: &Targeting) -> RemoteTargeting {
    let gender = targeting.gender.map(|gender| {
        match gender {
            Gender::All => "ALL",
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
        .to_string()
    });

    RemoteTargeting {
        geo_targeting: RemoteGeoTargeting {
            locations: targeting
                .locations
                .iter()
                .map(|location| RemoteLocation {
                    location_type: serde_label(&location.location_type),
                    id: location.id.clone(),
                })
                .collect(),
        },
        demographic_targeting: RemoteDemographics {
            age_range: targeting.age_range.map(|range| RemoteAgeRange {
                min: range.min,
                max: range.max,
            }),
            gender,
            languages: targeting.languages.clone(),
        },
        interests: targeting
            .interests
            .iter()
            .map(|interest| interest.id.clone())
            .collect(),
        keywords: targeting
            .keywords
            .iter()
            .map(|keyword| RemoteKeyword {
                value: keyword.text.trim().to_string(),
                match_type: serde_label(&keyword.match_type),
            })
            .collect(),
    }
}

/// The serialized name of a unit enum variant, e.g. `COUNTRY`.
fn serde_label<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Remote-owned fields of a campaign list item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteCampaignSummary {
    pub status: Option<CampaignStatus>,
    pub stats: StatsPatch,
}

/// Extracts status and summary statistics. Fields the item does not carry stay `None`.
pub fn from_remote_campaign_summary(remote: &RemoteCampaign) -> RemoteCampaignSummary {
    let status = remote.status.as_deref().and_then(|raw| match raw.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            debug!("Ignoring unknown remote status '{}' for {}", raw, remote.id);
            None
        }
    });

    let stats = remote
        .summary_stats
        .as_ref()
        .map(|summary| StatsPatch {
            impressions: summary.impressions,
            clicks: summary.clicks,
            spend: summary.spend,
            ctr: summary.ctr,
            conversions: summary.conversions,
        })
        .unwrap_or_default();

    RemoteCampaignSummary { status, stats }
}

/// Maps a remote objective onto the local three-way objective.
pub fn objective_from_remote(raw: Option<&str>) -> CampaignObjective {
    let raw = raw.map(str::to_ascii_uppercase).unwrap_or_default();
    if let Ok(objective) = raw.parse() {
        return objective;
    }
    if raw.contains("CONVERSION") || raw.contains("SALES") {
        CampaignObjective::Conversion
    } else if raw.contains("AWARENESS") || raw.contains("VIDEO") {
        CampaignObjective::Awareness
    } else {
        CampaignObjective::Consideration
    }
}

/// Builds the reconciliation patch for one list item.
///
/// The seed only matters when no local row exists yet: it carries enough of
/// the remote item to adopt the campaign.
pub fn to_sync_patch(
    remote: &RemoteCampaign,
    owner: CampaignOwner,
    currency: &str,
    now: DateTime<Utc>,
) -> CampaignSyncPatch {
    let summary = from_remote_campaign_summary(remote);
    let money = |micros: i64| Money::new(from_minor_units(micros), currency);

    let schedule = Schedule {
        start_date: remote
            .start_time
            .and_then(from_unix_seconds)
            .unwrap_or(now),
        end_date: remote.end_time.and_then(from_unix_seconds),
        ..Schedule::starting(now)
    };

    CampaignSyncPatch {
        campaign_id: remote.id.clone(),
        status: summary.status,
        stats: summary.stats,
        seed: CampaignSeed {
            owner,
            name: remote
                .name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| remote.id.clone()),
            objective: objective_from_remote(remote.objective_type.as_deref()),
            budget: Budget {
                daily: remote.daily_spend_cap.map(money),
                lifetime: remote.lifetime_spend_cap.map(money),
                spent: Money::zero(currency),
            },
            schedule,
        },
    }
}

pub fn to_ad_account_patch(remote: RemoteAdAccount, default_currency: &str) -> AdAccountPatch {
    AdAccountPatch {
        name: remote.name.unwrap_or_else(|| remote.id.clone()),
        status: AdAccountStatus::from_remote(remote.status.as_deref()),
        currency: remote
            .currency
            .filter(|currency| !currency.is_empty())
            .unwrap_or_else(|| default_currency.to_string()),
        country: remote.country,
        id: remote.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsync_core::campaigns::{
        AgeRange, Keyword, KeywordMatch, LocationType, TargetLocation, Tracking, TrackingUrls,
    };
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn request() -> NewCampaign {
        NewCampaign {
            name: " Spring ".to_string(),
            objective: CampaignObjective::Awareness,
            status: None,
            daily_budget: Some(dec!(12.50)),
            lifetime_budget: None,
            currency: None,
            start_date: Utc.with_ymd_and_hms(2030, 4, 1, 0, 0, 0).unwrap(),
            end_date: None,
            timezone: None,
            targeting: Targeting {
                locations: vec![TargetLocation {
                    location_type: LocationType::Country,
                    id: "FR".to_string(),
                    name: None,
                }],
                languages: vec!["fr".to_string()],
                age_range: Some(AgeRange { min: 25, max: 44 }),
                gender: Some(Gender::Female),
                interests: vec![],
                keywords: vec![Keyword {
                    text: "linen".to_string(),
                    match_type: KeywordMatch::Exact,
                }],
            },
            creatives: vec![],
            tracking: None,
        }
    }

    #[test]
    fn test_minor_units_round_half_away_from_zero() {
        assert_eq!(to_minor_units(dec!(12.50)).unwrap(), 12_500_000);
        assert_eq!(to_minor_units(dec!(0.0000005)).unwrap(), 1);
        assert_eq!(to_minor_units(dec!(0.0000004)).unwrap(), 0);
        assert_eq!(from_minor_units(12_500_000), dec!(12.5));
        assert_eq!(from_minor_units(1_234_567), dec!(1.23));
    }

    #[test]
    fn test_to_remote_campaign_shape() {
        let remote = to_remote_campaign(&request()).unwrap();
        let body = serde_json::to_value(&remote).unwrap();

        assert_eq!(body["name"], json!("Spring"));
        assert_eq!(body["objective_type"], json!("AWARENESS"));
        assert_eq!(body["daily_spend_cap"], json!(12_500_000));
        assert!(body.get("lifetime_spend_cap").is_none());
        assert!(body.get("status").is_none());
        assert_eq!(body["end_time"], json!(null));
        assert_eq!(body["start_time"], json!(1_901_232_000));
        assert_eq!(body["tracking_urls"], json!({}));
        assert_eq!(
            body["campaign_targeting"],
            json!({
                "geo_targeting": { "locations": [{ "type": "COUNTRY", "id": "FR" }] },
                "demographic_targeting": {
                    "age_range": { "min": 25, "max": 44 },
                    "gender": "FEMALE",
                    "languages": ["fr"]
                },
                "interests": [],
                "keywords": [{ "value": "linen", "match_type": "EXACT" }]
            })
        );
    }

    #[test]
    fn test_to_remote_campaign_with_lifetime_and_tracking() {
        let mut input = request();
        input.lifetime_budget = Some(dec!(300));
        input.end_date = Some(input.start_date + Duration::days(30));
        input.tracking = Some(Tracking {
            urls: TrackingUrls {
                impression: vec![],
                click: vec!["https://t.example/c".to_string()],
            },
            ..Default::default()
        });

        let body = serde_json::to_value(to_remote_campaign(&input).unwrap()).unwrap();
        assert_eq!(body["lifetime_spend_cap"], json!(300_000_000));
        assert_eq!(body["end_time"], json!(1_901_232_000 + 30 * 86_400));
        assert_eq!(
            body["tracking_urls"],
            json!({ "click": ["https://t.example/c"] })
        );
    }

    #[test]
    fn test_summary_only_carries_remote_fields() {
        let remote: RemoteCampaign = serde_json::from_value(json!({
            "id": "cmp_9",
            "status": "PAUSED",
            "summary_stats": { "impressions": 200, "clicks": 10 },
            "created_time": 1_700_000_000
        }))
        .unwrap();

        let summary = from_remote_campaign_summary(&remote);
        assert_eq!(summary.status, Some(CampaignStatus::Paused));
        assert_eq!(summary.stats.impressions, Some(200));
        assert_eq!(summary.stats.clicks, Some(10));
        assert_eq!(summary.stats.spend, None);

        let bare: RemoteCampaign =
            serde_json::from_value(json!({ "id": "cmp_1", "status": "DELETED" })).unwrap();
        let summary = from_remote_campaign_summary(&bare);
        assert_eq!(summary.status, None);
        assert!(summary.stats.is_empty());
    }

    #[test]
    fn test_sync_patch_seed_for_adoption() {
        let now = Utc::now();
        let remote: RemoteCampaign = serde_json::from_value(json!({
            "id": "cmp_orphan",
            "name": "Recovered",
            "status": "ACTIVE",
            "objective_type": "WEB_CONVERSION",
            "daily_spend_cap": 12_500_000,
            "lifetime_spend_cap": 300_000_000,
            "start_time": 1_901_232_000
        }))
        .unwrap();
        let owner = CampaignOwner {
            user_id: "user-1".to_string(),
            connected_account_id: "conn-1".to_string(),
            ad_account_id: "act_1".to_string(),
        };

        let patch = to_sync_patch(&remote, owner, "EUR", now);
        assert_eq!(patch.campaign_id, "cmp_orphan");
        assert_eq!(patch.seed.name, "Recovered");
        assert_eq!(patch.seed.objective, CampaignObjective::Conversion);
        assert_eq!(patch.seed.budget.daily.unwrap().amount, dec!(12.5));
        assert_eq!(patch.seed.budget.lifetime.unwrap().amount, dec!(300));
        assert_eq!(
            patch.seed.schedule.start_date,
            Utc.with_ymd_and_hms(2030, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_ad_account_patch_defaults() {
        let patch = to_ad_account_patch(
            RemoteAdAccount {
                id: "act_1".to_string(),
                name: None,
                status: Some("ACTIVE".to_string()),
                currency: None,
                country: Some("FR".to_string()),
            },
            "EUR",
        );
        assert_eq!(patch.name, "act_1");
        assert_eq!(patch.status, AdAccountStatus::Active);
        assert_eq!(patch.currency, "EUR");
    }
}
