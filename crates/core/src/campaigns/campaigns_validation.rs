//! Input validation for campaign requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use super::campaigns_model::{CampaignStatus, CampaignStatusUpdate, NewCampaign, Targeting};
use crate::constants::{
    CAMPAIGN_NAME_MAX_LEN, CAMPAIGN_NAME_MIN_LEN, MAX_TARGET_AGE, MIN_DAILY_BUDGET, MIN_TARGET_AGE,
};
use crate::errors::{Result, ValidationError};

impl NewCampaign {
    /// Validates a creation request against `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        let name_len = self.name.trim().chars().count();
        if name_len < CAMPAIGN_NAME_MIN_LEN || name_len > CAMPAIGN_NAME_MAX_LEN {
            return Err(ValidationError::field(
                "name",
                format!(
                    "must be between {} and {} characters",
                    CAMPAIGN_NAME_MIN_LEN, CAMPAIGN_NAME_MAX_LEN
                ),
            )
            .into());
        }

        match self.daily_budget {
            None => return Err(ValidationError::MissingField("dailyBudget".to_string()).into()),
            Some(amount) if amount < Decimal::from(MIN_DAILY_BUDGET) => {
                return Err(ValidationError::field(
                    "dailyBudget",
                    format!("must be at least {}", MIN_DAILY_BUDGET),
                )
                .into());
            }
            Some(_) => {}
        }

        if let Some(lifetime) = self.lifetime_budget {
            if lifetime <= Decimal::ZERO {
                return Err(ValidationError::field("lifetimeBudget", "must be positive").into());
            }
        }

        if self.start_date <= now {
            return Err(ValidationError::field("startDate", "must be in the future").into());
        }
        if let Some(end) = self.end_date {
            if end <= self.start_date {
                return Err(ValidationError::field("endDate", "must be after startDate").into());
            }
        }

        if matches!(self.status, Some(CampaignStatus::Archived)) {
            return Err(
                ValidationError::field("status", "a new campaign cannot be archived").into(),
            );
        }

        self.targeting.validate()
    }
}

impl Targeting {
    pub fn validate(&self) -> Result<()> {
        if let Some(range) = self.age_range {
            let in_bounds = |age: u8| (MIN_TARGET_AGE..=MAX_TARGET_AGE).contains(&age);
            if !in_bounds(range.min) || !in_bounds(range.max) || range.min > range.max {
                return Err(ValidationError::field(
                    "targeting.ageRange",
                    format!(
                        "must satisfy {} <= min <= max <= {}",
                        MIN_TARGET_AGE, MAX_TARGET_AGE
                    ),
                )
                .into());
            }
        }
        if self.keywords.iter().any(|k| k.text.trim().is_empty()) {
            return Err(ValidationError::field("targeting.keywords", "keyword text is empty").into());
        }
        Ok(())
    }
}

impl CampaignStatusUpdate {
    /// Parses a caller patch that may only carry `status`.
    ///
    /// Any other field is rejected, as is moving a campaign back to draft.
    pub fn from_patch(patch: &Value) -> Result<Self> {
        let object = patch
            .as_object()
            .ok_or_else(|| ValidationError::InvalidInput("patch must be an object".to_string()))?;

        if let Some(field) = object.keys().find(|key| key.as_str() != "status") {
            return Err(ValidationError::ForbiddenField(field.clone()).into());
        }

        let raw = object
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::MissingField("status".to_string()))?;
        let status: CampaignStatus = raw.parse()?;
        if status == CampaignStatus::Draft {
            return Err(ValidationError::field("status", "cannot return a campaign to draft").into());
        }

        Ok(Self { status })
    }
}
