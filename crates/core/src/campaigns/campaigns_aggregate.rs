//! Campaign Aggregate behaviour: derived figures, statistics merge, reconciliation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::campaigns_model::{
    Budget, Campaign, CampaignOwner, CampaignStatus, CampaignSyncPatch, DailyPerformance, Money,
    NewCampaign, PerformanceMetrics, Schedule, StatsPatch,
};
use crate::constants::DEFAULT_TIMEZONE;
use crate::utils::time_utils::{day_of, within_window};
use crate::utils::{ErrorEntry, ErrorRing, MergeById};

impl PerformanceMetrics {
    /// `ctr = clicks / impressions * 100`, `cost_per_conversion = spend / conversions`,
    /// each 0 when the denominator is 0.
    pub fn recompute(&mut self) {
        self.ctr = if self.impressions > 0 {
            (self.clicks as f64 * 100.0) / self.impressions as f64
        } else {
            0.0
        };
        self.cost_per_conversion = if self.conversions > 0 {
            self.spend / Decimal::from(self.conversions)
        } else {
            Decimal::ZERO
        };
    }

    pub fn merge(&mut self, patch: &StatsPatch) {
        if let Some(impressions) = patch.impressions {
            self.impressions = impressions;
        }
        if let Some(clicks) = patch.clicks {
            self.clicks = clicks;
        }
        if let Some(spend) = patch.spend {
            self.spend = spend;
        }
        if let Some(ctr) = patch.ctr {
            self.ctr = ctr;
        }
        if let Some(conversions) = patch.conversions {
            self.conversions = conversions;
        }
    }
}

impl Campaign {
    /// Builds the local row for a campaign the remote platform just created.
    ///
    /// The remote create response only echoes id and status; everything else
    /// comes from the request.
    pub fn from_creation(
        request: NewCampaign,
        campaign_id: String,
        remote_status: CampaignStatus,
        owner: CampaignOwner,
        now: DateTime<Utc>,
    ) -> Self {
        let currency = request.currency_or_default();
        let budget = Budget {
            daily: request
                .daily_budget
                .map(|amount| Money::new(amount, currency.clone())),
            lifetime: request
                .lifetime_budget
                .map(|amount| Money::new(amount, currency.clone())),
            spent: Money::zero(currency),
        };
        let schedule = Schedule {
            start_date: request.start_date,
            end_date: request.end_date,
            timezone: request
                .timezone
                .filter(|tz| !tz.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        };

        let mut campaign = Self {
            campaign_id,
            user_id: owner.user_id,
            connected_account_id: owner.connected_account_id,
            ad_account_id: owner.ad_account_id,
            name: request.name.trim().to_string(),
            status: remote_status,
            objective: request.objective,
            budget,
            schedule,
            targeting: request.targeting,
            creatives: request.creatives,
            tracking: request.tracking,
            performance: Default::default(),
            last_sync: now,
            errors: ErrorRing::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        campaign.recompute_derived();
        campaign
    }

    /// `lifetime - spent` when a lifetime budget exists.
    pub fn remaining_budget(&self) -> Option<Decimal> {
        self.budget
            .lifetime
            .as_ref()
            .map(|lifetime| lifetime.amount - self.budget.spent.amount)
    }

    /// Active status and `now` inside the schedule window.
    pub fn is_active_now(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active
            && within_window(now, self.schedule.start_date, self.schedule.end_date)
    }

    pub fn recompute_derived(&mut self) {
        self.performance.total.recompute();
        for day in &mut self.performance.daily {
            day.metrics.recompute();
        }
    }

    /// Merges `patch` into the totals and into today's daily entry.
    ///
    /// Calling this several times on the same day updates one daily entry.
    pub fn update_statistics(&mut self, patch: &StatsPatch, now: DateTime<Utc>) {
        self.performance.total.merge(patch);

        let today = day_of(now);
        let daily = &mut self.performance.daily;
        match daily.iter_mut().find(|entry| entry.date == today) {
            Some(entry) => entry.metrics.merge(patch),
            None => {
                let mut metrics = PerformanceMetrics::default();
                metrics.merge(patch);
                let at = daily.partition_point(|entry| entry.date < today);
                daily.insert(at, DailyPerformance { date: today, metrics });
            }
        }

        self.recompute_derived();
        self.last_sync = now;
        self.updated_at = now;
    }

    pub fn set_status(&mut self, status: CampaignStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn record_error(&mut self, code: &str, message: &str, now: DateTime<Utc>) {
        self.errors.push(ErrorEntry::new(code, message, now));
        self.updated_at = now;
    }
}

impl MergeById for Campaign {
    type Patch = CampaignSyncPatch;

    fn merge_key(&self) -> &str {
        &self.campaign_id
    }

    fn patch_key(patch: &Self::Patch) -> &str {
        &patch.campaign_id
    }

    /// Only status and performance are remote-owned; targeting, schedule and
    /// creatives stay as the creation request set them.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.update_statistics(&patch.stats, now);
    }

    fn from_patch(patch: Self::Patch, now: DateTime<Utc>) -> Self {
        let seed = patch.seed;
        let mut campaign = Self {
            campaign_id: patch.campaign_id,
            user_id: seed.owner.user_id,
            connected_account_id: seed.owner.connected_account_id,
            ad_account_id: seed.owner.ad_account_id,
            name: seed.name,
            status: patch.status.unwrap_or_default(),
            objective: seed.objective,
            budget: seed.budget,
            schedule: seed.schedule,
            targeting: Default::default(),
            creatives: Vec::new(),
            tracking: None,
            performance: Default::default(),
            last_sync: now,
            errors: ErrorRing::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        campaign.update_statistics(&patch.stats, now);
        campaign
    }
}
