//! Campaigns module - the Campaign Aggregate, its validation and repository trait.

mod campaigns_aggregate;
mod campaigns_model;
mod campaigns_traits;
mod campaigns_validation;

pub use campaigns_model::*;
pub use campaigns_traits::CampaignRepositoryTrait;
