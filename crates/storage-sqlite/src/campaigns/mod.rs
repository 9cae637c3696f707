//! SQLite storage implementation for campaigns.

mod model;
mod repository;

pub use model::CampaignDB;
pub use repository::CampaignRepository;
