//! adsync connect - ad platform integration for adsync.
//!
//! Talks to the remote ad platform over HTTP, translates between local and
//! remote campaign schemas, and reconciles remote state into the local
//! repositories through [`SyncService`].

pub mod ads;
pub mod client;
pub mod config;
pub mod oauth;

pub use ads::{
    AdAccountsResponse, AdPlatformApi, AnalyticsParams, ApiClientProvider, CampaignFilters,
    CredentialGrant, ListCampaignsResponse, SyncService, SyncServiceTrait, TokenExchange,
};
pub use client::{AdPlatformApiClient, HttpClientProvider};
pub use config::ConnectConfig;
pub use oauth::OAuthTokenClient;
