//! Ad platform boundary: remote models, schema translation and the sync engine.

pub mod mapping;
mod models;
mod service;
mod traits;

pub use models::*;
pub use service::SyncService;
pub use traits::*;
