//! Adsync Core - domain entities, credential policy and error taxonomy.
//!
//! This crate owns the local side of the ad platform link: connected accounts
//! and their credentials, campaigns and their performance aggregates, and the
//! classification of every failure into a bounded set of error codes.
//! It is database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate; the remote side lives in `connect`.

pub mod campaigns;
pub mod classification;
pub mod connected_accounts;
pub mod constants;
pub mod errors;
pub mod utils;

// Re-export error types
pub use classification::{ClassifiedError, ErrorCode};
pub use errors::Error;
pub use errors::Result;
