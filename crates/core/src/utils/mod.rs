pub mod error_ring;
pub mod time_utils;
pub mod upsert;

pub use error_ring::{ErrorEntry, ErrorRing};
pub use upsert::{upsert_by_key, upsert_one, MergeById, UpsertOutcome};
