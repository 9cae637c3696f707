//! Upsert-by-key with field merge.
//!
//! Ad accounts (embedded in a connected account) and campaigns (one row each)
//! both reconcile remote records the same way: match on the remote id, merge
//! only the fields the remote side owns, or create the record when absent.
//! Each entity states its key and mergeable fields once, through [`MergeById`].

use chrono::{DateTime, Utc};

/// A record that can absorb remote patches keyed by a remote id.
pub trait MergeById: Sized {
    /// Remote-owned fields carried by one incoming record.
    type Patch;

    fn merge_key(&self) -> &str;

    fn patch_key(patch: &Self::Patch) -> &str;

    /// Merges the remote-owned fields into an existing record.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    /// Builds a new record from a patch with no local counterpart.
    fn from_patch(patch: Self::Patch, now: DateTime<Utc>) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Merged,
}

/// Upserts `patch` into `items` by key, appending when no item matches.
pub fn upsert_by_key<T: MergeById>(
    items: &mut Vec<T>,
    patch: T::Patch,
    now: DateTime<Utc>,
) -> UpsertOutcome {
    let key = T::patch_key(&patch);
    match items.iter_mut().find(|item| item.merge_key() == key) {
        Some(existing) => {
            existing.apply_patch(patch, now);
            UpsertOutcome::Merged
        }
        None => {
            items.push(T::from_patch(patch, now));
            UpsertOutcome::Inserted
        }
    }
}

/// Single-record form of [`upsert_by_key`], for entities stored one per row.
pub fn upsert_one<T: MergeById>(
    existing: Option<T>,
    patch: T::Patch,
    now: DateTime<Utc>,
) -> (T, UpsertOutcome) {
    match existing {
        Some(mut record) => {
            debug_assert_eq!(record.merge_key(), T::patch_key(&patch));
            record.apply_patch(patch, now);
            (record, UpsertOutcome::Merged)
        }
        None => (T::from_patch(patch, now), UpsertOutcome::Inserted),
    }
}
