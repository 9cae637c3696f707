//! Fixed-capacity error log attached to connected accounts and campaigns.
//!
//! Storage is a single vector that grows to [`ERROR_RING_CAPACITY`] and then
//! overwrites in place; `next` is the eviction index (the oldest entry once the
//! ring is full). Serialized as a plain list ordered oldest to newest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::ERROR_RING_CAPACITY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub code: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEntry {
    pub fn new(code: impl Into<String>, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ErrorEntry>", into = "Vec<ErrorEntry>")]
pub struct ErrorRing {
    slots: Vec<ErrorEntry>,
    next: usize,
}

impl ErrorRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn capacity(&self) -> usize {
        ERROR_RING_CAPACITY
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends an entry, returning the evicted oldest entry when the ring was full.
    pub fn push(&mut self, entry: ErrorEntry) -> Option<ErrorEntry> {
        if self.slots.len() < ERROR_RING_CAPACITY {
            self.slots.push(entry);
            self.next = self.slots.len() % ERROR_RING_CAPACITY;
            return None;
        }

        let evicted = std::mem::replace(&mut self.slots[self.next], entry);
        self.next = (self.next + 1) % ERROR_RING_CAPACITY;
        Some(evicted)
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        let split = if self.slots.len() < ERROR_RING_CAPACITY {
            0
        } else {
            self.next
        };
        self.slots[split..].iter().chain(self.slots[..split].iter())
    }

    pub fn oldest(&self) -> Option<&ErrorEntry> {
        self.iter().next()
    }

    pub fn newest(&self) -> Option<&ErrorEntry> {
        self.iter().last()
    }
}

impl PartialEq for ErrorRing {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl From<Vec<ErrorEntry>> for ErrorRing {
    fn from(entries: Vec<ErrorEntry>) -> Self {
        let mut ring = ErrorRing::new();
        for entry in entries {
            ring.push(entry);
        }
        ring
    }
}

impl From<ErrorRing> for Vec<ErrorEntry> {
    fn from(ring: ErrorRing) -> Self {
        ring.iter().cloned().collect()
    }
}
