// src/dedup.rs
use std::collections::HashSet;

use crate::fingerprint::Fingerprint;

/// Fingerprints already notified during this process lifetime.
///
/// Grows monotonically: no eviction, no TTL, nothing persisted. A restart
/// forgets everything, so each live listing may be notified once more.
/// Owned by the single watcher task, so no locking.
#[derive(Debug, Default)]
pub struct SeenSet {
    inner: HashSet<Fingerprint>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, key: &Fingerprint) -> bool {
        self.inner.contains(key)
    }

    /// Returns `true` when `key` was not recorded before.
    pub fn mark_seen(&mut self, key: Fingerprint) -> bool {
        self.inner.insert(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
