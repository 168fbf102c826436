//! Value index
//!
//! Maps arbitrary values to the ids of the items indexed under them. The
//! relation is many-to-many: an id may sit under many values and a value
//! may hold many ids. Each bucket keeps insertion order and never holds
//! the same id twice. Duplicate insertion is not an error; uniqueness is
//! enforced at lookup time by the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value → ordered set of item ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueIndex {
    buckets: BTreeMap<String, Vec<String>>,
}

impl ValueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` under `value`; returns false if it was already there
    pub fn insert(&mut self, value: &str, id: &str) -> bool {
        let bucket = self.buckets.entry(value.to_string()).or_default();
        if bucket.iter().any(|existing| existing == id) {
            return false;
        }
        bucket.push(id.to_string());
        true
    }

    /// Ids under `value`, in insertion order
    pub fn get(&self, value: &str) -> &[String] {
        self.buckets.get(value).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove `id` from one bucket, dropping the bucket when it empties
    pub fn remove(&mut self, value: &str, id: &str) -> bool {
        let Some(bucket) = self.buckets.get_mut(value) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|existing| existing != id);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            self.buckets.remove(value);
        }
        removed
    }

    /// Remove ids everywhere they appear; returns how many entries went
    pub fn retain_ids(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let mut removed = 0;
        self.buckets.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|id| keep(id));
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        removed
    }

    /// Number of indexed values
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
