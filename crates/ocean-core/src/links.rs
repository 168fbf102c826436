//! Link index
//!
//! Adjacency derived from the link annotations stored on items. For every
//! item id it records the ids it points to (`outgoing`) and the ids that
//! point to it (`incoming`). The annotations are authoritative; this index
//! can always be rebuilt from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Neighbours of one item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency {
    #[serde(default)]
    pub incoming: Vec<String>,
    #[serde(default)]
    pub outgoing: Vec<String>,
}

impl Adjacency {
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

/// Item id → adjacency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkIndex {
    entries: BTreeMap<String, Adjacency>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directed link; returns false if it was already known
    pub fn insert(&mut self, source: &str, target: &str) -> bool {
        let added = push_id(
            &mut self.entries.entry(source.to_string()).or_default().outgoing,
            target,
        );
        push_id(
            &mut self.entries.entry(target.to_string()).or_default().incoming,
            source,
        );
        added
    }

    pub fn get(&self, id: &str) -> Option<&Adjacency> {
        self.entries.get(id)
    }

    pub fn outgoing(&self, id: &str) -> &[String] {
        self.entries
            .get(id)
            .map(|adj| adj.outgoing.as_slice())
            .unwrap_or(&[])
    }

    pub fn incoming(&self, id: &str) -> &[String] {
        self.entries
            .get(id)
            .map(|adj| adj.incoming.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, source: &str, target: &str) -> bool {
        self.outgoing(source).iter().any(|id| id == target)
    }

    /// Remove one directed link from both ends
    pub fn remove(&mut self, source: &str, target: &str) -> bool {
        let mut removed = false;
        if let Some(adj) = self.entries.get_mut(source) {
            let before = adj.outgoing.len();
            adj.outgoing.retain(|id| id != target);
            removed = adj.outgoing.len() != before;
        }
        if let Some(adj) = self.entries.get_mut(target) {
            adj.incoming.retain(|id| id != source);
        }
        self.entries.retain(|_, adj| !adj.is_empty());
        removed
    }

    /// Drop every id `keep` rejects, as an entry and as a neighbour;
    /// returns how many references went
    pub fn retain_ids(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let mut removed = 0;
        self.entries.retain(|id, adj| {
            if !keep(id) {
                removed += adj.incoming.len() + adj.outgoing.len();
                return false;
            }
            let before = adj.incoming.len() + adj.outgoing.len();
            adj.incoming.retain(|n| keep(n));
            adj.outgoing.retain(|n| keep(n));
            removed += before - (adj.incoming.len() + adj.outgoing.len());
            !adj.is_empty()
        });
        removed
    }

    /// Every directed (source, target) pair
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(source, adj)| {
            adj.outgoing
                .iter()
                .map(move |target| (source.as_str(), target.as_str()))
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of items with at least one neighbour
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn push_id(ids: &mut Vec<String>, id: &str) -> bool {
    if ids.iter().any(|existing| existing == id) {
        return false;
    }
    ids.push(id.to_string());
    true
}
