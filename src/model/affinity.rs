/// The built affinity model
///
/// Read-only once constructed. Share it behind an `Arc` if more than one
/// reader needs it.

use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary numbers gathered while building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub customers: usize,
    pub distinct_items: usize,
    pub item_occurrences: u64,
    /// Unordered item pairs bought together at least once
    pub item_pairs: usize,
    /// Items with at least one neighbor
    pub connected_items: usize,
}

/// Item -> related item -> score in (0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AffinityModel {
    scores: BTreeMap<String, BTreeMap<String, f64>>,
    stats: ModelStats,
}

impl AffinityModel {
    pub(crate) fn new(scores: BTreeMap<String, BTreeMap<String, f64>>, stats: ModelStats) -> Self {
        Self { scores, stats }
    }

    /// Score between two items, if they were ever bought together
    pub fn score(&self, item: &str, related: &str) -> Option<f64> {
        self.scores
            .get(item)
            .and_then(|neighbors| neighbors.get(related))
            .copied()
    }

    /// Every item bought together with `item`, keyed by name
    pub fn neighbors(&self, item: &str) -> Option<&BTreeMap<String, f64>> {
        self.scores.get(item)
    }

    /// Exact, case-sensitive lookup
    pub fn contains(&self, item: &str) -> bool {
        self.scores.contains_key(item)
    }

    /// Items that have at least one neighbor, sorted
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn stats(&self) -> &ModelStats {
        &self.stats
    }

    /// Pretty JSON dump for inspection
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
