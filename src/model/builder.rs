// Turns purchase histories into item affinity scores
//
// Each customer's list is walked index pair by index pair. Two different
// items at positions i < j count as one co-occurrence, so someone who bought
// milk twice and bread once adds 2 to (milk, bread). Scores have always been
// computed with that inflation, keep it.

use super::{AffinityModel, ModelStats, TransactionSet};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Raw counts gathered in the first pass over the transactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooccurrenceCounts {
    frequency: HashMap<String, u64>,
    cooccurrence: HashMap<String, HashMap<String, u64>>,
    customers: usize,
}

impl CooccurrenceCounts {
    /// How many times an item was bought across all customers
    pub fn frequency(&self, item: &str) -> u64 {
        self.frequency.get(item).copied().unwrap_or(0)
    }

    /// Co-occurrence count for a pair. Symmetric.
    pub fn cooccurrence(&self, item: &str, other: &str) -> u64 {
        self.cooccurrence
            .get(item)
            .and_then(|related| related.get(other))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all item frequencies
    pub fn total_occurrences(&self) -> u64 {
        self.frequency.values().sum()
    }

    pub fn distinct_items(&self) -> usize {
        self.frequency.len()
    }

    pub fn customers(&self) -> usize {
        self.customers
    }

    /// Number of distinct unordered pairs with a nonzero count
    pub fn pair_count(&self) -> usize {
        let directed: usize = self.cooccurrence.values().map(HashMap::len).sum();
        directed / 2
    }

    fn bump(&mut self, item: &str, other: &str) {
        *self
            .cooccurrence
            .entry(item.to_string())
            .or_default()
            .entry(other.to_string())
            .or_insert(0) += 1;
    }
}

/// Builds an [`AffinityModel`] in one batch
pub struct ModelBuilder;

impl ModelBuilder {
    /// Count and normalize in one go
    pub fn build(transactions: &TransactionSet) -> AffinityModel {
        let counts = Self::count(transactions);
        Self::normalize(&counts)
    }

    /// First pass: item frequencies and index-pair co-occurrences
    pub fn count(transactions: &TransactionSet) -> CooccurrenceCounts {
        let mut counts = CooccurrenceCounts::default();

        for items in transactions.values() {
            counts.customers += 1;

            for (i, item) in items.iter().enumerate() {
                *counts.frequency.entry(item.clone()).or_insert(0) += 1;

                for other in &items[i + 1..] {
                    if item != other {
                        counts.bump(item, other);
                        counts.bump(other, item);
                    }
                }
            }
        }

        debug!(
            customers = counts.customers,
            items = counts.distinct_items(),
            pairs = counts.pair_count(),
            "counted co-occurrences"
        );

        counts
    }

    /// Second pass: turn every nonzero pair count into a score
    pub fn normalize(counts: &CooccurrenceCounts) -> AffinityModel {
        let mut scores: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

        for (item, related) in &counts.cooccurrence {
            let item_freq = counts.frequency(item);

            let neighbors = related
                .iter()
                .map(|(other, &together)| {
                    let score =
                        Self::affinity_score(together, item_freq, counts.frequency(other));
                    (other.clone(), score)
                })
                .collect();

            scores.insert(item.clone(), neighbors);
        }

        let stats = ModelStats {
            customers: counts.customers(),
            distinct_items: counts.distinct_items(),
            item_occurrences: counts.total_occurrences(),
            item_pairs: counts.pair_count(),
            connected_items: scores.len(),
        };

        info!(
            customers = stats.customers,
            items = stats.distinct_items,
            connected = stats.connected_items,
            pairs = stats.item_pairs,
            "affinity model built"
        );

        AffinityModel::new(scores, stats)
    }

    /// together / (freq_a + freq_b - together)
    ///
    /// Repeat purchases can push `together` past one of the frequencies, which
    /// would shrink the denominator to zero or below. The denominator never
    /// drops under `together`, so the score stays in (0, 1].
    pub fn affinity_score(together: u64, freq_a: u64, freq_b: u64) -> f64 {
        if together == 0 {
            return 0.0;
        }

        let union = freq_a
            .saturating_add(freq_b)
            .saturating_sub(together)
            .max(together);
        together as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transactions(rows: Vec<(&str, Vec<&str>)>) -> TransactionSet {
        rows.into_iter()
            .map(|(customer, items)| {
                (
                    customer.to_string(),
                    items.iter().map(|i| i.to_string()).collect(),
                )
            })
            .collect()
    }

    fn groceries() -> TransactionSet {
        transactions(vec![
            ("C1", vec!["milk", "bread"]),
            ("C2", vec!["milk", "bread"]),
            ("C3", vec!["milk", "eggs"]),
        ])
    }

    #[test]
    fn test_count_groceries() {
        let counts = ModelBuilder::count(&groceries());

        assert_eq!(counts.frequency("milk"), 3);
        assert_eq!(counts.frequency("bread"), 2);
        assert_eq!(counts.frequency("eggs"), 1);
        assert_eq!(counts.cooccurrence("milk", "bread"), 2);
        assert_eq!(counts.cooccurrence("bread", "milk"), 2);
        assert_eq!(counts.cooccurrence("milk", "eggs"), 1);
        assert_eq!(counts.cooccurrence("bread", "eggs"), 0);
        assert_eq!(counts.total_occurrences(), 6);
        assert_eq!(counts.pair_count(), 2);
        assert_eq!(counts.customers(), 3);
    }

    #[test]
    fn test_build_groceries_scores() {
        let model = ModelBuilder::build(&groceries());

        assert_relative_eq!(model.score("milk", "bread").unwrap(), 2.0 / 3.0);
        assert_relative_eq!(model.score("milk", "eggs").unwrap(), 1.0 / 3.0);
        assert_eq!(model.score("bread", "eggs"), None);
    }

    #[test]
    fn test_repeats_inflate_pair_counts() {
        // milk at 0 and 2 both pair with bread at 1
        let counts = ModelBuilder::count(&transactions(vec![("C1", vec!["milk", "bread", "milk"])]));

        assert_eq!(counts.frequency("milk"), 2);
        assert_eq!(counts.cooccurrence("milk", "bread"), 2);
        // the milk/milk pair is not counted
        assert_eq!(counts.cooccurrence("milk", "milk"), 0);
    }

    #[test]
    fn test_score_never_divides_by_zero() {
        // 2 + 2 - 4 = 0 without the floor on the denominator
        let counts = ModelBuilder::count(&transactions(vec![("C1", vec!["a", "a", "b", "b"])]));
        assert_eq!(counts.cooccurrence("a", "b"), 4);

        let model = ModelBuilder::normalize(&counts);
        let score = model.score("a", "b").unwrap();
        assert!(score.is_finite());
        assert_relative_eq!(score, 1.0);
    }

    #[test]
    fn test_affinity_score_formula() {
        assert_relative_eq!(ModelBuilder::affinity_score(2, 3, 2), 2.0 / 3.0);
        assert_relative_eq!(ModelBuilder::affinity_score(1, 1, 1), 1.0);
        assert_eq!(ModelBuilder::affinity_score(0, 5, 5), 0.0);
        // more co-occurrences than both frequencies combined
        assert_relative_eq!(ModelBuilder::affinity_score(9, 3, 3), 1.0);
    }

    #[test]
    fn test_affinity_score_huge_counts() {
        let score = ModelBuilder::affinity_score(1, u64::MAX, u64::MAX);
        assert!(score > 0.0 && score <= 1.0);

        assert_relative_eq!(ModelBuilder::affinity_score(u64::MAX, u64::MAX, 1), 1.0);
    }

    #[test]
    fn test_scores_symmetric_and_in_range() {
        let model = ModelBuilder::build(&transactions(vec![
            ("C1", vec!["milk", "bread", "butter", "milk"]),
            ("C2", vec!["bread", "jam"]),
            ("C3", vec!["milk", "jam", "jam", "eggs"]),
            ("C4", vec!["eggs"]),
            ("C5", vec!["butter", "bread", "butter", "bread"]),
        ]));

        for item in model.items() {
            for (other, &score) in model.neighbors(item).unwrap() {
                assert!(score > 0.0 && score <= 1.0, "{item}/{other} = {score}");
                assert_eq!(model.score(other, item), Some(score));
            }
        }
    }

    #[test]
    fn test_lonely_items_left_out() {
        let model = ModelBuilder::build(&transactions(vec![
            ("C1", vec!["milk", "bread"]),
            ("C2", vec!["caviar"]),
            ("C3", vec!["salt", "salt"]),
        ]));

        assert!(model.contains("milk"));
        assert!(!model.contains("caviar"));
        assert!(!model.contains("salt"));
        assert_eq!(model.stats().distinct_items, 4);
        assert_eq!(model.stats().connected_items, 2);
    }

    #[test]
    fn test_empty_transactions() {
        let model = ModelBuilder::build(&TransactionSet::new());
        assert!(model.is_empty());
        assert_eq!(model.stats().customers, 0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let data = transactions(vec![
            ("C1", vec!["a", "b", "c", "a"]),
            ("C2", vec!["b", "c"]),
            ("C3", vec!["c", "d", "a"]),
        ]);

        let first = ModelBuilder::build(&data);
        let second = ModelBuilder::build(&data.clone());

        for item in first.items() {
            for (other, score) in first.neighbors(item).unwrap() {
                let again = second.score(item, other).unwrap();
                assert_eq!(score.to_bits(), again.to_bits());
            }
        }
        assert_eq!(first, second);
    }
}
