/// Ranks related items for a query
///
/// Highest score first. Equal scores fall back to the related item's name in
/// ascending byte order, so the same model always gives the same list.

use super::AffinityModel;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// One ranked entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub item: String,
    pub score: f64,
}

/// Query handle over a shared, immutable model
#[derive(Debug, Clone)]
pub struct Recommender {
    model: Arc<AffinityModel>,
}

impl Recommender {
    pub fn new(model: Arc<AffinityModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &AffinityModel {
        &self.model
    }

    /// Up to `top_n` related item names, most related first
    pub fn recommend(&self, item: &str, top_n: i64) -> Vec<String> {
        recommend(&self.model, item, top_n)
    }

    /// Same as [`Recommender::recommend`] but keeps the scores
    pub fn ranked(&self, item: &str, top_n: i64) -> Vec<Recommendation> {
        ranked(&self.model, item, top_n)
    }
}

/// Up to `top_n` related item names, most related first
///
/// Unknown items and `top_n <= 0` give an empty list.
pub fn recommend(model: &AffinityModel, item: &str, top_n: i64) -> Vec<String> {
    ranked(model, item, top_n)
        .into_iter()
        .map(|rec| rec.item)
        .collect()
}

fn ranked(model: &AffinityModel, item: &str, top_n: i64) -> Vec<Recommendation> {
    if top_n <= 0 {
        return Vec::new();
    }

    let Some(neighbors) = model.neighbors(item) else {
        return Vec::new();
    };

    let mut entries: Vec<(&String, f64)> = neighbors
        .iter()
        .map(|(name, &score)| (name, score))
        .collect();

    entries.sort_by(by_score_then_name);

    let limit = usize::try_from(top_n).unwrap_or(usize::MAX);

    entries
        .into_iter()
        .take(limit)
        .map(|(name, score)| Recommendation {
            item: name.clone(),
            score,
        })
        .collect()
}

fn by_score_then_name(a: &(&String, f64), b: &(&String, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelBuilder, TransactionSet};
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

    fn setup() -> Recommender {
        let model = ModelBuilder::build(&transactions(vec![
            ("C1", vec!["milk", "bread"]),
            ("C2", vec!["milk", "bread"]),
            ("C3", vec!["milk", "eggs"]),
        ]));
        Recommender::new(Arc::new(model))
    }

    #[test]
    fn test_groceries_scenario() {
        let recommender = setup();

        assert_eq!(recommender.recommend("milk", 1), vec!["bread"]);
        assert_eq!(recommender.recommend("milk", 5), vec!["bread", "eggs"]);
        assert_eq!(recommender.recommend("eggs", 5), vec!["milk"]);
        assert!(recommender.recommend("butter", 5).is_empty());
    }

    #[test]
    fn test_ranked_keeps_scores() {
        let recommender = setup();
        let ranked = recommender.ranked("milk", 5);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item, "bread");
        assert_relative_eq!(ranked[0].score, 2.0 / 3.0);
        assert_relative_eq!(ranked[1].score, 1.0 / 3.0);
    }

    #[test]
    fn test_non_positive_top_n() {
        let recommender = setup();

        assert!(recommender.recommend("milk", 0).is_empty());
        assert!(recommender.recommend("milk", -3).is_empty());
        assert!(recommender.recommend("milk", i64::MIN).is_empty());
    }

    #[test]
    fn test_top_n_bound() {
        let recommender = setup();

        for n in -2..6 {
            let got = recommender.recommend("milk", n);
            assert!(got.len() as i64 <= n.max(0));
        }
        assert_eq!(recommender.recommend("milk", i64::MAX).len(), 2);
    }

    #[test]
    fn test_query_is_case_and_space_sensitive() {
        let recommender = setup();

        assert!(recommender.recommend("Milk", 5).is_empty());
        assert!(recommender.recommend("milk ", 5).is_empty());
    }

    #[test]
    fn test_ties_broken_by_name() {
        // every pair with hub scores 1/4
        let model = ModelBuilder::build(&transactions(vec![
            ("C1", vec!["hub", "zucchini"]),
            ("C2", vec!["hub", "apple"]),
            ("C3", vec!["hub", "mango"]),
            ("C4", vec!["zucchini"]),
            ("C5", vec!["apple"]),
            ("C6", vec!["mango"]),
        ]));

        let got = recommend(&model, "hub", 10);
        assert_eq!(got, vec!["apple", "mango", "zucchini"]);

        let got = recommend(&model, "hub", 2);
        assert_eq!(got, vec!["apple", "mango"]);
    }

    #[test]
    fn test_empty_model() {
        let model = ModelBuilder::build(&TransactionSet::new());
        let recommender = Recommender::new(Arc::new(model));

        assert!(recommender.recommend("milk", 5).is_empty());
        assert!(recommender.recommend("", 5).is_empty());
    }
}
