// A loaded model plus everything needed to answer queries against it
//
// Built once at startup. Cheap to clone, clones share the same model.

use crate::model::{AffinityModel, ModelBuilder, Recommendation, Recommender, TransactionSet};
use crate::service::ItemSearcher;
use std::sync::Arc;
use tracing::debug;

// How many "did you mean" hints to offer after a miss
const MAX_HINTS: usize = 3;

/// Answer to one query
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found {
        item: String,
        recommendations: Vec<Recommendation>,
    },
    NotFound {
        item: String,
        suggestions: Vec<String>,
    },
}

impl Lookup {
    pub fn item(&self) -> &str {
        match self {
            Lookup::Found { item, .. } | Lookup::NotFound { item, .. } => item,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found { .. })
    }
}

#[derive(Clone)]
pub struct Session {
    recommender: Recommender,
    searcher: Arc<ItemSearcher>,
}

impl Session {
    pub fn new(model: AffinityModel) -> Self {
        let searcher = ItemSearcher::new(model.items());
        let model = Arc::new(model);

        Self {
            recommender: Recommender::new(model),
            searcher: Arc::new(searcher),
        }
    }

    /// Build the model and wrap it
    pub fn from_transactions(transactions: &TransactionSet) -> Self {
        Self::new(ModelBuilder::build(transactions))
    }

    pub fn model(&self) -> &AffinityModel {
        self.recommender.model()
    }

    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    /// Look up recommendations for whatever the user typed
    ///
    /// Surrounding whitespace is dropped first, the rest must match an item
    /// name exactly. On a miss the closest known names come back as hints.
    pub fn lookup(&self, query: &str, top_n: i64) -> Lookup {
        let item = query.trim().to_string();
        let recommendations = self.recommender.ranked(&item, top_n);

        if !recommendations.is_empty() {
            return Lookup::Found {
                item,
                recommendations,
            };
        }

        let suggestions: Vec<String> = if self.model().contains(&item) {
            // known item, the caller asked for zero results
            Vec::new()
        } else {
            self.searcher
                .search(&item, MAX_HINTS)
                .into_iter()
                .map(|m| m.item)
                .collect()
        };

        debug!(query = %item, hints = suggestions.len(), "no recommendations");

        Lookup::NotFound { item, suggestions }
    }
}
