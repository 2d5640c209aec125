/// Item searcher with fuzzy matching
///
/// Only used to hint at what the user probably meant after a query came back
/// empty. Recommendations themselves always use the exact item name.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// A known item and how well it matched
#[derive(Debug, Clone, PartialEq)]
pub struct ItemMatch {
    pub item: String,
    pub score: i64,
}

pub struct ItemSearcher {
    items: Vec<String>,
    matcher: SkimMatcherV2,
}

impl ItemSearcher {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }

    /// Best fuzzy matches for `query`, highest score first
    ///
    /// # Arguments
    /// * `query` - What the user typed
    /// * `limit` - Maximum matches to return
    pub fn search(&self, query: &str, limit: usize) -> Vec<ItemMatch> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut results: Vec<ItemMatch> = self
            .items
            .iter()
            .filter_map(|item| {
                self.matcher
                    .fuzzy_match(item, query)
                    .map(|score| ItemMatch {
                        item: item.clone(),
                        score,
                    })
            })
            .collect();

        // Highest score first, then alphabetical so output is stable
        results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.item.cmp(&b.item)));
        results.truncate(limit);

        results
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
