/// Affinity model
///
/// Builds item-to-item affinity scores from purchase histories and ranks
/// related items for a query. Pure in-memory, no I/O, no errors.

pub mod affinity;
pub mod builder;
pub mod recommender;

use std::collections::HashMap;

pub use affinity::{AffinityModel, ModelStats};
pub use builder::{CooccurrenceCounts, ModelBuilder};
pub use recommender::{recommend, Recommendation, Recommender};

/// A product name exactly as it appears in the purchase records
pub type Item = String;

/// Customer identifier (Member_number in the groceries dataset)
pub type CustomerId = String;

/// Every customer's purchases, in the order they were loaded
pub type TransactionSet = HashMap<CustomerId, Vec<Item>>;
