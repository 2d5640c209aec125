/// cobuy library
///
/// Item-to-item affinity from purchase history: load transactions, build
/// the model once, answer "people who bought X also bought" queries.

pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod model;
pub mod service;

// Re-exports for convenience
pub use config::Config;
pub use db::Database;
pub use error::{CobuyError, Result};
pub use model::{recommend, AffinityModel, ModelBuilder, Recommender, TransactionSet};
pub use service::{Lookup, Session};
