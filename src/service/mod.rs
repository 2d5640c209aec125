/// Query side of the application
///
/// Wraps a built model for repeated lookups and offers fuzzy hints when a
/// query names no known item.

pub mod searcher;
pub mod session;

pub use searcher::{ItemMatch, ItemSearcher};
pub use session::{Lookup, Session};
