/// Purchase store
///
/// Keeps raw purchases in SQLite so a big CSV only has to be parsed once.
/// The affinity model itself is never stored, it is rebuilt from here.

pub mod connection;
pub mod models;
pub mod queries;

pub use connection::Database;
pub use models::*;
