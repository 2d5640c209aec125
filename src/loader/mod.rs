/// Transaction loading
///
/// Reads raw purchase records and groups them into one item list per
/// customer, ready for the model builder.

pub mod csv_loader;

pub use csv_loader::{CsvLoader, LoadReport};
