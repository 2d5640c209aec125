/// Error types for cobuy
///
/// Everything that can go wrong around the affinity model: reading files,
/// talking to the purchase store, configuration. Building and querying the
/// model itself never fails.

use thiserror::Error;

/// Main error type for cobuy operations
#[derive(Error, Debug)]
pub enum CobuyError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O errors (dataset file, config file, stdin)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A date bound or date format that chrono could not parse
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// No transaction source was given and none is configured
    #[error("No dataset configured")]
    MissingDataset,

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for cobuy operations
pub type Result<T> = std::result::Result<T, CobuyError>;

/// Convert CobuyError to a user-friendly error message
impl CobuyError {
    pub fn user_message(&self) -> String {
        match self {
            CobuyError::Database(e) => {
                format!("Purchase store error. Details: {}", e)
            }
            CobuyError::Io(e) => {
                format!("Could not read or write a file. Check the path. Details: {}", e)
            }
            CobuyError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            CobuyError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            CobuyError::InvalidDate(msg) => {
                format!("Could not understand date '{}'", msg)
            }
            CobuyError::MissingDataset => {
                "No dataset given. Pass --data <file>, --db, or set COBUY_DATASET".to_string()
            }
            CobuyError::Generic(msg) => msg.clone(),
        }
    }
}
