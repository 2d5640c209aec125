/// Data models for the purchase store
///
/// Map straight onto the `purchases` table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One stored purchase
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: i64,
    pub customer_id: String,
    pub item: String,
    pub purchased_on: Option<String>, // whatever the source file had
    pub imported_at: String,          // ISO 8601 format from SQLite
}

/// Input for recording a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseInput {
    pub customer_id: String,
    pub item: String,
    pub purchased_on: Option<String>,
}

impl PurchaseInput {
    pub fn new(customer_id: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            item: item.into(),
            purchased_on: None,
        }
    }

    /// Blank customer or item rows are never stored
    pub fn is_valid(&self) -> bool {
        !self.customer_id.trim().is_empty() && !self.item.trim().is_empty()
    }
}
