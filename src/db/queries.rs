/// SQL query functions for the purchase store

use crate::db::models::*;
use crate::db::Database;
use crate::error::{CobuyError, Result};
use crate::model::TransactionSet;
use sqlx::Row;
use tracing::{info, warn};

impl Database {
    /// Store one purchase
    ///
    /// # Returns
    /// * `Ok(i64)` - The new row id
    /// * `Err(CobuyError::Generic)` - Blank customer or item
    pub async fn record_purchase(&self, input: PurchaseInput) -> Result<i64> {
        if !input.is_valid() {
            return Err(CobuyError::Generic(format!(
                "refusing blank purchase (customer '{}', item '{}')",
                input.customer_id, input.item
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (customer_id, item, purchased_on)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(input.customer_id.trim())
        .bind(input.item.trim())
        .bind(input.purchased_on)
        .fetch_one(self.pool())
        .await?;

        Ok(result.get(0))
    }

    /// Store many purchases in one SQL transaction
    ///
    /// Blank rows are dropped. Returns how many rows went in.
    pub async fn record_purchases(&self, inputs: &[PurchaseInput]) -> Result<u64> {
        let mut tx = self.pool().begin().await?;
        let mut inserted = 0;

        for input in inputs {
            if !input.is_valid() {
                warn!(customer = %input.customer_id, "dropping blank purchase");
                continue;
            }

            sqlx::query("INSERT INTO purchases (customer_id, item, purchased_on) VALUES (?, ?, ?)")
                .bind(input.customer_id.trim())
                .bind(input.item.trim())
                .bind(input.purchased_on.as_deref())
                .execute(&mut *tx)
                .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Store a loaded transaction set
    ///
    /// Customers go in sorted order so re-imports produce the same row ids.
    /// Per-customer item order is kept.
    pub async fn import_transactions(&self, transactions: &TransactionSet) -> Result<u64> {
        let mut customers: Vec<&String> = transactions.keys().collect();
        customers.sort();

        let inputs: Vec<PurchaseInput> = customers
            .into_iter()
            .flat_map(|customer| {
                transactions[customer]
                    .iter()
                    .map(move |item| PurchaseInput::new(customer.as_str(), item.as_str()))
            })
            .collect();

        let inserted = self.record_purchases(&inputs).await?;
        info!(purchases = inserted, customers = transactions.len(), "imported transactions");

        Ok(inserted)
    }

    /// Rebuild the customer -> items grouping, items in insertion order
    pub async fn load_transactions(&self) -> Result<TransactionSet> {
        let rows = sqlx::query("SELECT customer_id, item FROM purchases ORDER BY id")
            .fetch_all(self.pool())
            .await?;

        let mut transactions = TransactionSet::new();
        for row in rows {
            let customer: String = row.get("customer_id");
            let item: String = row.get("item");
            transactions.entry(customer).or_default().push(item);
        }

        Ok(transactions)
    }

    /// Everything one customer bought, oldest row first
    pub async fn customer_purchases(&self, customer_id: &str) -> Result<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(
            "SELECT * FROM purchases WHERE customer_id = ? ORDER BY id",
        )
        .bind(customer_id)
        .fetch_all(self.pool())
        .await?;

        Ok(purchases)
    }

    /// Wipe the store before a fresh import
    pub async fn clear_purchases(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM purchases")
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
