/// Database connection management with connection pooling
///
/// Provides a thread-safe connection pool to the SQLite purchase store.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of database connections in the pool
const MAX_CONNECTIONS: u32 = 5;

const SCHEMA: &str = include_str!("schema.sql");

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl Database {
    /// Open (or create) the purchase store
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    ///
    /// # Returns
    /// * `Ok(Database)` - Ready to use, schema in place
    /// * `Err(CobuyError)` - If the directory or connection can't be created
    ///
    /// # Examples
    /// ```no_run
    /// use cobuy_lib::db::Database;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::new("/tmp/cobuy/purchases.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
            db_path,
        };

        db.initialize_schema().await?;
        debug!(path = %db.db_path.display(), "purchase store opened");

        Ok(db)
    }

    /// Fresh in-memory store
    ///
    /// One connection only, every new sqlite::memory: connection is its own
    /// empty database.
    #[cfg(test)]
    pub async fn new_test() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
            db_path: PathBuf::from(":memory:"),
        };

        db.initialize_schema().await?;

        Ok(db)
    }

    /// Creates tables and indexes if they don't exist
    async fn initialize_schema(&self) -> Result<()> {
        // sqlx runs one statement per execute
        for statement in SCHEMA.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(self.pool.as_ref()).await?;
            }
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Close all connections in the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Row counts for `cobuy stats`
    pub async fn stats(&self) -> Result<StoreStats> {
        let purchases: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM purchases")
            .fetch_one(self.pool.as_ref())
            .await?;

        let customers: (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT customer_id) FROM purchases")
                .fetch_one(self.pool.as_ref())
                .await?;

        let items: (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT item) FROM purchases")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(StoreStats {
            total_purchases: purchases.0,
            total_customers: customers.0,
            distinct_items: items.0,
        })
    }
}

/// Purchase store statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub total_purchases: i64,
    pub total_customers: i64,
    pub distinct_items: i64,
}
