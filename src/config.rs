// Settings for where purchases come from and how many results to show
//
// Layered: built-in defaults, then ~/.cobuy/config.json, then COBUY_* env
// vars. The CLI applies its own flags on top of whatever this returns.

use crate::error::{CobuyError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Same as the old REPL
pub const DEFAULT_TOP_N: i64 = 5;

// Groceries_dataset.csv writes dates like 21-07-2015
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";

const CONFIG_DIR: &str = ".cobuy";
const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "purchases.db";

/// How to read a purchases CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub has_header: bool,
    pub delimiter: char,
    pub customer_column: usize,
    pub date_column: usize,
    pub item_column: usize,
    pub date_format: String,
    /// Inclusive lower bound on the purchase date
    pub since: Option<NaiveDate>,
    /// Inclusive upper bound on the purchase date
    pub until: Option<NaiveDate>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: ',',
            customer_column: 0,
            date_column: 1,
            item_column: 2,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            since: None,
            until: None,
        }
    }
}

impl CsvOptions {
    /// Rows shorter than this get skipped
    pub fn min_fields(&self) -> usize {
        self.customer_column.max(self.item_column) + 1
    }

    pub fn has_date_window(&self) -> bool {
        self.since.is_some() || self.until.is_some()
    }

    /// Parse a date written in `date_format`
    pub fn parse_date(&self, raw: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(raw.trim(), &self.date_format)
            .map_err(|_| CobuyError::InvalidDate(raw.trim().to_string()))
    }

    pub fn in_window(&self, date: NaiveDate) -> bool {
        self.since.map_or(true, |since| date >= since)
            && self.until.map_or(true, |until| date <= until)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset_path: Option<PathBuf>,
    pub database_path: PathBuf,
    pub top_n: i64,
    pub csv: CsvOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: None,
            database_path: default_dir().join(DATABASE_FILE),
            top_n: DEFAULT_TOP_N,
            csv: CsvOptions::default(),
        }
    }
}

impl Config {
    /// Defaults + ~/.cobuy/config.json + environment
    pub fn load() -> Result<Self> {
        let path = default_dir().join(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            CobuyError::Config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply COBUY_DATASET, COBUY_DB and COBUY_TOP_N
    ///
    /// Takes a lookup function so tests don't have to touch the real env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dataset) = lookup("COBUY_DATASET").filter(|v| !v.trim().is_empty()) {
            self.dataset_path = Some(PathBuf::from(dataset.trim()));
        }

        if let Some(db) = lookup("COBUY_DB").filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(db.trim());
        }

        if let Some(top_n) = lookup("COBUY_TOP_N") {
            self.top_n = parse_top_n(&top_n)?;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.csv.delimiter.is_ascii() {
            return Err(CobuyError::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.csv.delimiter
            )));
        }

        if self.csv.customer_column == self.csv.item_column {
            return Err(CobuyError::Config(
                "customer_column and item_column must differ".to_string(),
            ));
        }

        if let (Some(since), Some(until)) = (self.csv.since, self.csv.until) {
            if since > until {
                return Err(CobuyError::Config(format!(
                    "since ({}) is after until ({})",
                    since, until
                )));
            }
        }

        Ok(())
    }
}

impl Config {
    /// The purchase store keeps no dates, so a date window can't apply to it
    pub fn check_store_source(&self) -> Result<()> {
        if self.csv.has_date_window() {
            return Err(CobuyError::Config(
                "--since/--until only work with a CSV source, not --db".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a result count. Zero and negatives are allowed and mean "show nothing".
pub fn parse_top_n(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CobuyError::Config(format!("top_n must be a whole number, got '{}'", raw)))
}

fn default_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.top_n, 5);
        assert!(config.dataset_path.is_none());
        assert!(config.database_path.ends_with(".cobuy/purchases.db"));
        assert_eq!(config.csv.min_fields(), 3);
        assert!(config.csv.has_header);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("COBUY_DATASET", "/data/groceries.csv"),
                ("COBUY_TOP_N", " 10 "),
            ]))
            .unwrap();

        assert_eq!(config.dataset_path, Some(PathBuf::from("/data/groceries.csv")));
        assert_eq!(config.top_n, 10);
    }

    #[test]
    fn test_bad_top_n() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("COBUY_TOP_N", "lots")])).unwrap_err();
        assert!(matches!(err, CobuyError::Config(_)));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"top_n": 3, "csv": {{"delimiter": ";", "since": "2015-01-01"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.top_n, 3);
        assert_eq!(config.csv.delimiter, ';');
        assert_eq!(config.csv.item_column, 2);
        assert_eq!(config.csv.since, NaiveDate::from_ymd_opt(2015, 1, 1));
    }

    #[test]
    fn test_from_file_rejects_same_columns() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"csv": {{"customer_column": 2}}}}"#).unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let mut config = Config::default();
        config.csv.delimiter = '§';

        assert!(matches!(config.validate(), Err(CobuyError::Config(_))));
    }

    #[test]
    fn test_store_source_rejects_date_window() {
        let mut config = Config::default();
        assert!(config.check_store_source().is_ok());

        config.csv.until = NaiveDate::from_ymd_opt(2015, 6, 30);
        let err = config.check_store_source().unwrap_err();
        assert!(err.to_string().contains("--db"));
    }

    #[test]
    fn test_date_window() {
        let mut csv = CsvOptions::default();
        assert!(!csv.has_date_window());

        csv.since = NaiveDate::from_ymd_opt(2015, 1, 1);
        csv.until = NaiveDate::from_ymd_opt(2015, 12, 31);

        let inside = csv.parse_date("21-07-2015").unwrap();
        let outside = csv.parse_date("01-01-2014").unwrap();
        assert!(csv.in_window(inside));
        assert!(!csv.in_window(outside));
        assert!(csv.parse_date("2015/07/21").is_err());
    }
}
