// Reads purchase history out of a CSV file
//
// One purchase per record: Member_number,Date,itemDescription. Quoted fields
// are handled by the csv crate. Records that don't look like a purchase are
// skipped, not fatal.

use crate::config::CsvOptions;
use crate::error::Result;
use crate::model::TransactionSet;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

/// What happened while loading
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Data records seen, header and blank lines excluded
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rows_skipped: usize,
    pub customers: usize,
}

/// Why a row was thrown away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Malformed,
    TooFewFields,
    EmptyField,
    BadDate,
    OutsideWindow,
}

pub struct CsvLoader {
    options: CsvOptions,
}

impl CsvLoader {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    /// Load a whole file
    pub async fn load_file(&self, path: &Path) -> Result<(TransactionSet, LoadReport)> {
        let file = tokio::fs::File::open(path).await?;
        let (transactions, report) = self.load(file).await?;

        info!(
            path = %path.display(),
            rows = report.rows_read,
            skipped = report.rows_skipped,
            customers = report.customers,
            "loaded transactions"
        );

        Ok((transactions, report))
    }

    /// Load from any async byte source
    pub async fn load<R>(&self, mut reader: R) -> Result<(TransactionSet, LoadReport)>
    where
        R: AsyncRead + Unpin,
    {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw).await?;

        Ok(self.parse(&raw))
    }

    fn parse(&self, raw: &[u8]) -> (TransactionSet, LoadReport) {
        // delimiter is checked to be ASCII by Config::validate
        let mut reader = ReaderBuilder::new()
            .has_headers(self.options.has_header)
            .delimiter(self.options.delimiter as u8)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(raw);

        let mut transactions = TransactionSet::new();
        let mut report = LoadReport::default();

        for record in reader.records() {
            report.rows_read += 1;

            let parsed = record
                .map_err(|_| SkipReason::Malformed)
                .and_then(|record| self.parse_record(&record));

            match parsed {
                Ok((customer, item)) => {
                    transactions.entry(customer).or_default().push(item);
                    report.rows_accepted += 1;
                }
                Err(reason) => {
                    debug!(row = report.rows_read, ?reason, "skipping row");
                    report.rows_skipped += 1;
                }
            }
        }

        report.customers = transactions.len();
        (transactions, report)
    }

    fn parse_record(&self, record: &StringRecord) -> std::result::Result<(String, String), SkipReason> {
        if record.len() < self.options.min_fields() {
            return Err(SkipReason::TooFewFields);
        }

        let customer = record.get(self.options.customer_column).unwrap_or("").trim();
        let item = record.get(self.options.item_column).unwrap_or("").trim();

        if customer.is_empty() || item.is_empty() {
            return Err(SkipReason::EmptyField);
        }

        if self.options.has_date_window() {
            let raw = record
                .get(self.options.date_column)
                .ok_or(SkipReason::BadDate)?;
            let date = self
                .options
                .parse_date(raw)
                .map_err(|_| SkipReason::BadDate)?;

            if !self.options.in_window(date) {
                return Err(SkipReason::OutsideWindow);
            }
        }

        Ok((customer.to_string(), item.to_string()))
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new(CsvOptions::default())
    }
}
