//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv` with a `timestamp,open,high,low,close,volume`
//! header. Timestamps are `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "t")]
    timestamp: String,
    #[serde(alias = "o")]
    open: f64,
    #[serde(alias = "h")]
    high: f64,
    #[serde(alias = "l")]
    low: f64,
    #[serde(alias = "c")]
    close: f64,
    #[serde(default, alias = "v")]
    volume: f64,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Read every bar in a single CSV file, sorted by timestamp.
    pub fn read_file(path: &Path, symbol: &str) -> Result<PriceSeries, BacktestError> {
        read_bars(path, symbol, None, None)
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn read_bars(
    path: &Path,
    symbol: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<PriceSeries, BacktestError> {
    let content = fs::read_to_string(path).map_err(|e| BacktestError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut bars = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(file = %path.display(), row = line + 1, error = %e, "skipping malformed row");
                skipped += 1;
                continue;
            }
        };
        let Some(timestamp) = parse_timestamp(&row.timestamp) else {
            tracing::warn!(
                file = %path.display(),
                row = line + 1,
                timestamp = %row.timestamp,
                "skipping row with unparseable timestamp"
            );
            skipped += 1;
            continue;
        };

        let date = timestamp.date();
        if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
            continue;
        }

        bars.push(PriceBar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    if bars.len() < before {
        tracing::warn!(
            file = %path.display(),
            duplicates = before - bars.len(),
            "dropped bars with duplicate timestamps"
        );
    }

    tracing::debug!(
        symbol,
        file = %path.display(),
        bars = bars.len(),
        skipped,
        "prices loaded"
    );
    PriceSeries::new(symbol, bars)
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, BacktestError> {
        read_bars(&self.csv_path(symbol), symbol, start_date, end_date)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BacktestError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(stem.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
