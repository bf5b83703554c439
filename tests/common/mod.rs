#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sigtrader::domain::backtest::{BacktestConfig, BacktestResult};
use sigtrader::domain::error::BacktestError;
pub use sigtrader::domain::ohlcv::{PriceBar, PriceSeries};
use sigtrader::domain::strategy::{StrategyConfig, StrategyParams};
use sigtrader::ports::data_port::DataPort;
use sigtrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;

/// Closes from the SMA(3) walkthrough.
pub const SCENARIO_CLOSES: [f64; 7] = [10.0, 11.0, 12.0, 9.0, 8.0, 13.0, 14.0];

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| {
                let d = b.timestamp.date();
                !start_date.is_some_and(|s| d < s) && !end_date.is_some_and(|e| d > e)
            })
            .collect();
        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub struct MockReportPort {
    pub calls: RefCell<Vec<(BacktestResult, String)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), BacktestError> {
        self.calls
            .borrow_mut()
            .push((result.clone(), output_path.to_string()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::days(i as i64)
}

/// Daily bars starting 2024-01-01, one per close.
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::from_close(day(i), c))
        .collect()
}

pub fn make_series(symbol: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, make_bars(closes)).unwrap()
}

pub fn sma_config(period: usize, include_short: bool) -> BacktestConfig {
    BacktestConfig::new(StrategyConfig::new(
        StrategyParams::Sma { period },
        include_short,
    ))
}

/// Sine wave around 100 with a slow upward drift.
pub fn generate_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + 10.0 * (i as f64 / 5.0).sin() + i as f64 * 0.1)
        .collect()
}

/// Render closes as a CSV file body with the standard header.
pub fn csv_content(closes: &[f64]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{},{},1000\n",
            day(i).date().format("%Y-%m-%d"),
            c,
            c + 1.0,
            c - 1.0,
            c
        ));
    }
    out
}
