//! Market data port trait.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` in ascending timestamp order. Either bound may be
    /// omitted; both are inclusive calendar dates.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, BacktestError>;

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError>;
}
