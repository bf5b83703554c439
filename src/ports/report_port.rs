//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;

/// Port for writing backtest results.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), BacktestError>;
}
