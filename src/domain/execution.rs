//! Execution parameters and fill arithmetic.
//!
//! Trades fill at the bar's close. A trade deploys `position_size` of the
//! realized equity at entry and pays `commission_rate` on that notional once
//! on entry and once on exit.

use serde::Serialize;

use crate::domain::error::BacktestError;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_TRAILING_STOP_PCT: f64 = 2.0;
/// Worst return a single trade can book on its deployed share.
pub const MAX_TRADE_LOSS: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailingStop {
    pub active: bool,
    /// Distance from the extreme close, in percent.
    pub percent: f64,
}

impl Default for TrailingStop {
    fn default() -> Self {
        TrailingStop {
            active: false,
            percent: DEFAULT_TRAILING_STOP_PCT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionConfig {
    pub initial_capital: f64,
    /// Fraction of equity deployed per trade, in (0, 1].
    pub position_size: f64,
    /// Proportional cost per side, in [0, 1).
    pub commission_rate: f64,
    pub trailing_stop: TrailingStop,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            position_size: 1.0,
            commission_rate: 0.0,
            trailing_stop: TrailingStop::default(),
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktestError::invalid_parameter(
                "initial_capital",
                format!("must be positive, got {}", self.initial_capital),
            ));
        }
        if !(self.position_size > 0.0 && self.position_size <= 1.0) {
            return Err(BacktestError::invalid_parameter(
                "position_size",
                format!("must be in (0, 1], got {}", self.position_size),
            ));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(BacktestError::invalid_parameter(
                "commission",
                format!("must be in [0, 1), got {}", self.commission_rate),
            ));
        }
        let percent = self.trailing_stop.percent;
        if self.trailing_stop.active && !(percent > 0.0 && percent < 100.0) {
            return Err(BacktestError::invalid_parameter(
                "trailing_stop.percent",
                format!("must be in (0, 100), got {}", percent),
            ));
        }
        Ok(())
    }
}

/// Commission for one side of a trade on `capital` of equity.
pub fn calculate_commission(capital: f64, config: &ExecutionConfig) -> f64 {
    capital * config.position_size * config.commission_rate
}

/// Realized profit of a round trip that returned `return_pct` on the
/// deployed share of `capital`, net of entry and exit commission.
///
/// The loss before commission is capped at the deployed share.
pub fn trade_pnl(capital: f64, return_pct: f64, config: &ExecutionConfig) -> f64 {
    capital * config.position_size * return_pct.max(MAX_TRADE_LOSS)
        - 2.0 * calculate_commission(capital, config)
}

/// Equity marked at an unrealized return; realized equity is unaffected.
/// Never negative.
pub fn mark_to_market(equity: f64, unrealized: f64, config: &ExecutionConfig) -> f64 {
    (equity * (1.0 + config.position_size * unrealized.max(MAX_TRADE_LOSS))).max(0.0)
}
