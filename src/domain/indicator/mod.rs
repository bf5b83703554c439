//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: Indicator values right-aligned to a close series
//!
//! [`compute`] is the single entry point: it validates parameters and series
//! length before dispatching to the per-indicator calculation.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use serde::{Serialize, Serializer};
use std::fmt;

use crate::domain::error::BacktestError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Scalar(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bands {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

impl IndicatorValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            IndicatorValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        multiplier: f64,
    },
}

impl IndicatorType {
    /// Minimum number of closes needed before the indicator can be computed.
    pub fn required_bars(&self) -> usize {
        match *self {
            IndicatorType::Sma(p) | IndicatorType::Ema(p) => p,
            IndicatorType::Rsi(p) => p + 1,
            IndicatorType::Macd { fast, slow, signal } => fast.max(slow) + signal,
            IndicatorType::Bollinger { period, .. } => period,
        }
    }

    /// Number of leading bars without an indicator value.
    pub fn offset(&self) -> usize {
        match *self {
            IndicatorType::Sma(p) | IndicatorType::Ema(p) => p.saturating_sub(1),
            IndicatorType::Rsi(p) => p,
            IndicatorType::Macd { fast, slow, signal } => {
                (fast.max(slow) + signal).saturating_sub(2)
            }
            IndicatorType::Bollinger { period, .. } => period.saturating_sub(1),
        }
    }

    fn validate_params(&self) -> Result<(), BacktestError> {
        let periods: Vec<(&str, usize)> = match *self {
            IndicatorType::Sma(p) | IndicatorType::Ema(p) | IndicatorType::Rsi(p) => {
                vec![("period", p)]
            }
            IndicatorType::Macd { fast, slow, signal } => vec![
                ("fast_period", fast),
                ("slow_period", slow),
                ("signal_period", signal),
            ],
            IndicatorType::Bollinger { period, multiplier } => {
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    return Err(BacktestError::invalid_parameter(
                        "std_dev",
                        format!("band multiplier must be positive, got {}", multiplier),
                    ));
                }
                vec![("period", period)]
            }
        };

        for (name, value) in periods {
            if value == 0 {
                return Err(BacktestError::invalid_parameter(name, "must be positive"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger { period, multiplier } => {
                write!(f, "BBANDS({},{})", period, multiplier)
            }
        }
    }
}

impl Serialize for IndicatorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Indicator output right-aligned to the close series it was computed from:
/// `values[j]` belongs to bar `j + offset`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub offset: usize,
    pub values: Vec<IndicatorValue>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        IndicatorSeries {
            indicator_type,
            offset: 0,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for the bar at `index` of the original series, if defined.
    pub fn value_at(&self, index: usize) -> Option<&IndicatorValue> {
        index
            .checked_sub(self.offset)
            .and_then(|j| self.values.get(j))
    }
}

/// Compute an indicator over a close series.
///
/// Fails with `InvalidParameter` before looking at the data, then with
/// `InsufficientData` when the series is shorter than the lookback.
pub fn compute(
    indicator_type: &IndicatorType,
    closes: &[f64],
) -> Result<IndicatorSeries, BacktestError> {
    indicator_type.validate_params()?;

    let minimum = indicator_type.required_bars();
    if closes.len() < minimum {
        return Err(BacktestError::InsufficientData {
            indicator: indicator_type.to_string(),
            bars: closes.len(),
            minimum,
        });
    }

    let series = match *indicator_type {
        IndicatorType::Sma(period) => calculate_sma(closes, period),
        IndicatorType::Ema(period) => calculate_ema(closes, period),
        IndicatorType::Rsi(period) => calculate_rsi(closes, period),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(closes, fast, slow, signal),
        IndicatorType::Bollinger { period, multiplier } => {
            calculate_bollinger(closes, period, multiplier)
        }
    };

    tracing::debug!(
        indicator = %indicator_type,
        bars = closes.len(),
        offset = series.offset,
        values = series.len(),
        "indicator computed"
    );
    Ok(series)
}
