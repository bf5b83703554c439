//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! The line is defined from bar max(fast, slow) - 1 and the signal needs
//! `signal` line values, so output starts at bar max(fast, slow) + signal - 2.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    let long = fast.max(slow);
    if fast == 0 || slow == 0 || signal_period == 0 || closes.len() + 1 < long + signal_period {
        return IndicatorSeries::empty(indicator_type);
    }

    let macd_line = macd_line(closes, fast, slow);
    let signal_line = ema_values(&macd_line, signal_period);

    // signal_line[j] pairs with macd_line[j + signal_period - 1]
    let values = signal_line
        .iter()
        .zip(&macd_line[signal_period - 1..])
        .map(|(&signal, &line)| IndicatorValue::Macd {
            line,
            signal,
            histogram: line - signal,
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        offset: long + signal_period - 2,
        values,
    }
}

/// EMA(fast) - EMA(slow) from bar max(fast, slow) - 1 onward.
fn macd_line(closes: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let long = fast.max(slow);
    let ema_fast = ema_values(closes, fast);
    let ema_slow = ema_values(closes, slow);

    ((long - 1)..closes.len())
        .map(|i| ema_fast[i + 1 - fast] - ema_slow[i + 1 - slow])
        .collect()
}
