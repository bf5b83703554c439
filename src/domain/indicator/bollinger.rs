//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Output starts at bar period-1.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

pub fn calculate_bollinger(closes: &[f64], period: usize, multiplier: f64) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger { period, multiplier };
    if period == 0 || closes.len() < period {
        return IndicatorSeries::empty(indicator_type);
    }

    let values = closes
        .windows(period)
        .map(|window| {
            let middle: f64 = window.iter().sum::<f64>() / period as f64;
            let variance: f64 = window
                .iter()
                .map(|c| {
                    let diff = c - middle;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            let stddev = variance.sqrt();

            IndicatorValue::Bands {
                upper: middle + multiplier * stddev,
                middle,
                lower: middle - multiplier * stddev,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        offset: period - 1,
        values,
    }
}
