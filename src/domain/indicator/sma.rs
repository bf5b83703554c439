//! Simple Moving Average indicator.
//!
//! SMA[i] = mean(C[i-n+1..=i]), maintained as a running window sum.
//! Output starts at bar n-1.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_sma(closes: &[f64], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Sma(period);
    if period == 0 || closes.len() < period {
        return IndicatorSeries::empty(indicator_type);
    }

    let values = sma_values(closes, period)
        .into_iter()
        .map(IndicatorValue::Scalar)
        .collect();

    IndicatorSeries {
        indicator_type,
        offset: period - 1,
        values,
    }
}

/// Raw rolling means; `closes.len() - period + 1` values.
pub(crate) fn sma_values(closes: &[f64], period: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(closes.len() + 1 - period);
    let mut sum: f64 = closes[..period].iter().sum();
    values.push(sum / period as f64);

    for i in period..closes.len() {
        sum += closes[i] - closes[i - period];
        values.push(sum / period as f64);
    }
    values
}
