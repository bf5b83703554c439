//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Output starts at bar n (n price changes are needed for the first average).

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Rsi(period);
    if period == 0 || closes.len() < period + 1 {
        return IndicatorSeries::empty(indicator_type);
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let n = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / n;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / n;

    let mut values = Vec::with_capacity(closes.len() - period);
    values.push(IndicatorValue::Scalar(rsi_from_averages(avg_gain, avg_loss)));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (n - 1.0) + gains[i]) / n;
        avg_loss = (avg_loss * (n - 1.0) + losses[i]) / n;
        values.push(IndicatorValue::Scalar(rsi_from_averages(avg_gain, avg_loss)));
    }

    IndicatorSeries {
        indicator_type,
        offset: period,
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
