//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Output starts at bar n-1.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_ema(closes: &[f64], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Ema(period);
    if period == 0 || closes.len() < period {
        return IndicatorSeries::empty(indicator_type);
    }

    let values = ema_values(closes, period)
        .into_iter()
        .map(IndicatorValue::Scalar)
        .collect();

    IndicatorSeries {
        indicator_type,
        offset: period - 1,
        values,
    }
}

/// Raw EMA values starting at index `period - 1`; `values.len() - period + 1` entries.
///
/// Callers guarantee `period > 0` and `values.len() >= period`.
pub(crate) fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(values.len() + 1 - period);
    out.push(ema);
    for &value in &values[period..] {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalars(series: &IndicatorSeries) -> Vec<f64> {
        series
            .values
            .iter()
            .map(|v| v.as_scalar().expect("Expected Scalar value"))
            .collect()
    }

    #[test]
    fn ema_offset_and_length() {
        let series = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_eq!(series.offset, 2);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn ema_period_1() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(series.offset, 0);
        let values = scalars(&series);
        assert!((values[0] - 10.0).abs() < f64::EPSILON);
        assert!((values[1] - 20.0).abs() < f64::EPSILON);
        assert!((values[2] - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_seed_is_sma() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 3);
        let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((scalars(&series)[0] - expected_sma).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        let values = scalars(&series);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((values[0] - sma).abs() < f64::EPSILON);
        assert!((values[1] - ema_3).abs() < f64::EPSILON);
        assert!((values[2] - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let series = calculate_ema(&[100.0; 5], 3);
        for v in scalars(&series) {
            assert!((v - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_indicator_type() {
        let series = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 5);
        assert_eq!(series.indicator_type, IndicatorType::Ema(5));
    }

    #[test]
    fn ema_empty_closes() {
        assert!(calculate_ema(&[], 3).is_empty());
    }

    #[test]
    fn ema_period_0() {
        assert!(calculate_ema(&[10.0, 20.0], 0).is_empty());
    }
}
