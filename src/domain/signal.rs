//! Signal generation: indicator series to target positions.
//!
//! Every rule reduces one bar to a [`Zone`] relative to its bounds, then a
//! [`Response`] maps the zone to a position in {-1, 0, 1}.
//!
//! - Trend: close vs a scalar (SMA/EMA), momentum.
//! - Threshold: a scalar (RSI) vs fixed bounds, reversion with hysteresis.
//! - Band: close vs the per-bar lower/upper band, reversion with hysteresis.
//! - Crossover: MACD line vs its signal line, momentum.
//!
//! Comparisons are strict, so a tie lands inside the bounds and never opens
//! a long position.

use serde::Serialize;

use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorSeries, IndicatorValue};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SignalRule {
    Trend,
    Threshold { lower: f64, upper: f64 },
    Band,
    Crossover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Below,
    Inside,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Response {
    /// Above is long, below is short, a tie is flat.
    Momentum,
    /// Below is long, above is short, inside keeps the previous position.
    Reversion,
}

impl Response {
    fn position(self, zone: Zone, previous: i8, include_short: bool) -> i8 {
        let short = if include_short { -1 } else { 0 };
        match (self, zone) {
            (Response::Momentum, Zone::Above) => 1,
            (Response::Momentum, Zone::Below) => short,
            (Response::Momentum, Zone::Inside) => 0,
            (Response::Reversion, Zone::Below) => 1,
            (Response::Reversion, Zone::Above) => short,
            (Response::Reversion, Zone::Inside) => previous,
        }
    }
}

impl SignalRule {
    fn response(&self) -> Response {
        match self {
            SignalRule::Trend | SignalRule::Crossover => Response::Momentum,
            SignalRule::Threshold { .. } | SignalRule::Band => Response::Reversion,
        }
    }

    fn zone(&self, close: f64, value: &IndicatorValue) -> Result<Zone, BacktestError> {
        let (subject, lower, upper) = match (self, value) {
            (SignalRule::Trend, IndicatorValue::Scalar(v)) => (close, *v, *v),
            (SignalRule::Threshold { lower, upper }, IndicatorValue::Scalar(v)) => {
                (*v, *lower, *upper)
            }
            (SignalRule::Band, IndicatorValue::Bands { upper, lower, .. }) => {
                (close, *lower, *upper)
            }
            (SignalRule::Crossover, IndicatorValue::Macd { line, signal, .. }) => {
                (*line, *signal, *signal)
            }
            (rule, value) => {
                return Err(BacktestError::configuration(format!(
                    "signal rule {:?} cannot be applied to indicator value {:?}",
                    rule, value
                )));
            }
        };

        Ok(if subject < lower {
            Zone::Below
        } else if subject > upper {
            Zone::Above
        } else {
            Zone::Inside
        })
    }
}

/// Turn an indicator series into one target position per close.
///
/// Bars before the indicator offset are flat. Reversion rules are a left
/// fold over the aligned bars with the previous position as accumulator.
pub fn generate(
    closes: &[f64],
    indicator: &IndicatorSeries,
    rule: &SignalRule,
    include_short: bool,
) -> Result<Vec<i8>, BacktestError> {
    let offset = indicator.offset;
    if offset + indicator.len() != closes.len() {
        return Err(BacktestError::configuration(format!(
            "indicator {} covers {} bars from offset {} but the series has {} closes",
            indicator.indicator_type,
            indicator.len(),
            offset,
            closes.len()
        )));
    }

    let response = rule.response();
    let mut positions = vec![0i8; closes.len()];
    closes[offset..]
        .iter()
        .zip(&indicator.values)
        .enumerate()
        .try_fold(0i8, |previous, (j, (&close, value))| {
            let position = response.position(rule.zone(close, value)?, previous, include_short);
            positions[offset + j] = position;
            Ok::<i8, BacktestError>(position)
        })?;

    tracing::debug!(
        indicator = %indicator.indicator_type,
        bars = closes.len(),
        long = positions.iter().filter(|&&p| p > 0).count(),
        short = positions.iter().filter(|&&p| p < 0).count(),
        "signals generated"
    );
    Ok(positions)
}
