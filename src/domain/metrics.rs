//! Performance metrics over a simulated run.
//!
//! Degenerate inputs (empty series, zero variance, no losing periods) yield a
//! `None` value together with a [`Degeneracy`] cause instead of a silent zero.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::portfolio::daily_returns;
use crate::domain::position::Trade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DAYS_PER_MONTH: f64 = 30.44;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degeneracy {
    EmptySeries,
    ZeroVariance,
    NoNegativeReturns,
    ZeroDownsideDeviation,
}

/// A risk-adjusted ratio with the inputs it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioMetric {
    pub value: Option<f64>,
    pub mean_return: Option<f64>,
    /// Standard deviation for Sharpe, downside deviation for Sortino.
    pub deviation: Option<f64>,
    pub data_points: usize,
    pub negative_returns: usize,
    pub annualization_factor: f64,
    pub degeneracy: Option<Degeneracy>,
}

impl RatioMetric {
    fn degenerate(
        cause: Degeneracy,
        returns: &[f64],
        mean_return: Option<f64>,
        deviation: Option<f64>,
        annualization_factor: f64,
    ) -> Self {
        RatioMetric {
            value: None,
            mean_return,
            deviation,
            data_points: returns.len(),
            negative_returns: count_negative(returns),
            annualization_factor,
            degeneracy: Some(cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawdown {
    /// Fraction of the peak lost at the trough, in [0, 1] for positive equity.
    pub value: f64,
    pub peak_index: usize,
    pub trough_index: usize,
    /// Bars from peak to trough.
    pub duration: usize,
    pub peak_value: f64,
    pub trough_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSummary {
    pub return_pct: f64,
    pub duration: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeStats {
    pub trade_count: usize,
    pub avg_duration: Option<f64>,
    pub avg_return: Option<f64>,
    pub trades_per_month: Option<f64>,
    pub days_in_market: usize,
    pub total_trading_days: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: Option<f64>,
    /// Sum of per-trade returns.
    pub total_return: f64,
    pub best_trade: Option<TradeSummary>,
    pub worst_trade: Option<TradeSummary>,
    pub avg_win_return: Option<f64>,
    pub avg_loss_return: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub sharpe_ratio: RatioMetric,
    pub sortino_ratio: RatioMetric,
    pub max_drawdown: Option<Drawdown>,
    pub trade_stats: TradeStats,
}

impl MetricsReport {
    pub fn compute(
        equity_curve: &[f64],
        trades: &[Trade],
        timestamps: &[NaiveDateTime],
        annualization_factor: f64,
    ) -> Self {
        let returns = daily_returns(equity_curve);
        let report = MetricsReport {
            sharpe_ratio: sharpe_ratio(&returns, annualization_factor),
            sortino_ratio: sortino_ratio(&returns, annualization_factor),
            max_drawdown: max_drawdown(equity_curve),
            trade_stats: trade_stats(trades, timestamps),
        };

        for (name, metric) in [
            ("sharpe_ratio", &report.sharpe_ratio),
            ("sortino_ratio", &report.sortino_ratio),
        ] {
            if let Some(cause) = metric.degeneracy {
                tracing::warn!(metric = name, ?cause, "metric undefined");
            }
        }
        report
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn count_negative(returns: &[f64]) -> usize {
    returns.iter().filter(|&&r| r < 0.0).count()
}

/// Annualized Sharpe ratio: mean / population std dev × √annualization.
pub fn sharpe_ratio(returns: &[f64], annualization_factor: f64) -> RatioMetric {
    if returns.is_empty() {
        return RatioMetric::degenerate(
            Degeneracy::EmptySeries,
            returns,
            None,
            None,
            annualization_factor,
        );
    }

    let mean_return = mean(returns);
    let variance = returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let std_dev = variance.sqrt();

    // Identical returns can leave rounding residue in the variance.
    if std_dev == 0.0 || returns.windows(2).all(|w| w[0] == w[1]) {
        return RatioMetric::degenerate(
            Degeneracy::ZeroVariance,
            returns,
            Some(mean_return),
            Some(std_dev),
            annualization_factor,
        );
    }

    RatioMetric {
        value: Some(mean_return / std_dev * annualization_factor.sqrt()),
        mean_return: Some(mean_return),
        deviation: Some(std_dev),
        data_points: returns.len(),
        negative_returns: count_negative(returns),
        annualization_factor,
        degeneracy: None,
    }
}

/// Annualized Sortino ratio.
///
/// Downside deviation sums squared deviations from the mean over negative
/// returns only but divides by the full number of returns.
pub fn sortino_ratio(returns: &[f64], annualization_factor: f64) -> RatioMetric {
    if returns.is_empty() {
        return RatioMetric::degenerate(
            Degeneracy::EmptySeries,
            returns,
            None,
            None,
            annualization_factor,
        );
    }

    let mean_return = mean(returns);
    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    if downside.is_empty() {
        return RatioMetric::degenerate(
            Degeneracy::NoNegativeReturns,
            returns,
            Some(mean_return),
            None,
            annualization_factor,
        );
    }

    let downside_deviation = (downside
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / returns.len() as f64)
        .sqrt();

    if downside_deviation == 0.0 {
        return RatioMetric::degenerate(
            Degeneracy::ZeroDownsideDeviation,
            returns,
            Some(mean_return),
            Some(downside_deviation),
            annualization_factor,
        );
    }

    RatioMetric {
        value: Some(mean_return / downside_deviation * annualization_factor.sqrt()),
        mean_return: Some(mean_return),
        deviation: Some(downside_deviation),
        data_points: returns.len(),
        negative_returns: downside.len(),
        annualization_factor,
        degeneracy: None,
    }
}

/// Largest peak-to-trough decline over the curve.
///
/// Ties keep the first interval found. Drawdowns from a non-positive peak
/// are not measured.
pub fn max_drawdown(equity_curve: &[f64]) -> Option<Drawdown> {
    let first = *equity_curve.first()?;

    let mut peak = (0usize, first);
    let mut worst = Drawdown {
        value: 0.0,
        peak_index: 0,
        trough_index: 0,
        duration: 0,
        peak_value: first,
        trough_value: first,
    };

    for (i, &value) in equity_curve.iter().enumerate().skip(1) {
        if value > peak.1 {
            peak = (i, value);
        } else if peak.1 > 0.0 {
            let drawdown = (peak.1 - value) / peak.1;
            if drawdown > worst.value {
                worst = Drawdown {
                    value: drawdown,
                    peak_index: peak.0,
                    trough_index: i,
                    duration: i - peak.0,
                    peak_value: peak.1,
                    trough_value: value,
                };
            }
        }
    }

    Some(worst)
}

/// Per-trade statistics.
///
/// Trades without a return (zero entry price) count toward the trade count
/// and time in market but not toward any return statistic.
pub fn trade_stats(trades: &[Trade], timestamps: &[NaiveDateTime]) -> TradeStats {
    let trade_count = trades.len();
    let days_in_market: usize = trades.iter().map(|t| t.duration).sum();

    let returns: Vec<(f64, usize)> = trades
        .iter()
        .filter_map(|t| t.return_pct.map(|r| (r, t.duration)))
        .collect();
    let wins: Vec<f64> = returns.iter().map(|r| r.0).filter(|&r| r > 0.0).collect();
    let losses: Vec<f64> = returns.iter().map(|r| r.0).filter(|&r| r < 0.0).collect();
    let total_return: f64 = returns.iter().map(|r| r.0).sum();

    let average = |values: &[f64]| {
        if values.is_empty() {
            None
        } else {
            Some(mean(values))
        }
    };

    let best_trade = returns
        .iter()
        .copied()
        .reduce(|best, r| if r.0 > best.0 { r } else { best })
        .map(|(return_pct, duration)| TradeSummary {
            return_pct,
            duration,
        });
    let worst_trade = returns
        .iter()
        .copied()
        .reduce(|worst, r| if r.0 < worst.0 { r } else { worst })
        .map(|(return_pct, duration)| TradeSummary {
            return_pct,
            duration,
        });

    let months = match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) => {
            (*last - *first).num_seconds() as f64 / (86_400.0 * DAYS_PER_MONTH)
        }
        _ => 0.0,
    };
    let trades_per_month = if trade_count > 0 && months > 0.0 {
        Some(trade_count as f64 / months)
    } else {
        None
    };

    TradeStats {
        trade_count,
        avg_duration: if trade_count > 0 {
            Some(days_in_market as f64 / trade_count as f64)
        } else {
            None
        },
        avg_return: if returns.is_empty() {
            None
        } else {
            Some(total_return / returns.len() as f64)
        },
        trades_per_month,
        days_in_market,
        total_trading_days: timestamps.len(),
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        win_rate: if returns.is_empty() {
            None
        } else {
            Some(wins.len() as f64 / returns.len() as f64)
        },
        total_return,
        best_trade,
        worst_trade,
        avg_win_return: average(&wins),
        avg_loss_return: average(&losses),
    }
}
