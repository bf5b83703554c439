//! Backtest pipeline: indicator, signals, simulation, metrics.
//!
//! `run_backtest` is a pure function of the price series and configuration;
//! identical inputs produce identical results.

use serde::Serialize;

use crate::domain::error::BacktestError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::indicator::{self, IndicatorSeries};
use crate::domain::metrics::{MetricsReport, TRADING_DAYS_PER_YEAR};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::portfolio;
use crate::domain::position::Trade;
use crate::domain::signal;
use crate::domain::strategy::{StrategyConfig, StrategyKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub strategy: StrategyConfig,
    pub execution: ExecutionConfig,
    /// Periods per year used to annualize Sharpe and Sortino.
    pub annualization_factor: f64,
}

impl BacktestConfig {
    pub fn new(strategy: StrategyConfig) -> Self {
        BacktestConfig {
            strategy,
            execution: ExecutionConfig::default(),
            annualization_factor: TRADING_DAYS_PER_YEAR,
        }
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        self.strategy.validate()?;
        self.execution.validate()?;
        if !self.annualization_factor.is_finite() || self.annualization_factor <= 0.0 {
            return Err(BacktestError::invalid_parameter(
                "annualization_factor",
                format!("must be positive, got {}", self.annualization_factor),
            ));
        }
        Ok(())
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig::new(StrategyConfig::with_defaults(StrategyKind::Sma))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub data_points: usize,
    pub initial_capital: f64,
    pub final_capital: f64,
    /// Percent change of equity over the run.
    pub total_return_pct: f64,
    /// Percent change of the close from first to last bar.
    pub buy_and_hold_return_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: StrategyConfig,
    pub indicator: IndicatorSeries,
    pub equity_curve: Vec<f64>,
    /// Positions held after trailing-stop exits.
    pub positions: Vec<i8>,
    /// Positions as emitted by the signal rule.
    pub raw_positions: Vec<i8>,
    pub trades: Vec<Trade>,
    pub metrics: MetricsReport,
    pub summary: BacktestSummary,
}

pub fn run_backtest(
    series: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    config.validate()?;
    if series.is_empty() {
        return Err(BacktestError::Data {
            reason: format!("no price data for {}", series.symbol),
        });
    }

    let strategy = &config.strategy;
    tracing::info!(
        symbol = %series.symbol,
        strategy = %strategy.kind(),
        bars = series.len(),
        include_short = strategy.include_short,
        "running backtest"
    );

    let closes = series.closes();
    let indicator = indicator::compute(&strategy.indicator_type(), &closes)?;
    let raw_positions = signal::generate(
        &closes,
        &indicator,
        &strategy.signal_rule(),
        strategy.include_short,
    )?;
    let simulation = portfolio::simulate(&closes, &raw_positions, &config.execution)?;

    let timestamps = series.timestamps();
    let metrics = MetricsReport::compute(
        &simulation.equity_curve,
        &simulation.trades,
        &timestamps,
        config.annualization_factor,
    );
    let summary = summarize(&closes, &simulation.equity_curve, &config.execution);

    tracing::info!(
        symbol = %series.symbol,
        trades = simulation.trades.len(),
        final_capital = summary.final_capital,
        total_return_pct = summary.total_return_pct,
        "backtest complete"
    );

    Ok(BacktestResult {
        symbol: series.symbol.clone(),
        strategy: strategy.clone(),
        indicator,
        equity_curve: simulation.equity_curve,
        positions: simulation.positions,
        raw_positions,
        trades: simulation.trades,
        metrics,
        summary,
    })
}

fn summarize(closes: &[f64], equity_curve: &[f64], execution: &ExecutionConfig) -> BacktestSummary {
    let initial_capital = execution.initial_capital;
    let final_capital = equity_curve.last().copied().unwrap_or(initial_capital);

    let buy_and_hold_return_pct = match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => Some((last - first) / first * 100.0),
        _ => None,
    };

    BacktestSummary {
        data_points: closes.len(),
        initial_capital,
        final_capital,
        total_return_pct: (final_capital - initial_capital) / initial_capital * 100.0,
        buy_and_hold_return_pct,
    }
}
