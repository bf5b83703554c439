//! Single-asset portfolio simulation.
//!
//! Walks a position series bar by bar, filling at the close. At most one
//! trade is open at a time. The equity curve marks open trades to market;
//! realized equity only moves when a trade closes.

use serde::Serialize;

use crate::domain::error::BacktestError;
use crate::domain::execution::{self, ExecutionConfig};
use crate::domain::position::{ExitReason, OpenTrade, Side, Trade};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub equity_curve: Vec<f64>,
    pub trades: Vec<Trade>,
    /// Positions actually held, after trailing-stop exits.
    pub positions: Vec<i8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub realized_equity: f64,
    pub open_trade: Option<OpenTrade>,
    pub closed_trades: Vec<Trade>,
    pub equity_curve: Vec<f64>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            realized_equity: initial_capital,
            open_trade: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Realized equity is exhausted; no further trade can be opened.
    pub fn is_ruined(&self) -> bool {
        self.realized_equity <= 0.0
    }

    pub fn open(&mut self, index: usize, price: f64, side: Side) {
        self.open_trade = Some(OpenTrade::new(index, price, side, self.realized_equity));
    }

    /// Close the open trade, if any, and book its profit. Realized equity
    /// does not go below zero.
    pub fn close(
        &mut self,
        index: usize,
        price: f64,
        reason: ExitReason,
        config: &ExecutionConfig,
    ) -> Option<&Trade> {
        let open = self.open_trade.take()?;
        let mut trade = open.close(index, price, reason, config);
        trade.pnl = trade.pnl.max(-self.realized_equity);
        self.realized_equity += trade.pnl;
        self.closed_trades.push(trade);
        self.closed_trades.last()
    }

    /// Equity at `price`: realized plus the open trade's unrealized return.
    pub fn total_equity(&self, price: f64, config: &ExecutionConfig) -> f64 {
        match self
            .open_trade
            .as_ref()
            .and_then(|t| t.unrealized_return(price))
        {
            Some(unrealized) => execution::mark_to_market(self.realized_equity, unrealized, config),
            None => self.realized_equity,
        }
    }

    pub fn record_equity(&mut self, equity: f64) {
        self.equity_curve.push(equity);
    }
}

/// Simulate a position series over closes.
///
/// A non-zero `positions[0]` opens at the first close. A trailing-stop exit
/// keeps the portfolio flat until the raw position series changes again. A
/// trade still open at the end closes at the final close; one opened on the
/// final bar is discarded. Once realized equity reaches zero the portfolio
/// stays flat.
pub fn simulate(
    closes: &[f64],
    positions: &[i8],
    config: &ExecutionConfig,
) -> Result<SimulationResult, BacktestError> {
    if closes.is_empty() {
        return Err(BacktestError::configuration("cannot simulate an empty series"));
    }
    if positions.len() != closes.len() {
        return Err(BacktestError::configuration(format!(
            "position series has {} entries but there are {} closes",
            positions.len(),
            closes.len()
        )));
    }
    config.validate()?;

    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut held = Vec::with_capacity(closes.len());

    if let Some(side) = Side::from_position(positions[0]) {
        portfolio.open(0, closes[0], side);
    }
    held.push(positions[0]);
    portfolio.record_equity(config.initial_capital);

    let stop = config.trailing_stop;
    let mut stopped_out = false;

    for i in 1..closes.len() {
        let price = closes[i];

        let mut forced = false;
        if stop.active {
            if let Some(trade) = portfolio.open_trade.as_mut() {
                trade.update_extreme(price);
                forced = trade.should_trailing_stop(price, stop.percent);
            }
        }

        if positions[i] != positions[i - 1] {
            stopped_out = false;
        }
        let mut target = if forced || stopped_out { 0 } else { positions[i] };

        if target != held[i - 1] {
            let reason = if forced {
                ExitReason::TrailingStop
            } else {
                ExitReason::Signal
            };
            if let Some(trade) = portfolio.close(i, price, reason, config) {
                tracing::trace!(
                    entry = trade.entry_index,
                    exit = trade.exit_index,
                    pnl = trade.pnl,
                    reason = ?trade.exit_reason,
                    "trade closed"
                );
            }
            if portfolio.is_ruined() {
                target = 0;
            }
            if let Some(side) = Side::from_position(target) {
                portfolio.open(i, price, side);
            }
        }
        if forced {
            stopped_out = true;
        }

        let equity = portfolio.total_equity(price, config);
        portfolio.record_equity(equity);
        held.push(target);
    }

    let last = closes.len() - 1;
    match portfolio.open_trade.as_ref().map(|t| t.entry_index) {
        Some(entry) if entry == last => portfolio.open_trade = None,
        Some(_) => {
            portfolio.close(last, closes[last], ExitReason::EndOfData, config);
            portfolio.equity_curve[last] = portfolio.realized_equity;
        }
        None => {}
    }

    tracing::debug!(
        bars = closes.len(),
        trades = portfolio.closed_trades.len(),
        final_equity = portfolio.realized_equity,
        "simulation complete"
    );

    Ok(SimulationResult {
        equity_curve: portfolio.equity_curve,
        trades: portfolio.closed_trades,
        positions: held,
    })
}

/// Simple returns between consecutive equity values.
///
/// Pairs whose earlier value is zero are skipped.
pub fn daily_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}
