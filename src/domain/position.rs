//! Open and closed trade bookkeeping.

use serde::Serialize;

use crate::domain::execution::{self, ExecutionConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Side held for a target position; flat has no side.
    pub fn from_position(position: i8) -> Option<Side> {
        match position {
            p if p > 0 => Some(Side::Long),
            p if p < 0 => Some(Side::Short),
            _ => None,
        }
    }

    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    TrailingStop,
    EndOfData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeFlag {
    /// Entered at a price of zero; no return can be computed.
    ZeroEntryPrice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub entry_index: usize,
    pub entry_price: f64,
    pub side: Side,
    /// Realized equity when the trade was opened.
    pub entry_equity: f64,
    /// Highest close since entry for a long, lowest for a short.
    pub extreme: f64,
}

impl OpenTrade {
    pub fn new(entry_index: usize, entry_price: f64, side: Side, entry_equity: f64) -> Self {
        OpenTrade {
            entry_index,
            entry_price,
            side,
            entry_equity,
            extreme: entry_price,
        }
    }

    /// Signed return at `price`, `None` when the entry price is zero.
    pub fn unrealized_return(&self, price: f64) -> Option<f64> {
        if self.entry_price == 0.0 {
            return None;
        }
        Some(self.side.sign() * (price - self.entry_price) / self.entry_price)
    }

    pub fn update_extreme(&mut self, price: f64) {
        self.extreme = match self.side {
            Side::Long => self.extreme.max(price),
            Side::Short => self.extreme.min(price),
        };
    }

    pub fn should_trailing_stop(&self, price: f64, percent: f64) -> bool {
        let distance = percent / 100.0;
        match self.side {
            Side::Long => price <= self.extreme * (1.0 - distance),
            Side::Short => price >= self.extreme * (1.0 + distance),
        }
    }

    pub fn close(
        self,
        exit_index: usize,
        exit_price: f64,
        exit_reason: ExitReason,
        config: &ExecutionConfig,
    ) -> Trade {
        let return_pct = self.unrealized_return(exit_price);
        let (pnl, flag) = match return_pct {
            Some(r) => (execution::trade_pnl(self.entry_equity, r, config), None),
            None => (0.0, Some(TradeFlag::ZeroEntryPrice)),
        };

        Trade {
            entry_index: self.entry_index,
            exit_index,
            entry_price: self.entry_price,
            exit_price,
            side: self.side,
            return_pct,
            pnl,
            duration: exit_index - self.entry_index,
            exit_reason,
            flag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub side: Side,
    pub return_pct: Option<f64>,
    pub pnl: f64,
    /// Holding period in bars.
    pub duration: usize,
    pub exit_reason: ExitReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<TradeFlag>,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.return_pct.is_some_and(|r| r > 0.0)
    }

    pub fn is_loser(&self) -> bool {
        self.return_pct.is_some_and(|r| r < 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_long(entry_price: f64) -> OpenTrade {
        OpenTrade::new(2, entry_price, Side::Long, 10000.0)
    }

    fn make_short(entry_price: f64) -> OpenTrade {
        OpenTrade::new(2, entry_price, Side::Short, 10000.0)
    }

    #[test]
    fn side_from_position() {
        assert_eq!(Side::from_position(1), Some(Side::Long));
        assert_eq!(Side::from_position(-1), Some(Side::Short));
        assert_eq!(Side::from_position(0), None);
    }

    #[test]
    fn unrealized_return_long() {
        let r = make_long(100.0).unrealized_return(110.0).unwrap();
        assert!((r - 0.1).abs() < 1e-12);
    }

    #[test]
    fn unrealized_return_short_profit() {
        let r = make_short(100.0).unrealized_return(90.0).unwrap();
        assert!((r - 0.1).abs() < 1e-12);
    }

    #[test]
    fn unrealized_return_zero_entry() {
        assert!(make_long(0.0).unrealized_return(5.0).is_none());
    }

    #[test]
    fn extreme_starts_at_entry_and_ratchets() {
        let mut long = make_long(100.0);
        assert!((long.extreme - 100.0).abs() < f64::EPSILON);
        long.update_extreme(120.0);
        long.update_extreme(110.0);
        assert!((long.extreme - 120.0).abs() < f64::EPSILON);

        let mut short = make_short(100.0);
        short.update_extreme(80.0);
        short.update_extreme(90.0);
        assert!((short.extreme - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trailing_stop_long() {
        let mut long = make_long(100.0);
        long.update_extreme(120.0);
        // stop level 120 * 0.95 = 114
        assert!(!long.should_trailing_stop(115.0, 5.0));
        assert!(long.should_trailing_stop(113.5, 5.0));
        assert!(long.should_trailing_stop(100.0, 5.0));
    }

    #[test]
    fn trailing_stop_short() {
        let mut short = make_short(100.0);
        short.update_extreme(80.0);
        // stop level 80 * 1.05 = 84
        assert!(!short.should_trailing_stop(83.0, 5.0));
        assert!(short.should_trailing_stop(84.5, 5.0));
    }

    #[test]
    fn close_long_computes_pnl() {
        let config = ExecutionConfig::default();
        let trade = make_long(100.0).close(5, 110.0, ExitReason::Signal, &config);

        assert_eq!(trade.duration, 3);
        assert_eq!(trade.side, Side::Long);
        assert!((trade.return_pct.unwrap() - 0.1).abs() < 1e-12);
        assert!((trade.pnl - 1000.0).abs() < 1e-9);
        assert!(trade.flag.is_none());
        assert!(trade.is_winner());
    }

    #[test]
    fn close_short_loss() {
        let config = ExecutionConfig::default();
        let trade = make_short(100.0).close(4, 105.0, ExitReason::EndOfData, &config);
        assert!((trade.return_pct.unwrap() - (-0.05)).abs() < 1e-12);
        assert!((trade.pnl - (-500.0)).abs() < 1e-9);
        assert!(trade.is_loser());
        assert_eq!(trade.exit_reason, ExitReason::EndOfData);
    }

    #[test]
    fn close_zero_entry_is_flagged() {
        let config = ExecutionConfig::default();
        let trade = make_long(0.0).close(3, 10.0, ExitReason::Signal, &config);
        assert!(trade.return_pct.is_none());
        assert!(trade.pnl.abs() < f64::EPSILON);
        assert_eq!(trade.flag, Some(TradeFlag::ZeroEntryPrice));
        assert!(!trade.is_winner());
        assert!(!trade.is_loser());
    }
}
