//! Price bar and price series representation.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::error::BacktestError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Bar carrying only a close; open/high/low mirror it and volume is zero.
    pub fn from_close(timestamp: NaiveDateTime, close: f64) -> Self {
        PriceBar {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// Ordered, immutable bar sequence for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Timestamps must be strictly increasing.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, BacktestError> {
        if let Some(w) = bars.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(BacktestError::configuration(format!(
                "timestamps must be strictly increasing ({} follows {})",
                w[1].timestamp, w[0].timestamp
            )));
        }
        Ok(PriceSeries {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }
}
