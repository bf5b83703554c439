//! Strategy selection and parameters.
//!
//! A strategy is one indicator plus the rule that turns it into positions.
//! [`StrategyConfig::indicator_type`] and [`StrategyConfig::signal_rule`] are
//! the two hand-offs into the indicator engine and the signal generator.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::BacktestError;
use crate::domain::indicator::{bollinger, macd, IndicatorType};
use crate::domain::signal::SignalRule;

pub const DEFAULT_MA_PERIOD: usize = 20;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrategyKind {
    Sma,
    Ema,
    Rsi,
    Macd,
    Bbands,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Sma,
        StrategyKind::Ema,
        StrategyKind::Rsi,
        StrategyKind::Macd,
        StrategyKind::Bbands,
    ];

    /// Tunable parameters with their defaults and accepted ranges.
    pub fn parameters(&self) -> Vec<ParameterSpec> {
        match self {
            StrategyKind::Sma | StrategyKind::Ema => vec![ParameterSpec::new(
                "period",
                DEFAULT_MA_PERIOD as f64,
                1.0,
                200.0,
            )],
            StrategyKind::Rsi => vec![
                ParameterSpec::new("period", DEFAULT_RSI_PERIOD as f64, 2.0, 100.0),
                ParameterSpec::new("oversold", DEFAULT_OVERSOLD, 0.0, 100.0),
                ParameterSpec::new("overbought", DEFAULT_OVERBOUGHT, 0.0, 100.0),
            ],
            StrategyKind::Macd => vec![
                ParameterSpec::new("fast_period", macd::DEFAULT_FAST as f64, 1.0, 50.0),
                ParameterSpec::new("slow_period", macd::DEFAULT_SLOW as f64, 1.0, 100.0),
                ParameterSpec::new("signal_period", macd::DEFAULT_SIGNAL as f64, 1.0, 50.0),
            ],
            StrategyKind::Bbands => vec![
                ParameterSpec::new("period", bollinger::DEFAULT_PERIOD as f64, 1.0, 200.0),
                ParameterSpec::new("std_dev", bollinger::DEFAULT_MULTIPLIER, 0.1, 5.0),
            ],
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Sma => "SMA",
            StrategyKind::Ema => "EMA",
            StrategyKind::Rsi => "RSI",
            StrategyKind::Macd => "MACD",
            StrategyKind::Bbands => "BBANDS",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SMA" => Ok(StrategyKind::Sma),
            "EMA" => Ok(StrategyKind::Ema),
            "RSI" => Ok(StrategyKind::Rsi),
            "MACD" => Ok(StrategyKind::Macd),
            "BBANDS" | "BOLLINGER" => Ok(StrategyKind::Bbands),
            other => Err(BacktestError::configuration(format!(
                "unknown strategy type '{}' (supported: SMA, EMA, RSI, MACD, BBANDS)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl ParameterSpec {
    fn new(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        ParameterSpec {
            name,
            default,
            min,
            max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum StrategyParams {
    Sma {
        period: usize,
    },
    Ema {
        period: usize,
    },
    Rsi {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    Macd {
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    },
    Bbands {
        period: usize,
        std_dev: f64,
    },
}

impl StrategyParams {
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Sma => StrategyParams::Sma {
                period: DEFAULT_MA_PERIOD,
            },
            StrategyKind::Ema => StrategyParams::Ema {
                period: DEFAULT_MA_PERIOD,
            },
            StrategyKind::Rsi => StrategyParams::Rsi {
                period: DEFAULT_RSI_PERIOD,
                oversold: DEFAULT_OVERSOLD,
                overbought: DEFAULT_OVERBOUGHT,
            },
            StrategyKind::Macd => StrategyParams::Macd {
                fast_period: macd::DEFAULT_FAST,
                slow_period: macd::DEFAULT_SLOW,
                signal_period: macd::DEFAULT_SIGNAL,
            },
            StrategyKind::Bbands => StrategyParams::Bbands {
                period: bollinger::DEFAULT_PERIOD,
                std_dev: bollinger::DEFAULT_MULTIPLIER,
            },
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyParams::Sma { .. } => StrategyKind::Sma,
            StrategyParams::Ema { .. } => StrategyKind::Ema,
            StrategyParams::Rsi { .. } => StrategyKind::Rsi,
            StrategyParams::Macd { .. } => StrategyKind::Macd,
            StrategyParams::Bbands { .. } => StrategyKind::Bbands,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyConfig {
    #[serde(flatten)]
    pub params: StrategyParams,
    pub include_short: bool,
}

impl StrategyConfig {
    pub fn new(params: StrategyParams, include_short: bool) -> Self {
        StrategyConfig {
            params,
            include_short,
        }
    }

    /// Default parameters for `kind`, long-only.
    pub fn with_defaults(kind: StrategyKind) -> Self {
        StrategyConfig::new(StrategyParams::default_for(kind), false)
    }

    pub fn kind(&self) -> StrategyKind {
        self.params.kind()
    }

    /// Reject parameter combinations before any computation runs.
    pub fn validate(&self) -> Result<(), BacktestError> {
        match self.params {
            StrategyParams::Sma { period } | StrategyParams::Ema { period } => {
                require_positive("period", period)
            }
            StrategyParams::Rsi {
                period,
                oversold,
                overbought,
            } => {
                require_positive("period", period)?;
                for (name, value) in [("oversold", oversold), ("overbought", overbought)] {
                    if !(0.0..=100.0).contains(&value) {
                        return Err(BacktestError::invalid_parameter(
                            name,
                            format!("must be between 0 and 100, got {}", value),
                        ));
                    }
                }
                if oversold >= overbought {
                    return Err(BacktestError::invalid_parameter(
                        "oversold",
                        format!(
                            "oversold ({}) must be less than overbought ({})",
                            oversold, overbought
                        ),
                    ));
                }
                Ok(())
            }
            StrategyParams::Macd {
                fast_period,
                slow_period,
                signal_period,
            } => {
                require_positive("fast_period", fast_period)?;
                require_positive("slow_period", slow_period)?;
                require_positive("signal_period", signal_period)
            }
            StrategyParams::Bbands { period, std_dev } => {
                require_positive("period", period)?;
                if !std_dev.is_finite() || std_dev <= 0.0 {
                    return Err(BacktestError::invalid_parameter(
                        "std_dev",
                        format!("must be positive, got {}", std_dev),
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn indicator_type(&self) -> IndicatorType {
        match self.params {
            StrategyParams::Sma { period } => IndicatorType::Sma(period),
            StrategyParams::Ema { period } => IndicatorType::Ema(period),
            StrategyParams::Rsi { period, .. } => IndicatorType::Rsi(period),
            StrategyParams::Macd {
                fast_period,
                slow_period,
                signal_period,
            } => IndicatorType::Macd {
                fast: fast_period,
                slow: slow_period,
                signal: signal_period,
            },
            StrategyParams::Bbands { period, std_dev } => IndicatorType::Bollinger {
                period,
                multiplier: std_dev,
            },
        }
    }

    pub fn signal_rule(&self) -> SignalRule {
        match self.params {
            StrategyParams::Sma { .. } | StrategyParams::Ema { .. } => SignalRule::Trend,
            StrategyParams::Rsi {
                oversold,
                overbought,
                ..
            } => SignalRule::Threshold {
                lower: oversold,
                upper: overbought,
            },
            StrategyParams::Macd { .. } => SignalRule::Crossover,
            StrategyParams::Bbands { .. } => SignalRule::Band,
        }
    }
}

fn require_positive(name: &str, value: usize) -> Result<(), BacktestError> {
    if value == 0 {
        return Err(BacktestError::invalid_parameter(name, "must be positive"));
    }
    Ok(())
}
