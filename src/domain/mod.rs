//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod strategy;
pub mod signal;
pub mod position;
pub mod execution;
pub mod portfolio;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
pub mod error;
