//! Configuration validation.
//!
//! Checks every configured field before any data is loaded. Keys that are
//! absent fall back to defaults; keys that are present must parse.

use crate::domain::error::BacktestError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_data_directory(config)?;
    validate_dates(config)?;
    validate_initial_capital(config)?;
    validate_position_size(config)?;
    validate_commission(config)?;
    validate_annualization(config)?;
    validate_trailing_stop(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_strategy_type(config)?;
    for key in ["period", "fast_period", "slow_period", "signal_period"] {
        validate_period(config, key)?;
    }
    validate_thresholds(config)?;
    validate_std_dev(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data_directory(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("data", "directory") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(BacktestError::ConfigMissing {
            section: "data".to_string(),
            key: "directory".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start = config.get_date("data", "start_date")?;
    let end = config.get_date("data", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_number("backtest", "initial_capital")? {
        if value <= 0.0 {
            return Err(invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_number("backtest", "position_size")? {
        if value <= 0.0 || value > 1.0 {
            return Err(invalid(
                "backtest",
                "position_size",
                "position_size must be greater than 0 and at most 1",
            ));
        }
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_number("backtest", "commission")? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "backtest",
                "commission",
                "commission must be at least 0 and less than 1",
            ));
        }
    }
    Ok(())
}

fn validate_annualization(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_number("backtest", "annualization_factor")? {
        if value <= 0.0 {
            return Err(invalid(
                "backtest",
                "annualization_factor",
                "annualization_factor must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_trailing_stop(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_number("trailing_stop", "percent")? {
        if value <= 0.0 || value >= 100.0 {
            return Err(invalid(
                "trailing_stop",
                "percent",
                "percent must be between 0 and 100",
            ));
        }
    }
    Ok(())
}

fn validate_strategy_type(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("strategy", "type") {
        Some(s) if !s.trim().is_empty() => s
            .parse::<StrategyKind>()
            .map(|_| ())
            .map_err(|e| invalid("strategy", "type", e.to_string())),
        _ => Err(BacktestError::ConfigMissing {
            section: "strategy".to_string(),
            key: "type".to_string(),
        }),
    }
}

fn validate_period(config: &dyn ConfigPort, key: &str) -> Result<(), BacktestError> {
    if let Some(value) = config.get_number("strategy", key)? {
        if value < 1.0 || value.fract() != 0.0 {
            return Err(invalid(
                "strategy",
                key,
                format!("{} must be a positive whole number", key),
            ));
        }
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let oversold = config.get_number("strategy", "oversold")?;
    let overbought = config.get_number("strategy", "overbought")?;

    for (key, value) in [("oversold", oversold), ("overbought", overbought)] {
        if let Some(v) = value {
            if !(0.0..=100.0).contains(&v) {
                return Err(invalid(
                    "strategy",
                    key,
                    format!("{} must be between 0 and 100", key),
                ));
            }
        }
    }

    if let (Some(low), Some(high)) = (oversold, overbought) {
        if low >= high {
            return Err(invalid(
                "strategy",
                "oversold",
                "oversold must be less than overbought",
            ));
        }
    }
    Ok(())
}

fn validate_std_dev(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_number("strategy", "std_dev")? {
        if value <= 0.0 {
            return Err(invalid("strategy", "std_dev", "std_dev must be positive"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid(result: Result<(), BacktestError>, expected_key: &str) {
        match result {
            Err(BacktestError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected_key, other),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[data]
directory = ./data
symbol = AAPL
start_date = 2020-01-01
end_date = 2024-12-31

[backtest]
initial_capital = 10000.0
position_size = 0.5
commission = 0.001
annualization_factor = 252

[trailing_stop]
active = true
percent = 2.5
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn minimal_backtest_config_passes() {
        let config = make_config("[data]\ndirectory = ./data\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn missing_directory_fails() {
        let config = make_config("[backtest]\ninitial_capital = 1000\n");
        assert!(matches!(
            validate_backtest_config(&config),
            Err(BacktestError::ConfigMissing { ref key, .. }) if key == "directory"
        ));
    }

    #[test]
    fn initial_capital_zero_fails() {
        let config = make_config("[data]\ndirectory = d\n[backtest]\ninitial_capital = 0\n");
        assert_invalid(validate_backtest_config(&config), "initial_capital");
    }

    #[test]
    fn non_numeric_capital_fails() {
        let config = make_config("[data]\ndirectory = d\n[backtest]\ninitial_capital = lots\n");
        assert_invalid(validate_backtest_config(&config), "initial_capital");
    }

    #[test]
    fn position_size_above_one_fails() {
        let config = make_config("[data]\ndirectory = d\n[backtest]\nposition_size = 1.5\n");
        assert_invalid(validate_backtest_config(&config), "position_size");
    }

    #[test]
    fn position_size_zero_fails() {
        let config = make_config("[data]\ndirectory = d\n[backtest]\nposition_size = 0\n");
        assert_invalid(validate_backtest_config(&config), "position_size");
    }

    #[test]
    fn commission_of_one_fails() {
        let config = make_config("[data]\ndirectory = d\n[backtest]\ncommission = 1.0\n");
        assert_invalid(validate_backtest_config(&config), "commission");
    }

    #[test]
    fn negative_commission_fails() {
        let config = make_config("[data]\ndirectory = d\n[backtest]\ncommission = -0.1\n");
        assert_invalid(validate_backtest_config(&config), "commission");
    }

    #[test]
    fn annualization_zero_fails() {
        let config =
            make_config("[data]\ndirectory = d\n[backtest]\nannualization_factor = 0\n");
        assert_invalid(validate_backtest_config(&config), "annualization_factor");
    }

    #[test]
    fn trailing_percent_zero_fails() {
        let config = make_config("[data]\ndirectory = d\n[trailing_stop]\npercent = 0\n");
        assert_invalid(validate_backtest_config(&config), "percent");
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config("[data]\ndirectory = d\nstart_date = 01/02/2020\n");
        assert_invalid(validate_backtest_config(&config), "start_date");
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config(
            "[data]\ndirectory = d\nstart_date = 2024-01-01\nend_date = 2023-01-01\n",
        );
        assert_invalid(validate_backtest_config(&config), "start_date");
    }

    #[test]
    fn valid_strategy_config_passes() {
        let config = make_config(
            r#"
[strategy]
type = RSI
period = 14
oversold = 30
overbought = 70
include_short = true
"#,
        );
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn missing_strategy_type_fails() {
        let config = make_config("[strategy]\nperiod = 20\n");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(BacktestError::ConfigMissing { ref key, .. }) if key == "type"
        ));
    }

    #[test]
    fn unknown_strategy_type_fails() {
        let config = make_config("[strategy]\ntype = ICHIMOKU\n");
        assert_invalid(validate_strategy_config(&config), "type");
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config("[strategy]\ntype = SMA\nperiod = 0\n");
        assert_invalid(validate_strategy_config(&config), "period");
    }

    #[test]
    fn fractional_period_fails() {
        let config = make_config("[strategy]\ntype = MACD\nslow_period = 2.5\n");
        assert_invalid(validate_strategy_config(&config), "slow_period");
    }

    #[test]
    fn inverted_thresholds_fail() {
        let config = make_config("[strategy]\ntype = RSI\noversold = 70\noverbought = 30\n");
        assert_invalid(validate_strategy_config(&config), "oversold");
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let config = make_config("[strategy]\ntype = RSI\noverbought = 120\n");
        assert_invalid(validate_strategy_config(&config), "overbought");
    }

    #[test]
    fn non_positive_std_dev_fails() {
        let config = make_config("[strategy]\ntype = BBANDS\nstd_dev = 0\n");
        assert_invalid(validate_strategy_config(&config), "std_dev");
    }
}
