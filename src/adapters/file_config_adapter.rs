//! INI file configuration adapter.

use crate::domain::error::BacktestError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BacktestError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| BacktestError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, BacktestError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| BacktestError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
directory = ./data/daily
symbol = AAPL

[backtest]
initial_capital = 10000.0
commission = 0.001

[strategy]
type = MACD
fast_period = 12
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "directory"),
            Some("./data/daily".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "type"),
            Some("MACD".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Strategy]\nPeriod = 20\n").unwrap();
        assert_eq!(adapter.get_number("strategy", "period").unwrap(), Some(20.0));
    }

    #[test]
    fn get_number_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100000.5\n").unwrap();
        assert_eq!(
            adapter.get_number("backtest", "initial_capital").unwrap(),
            Some(100000.5)
        );
    }

    #[test]
    fn get_number_missing_or_blank_is_none() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ncommission =\n").unwrap();
        assert_eq!(adapter.get_number("backtest", "missing").unwrap(), None);
        assert_eq!(adapter.get_number("backtest", "commission").unwrap(), None);
    }

    #[test]
    fn get_number_rejects_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = not_a_number\n").unwrap();
        assert!(matches!(
            adapter.get_number("backtest", "initial_capital"),
            Err(BacktestError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn get_date_parses_iso_dates() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nstart_date = 2020-01-31\nend_date = 31/12/2024\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_date("data", "start_date").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2020, 1, 31)
        );
        assert!(matches!(
            adapter.get_date("data", "end_date"),
            Err(BacktestError::ConfigInvalid { .. })
        ));
        assert_eq!(adapter.get_date("data", "missing").unwrap(), None);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let adapter =
            FileConfigAdapter::from_string("[trailing_stop]\na = true\nb = yes\nc = 1\nd = on\n")
                .unwrap();
        assert!(adapter.get_bool("trailing_stop", "a", false));
        assert!(adapter.get_bool("trailing_stop", "b", false));
        assert!(adapter.get_bool("trailing_stop", "c", false));
        assert!(adapter.get_bool("trailing_stop", "d", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter =
            FileConfigAdapter::from_string("[trailing_stop]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("trailing_stop", "a", true));
        assert!(!adapter.get_bool("trailing_stop", "b", true));
        assert!(!adapter.get_bool("trailing_stop", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[trailing_stop]\n").unwrap();
        assert!(adapter.get_bool("trailing_stop", "missing", true));
        assert!(!adapter.get_bool("trailing_stop", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\ndirectory = /srv/prices\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "directory"),
            Some("/srv/prices".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(BacktestError::ConfigParse { .. })));
    }

    #[test]
    fn handles_all_config_sections() {
        let content = r#"
[data]
directory = ./data
symbol = SPY
start_date = 2020-01-01

[backtest]
initial_capital = 25000.0
position_size = 0.5

[trailing_stop]
active = true
percent = 3

[strategy]
type = BBANDS
include_short = yes
std_dev = 2.5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();

        assert_eq!(adapter.get_string("data", "symbol"), Some("SPY".to_string()));
        assert_eq!(
            adapter.get_number("backtest", "initial_capital").unwrap(),
            Some(25000.0)
        );
        assert_eq!(adapter.get_number("backtest", "position_size").unwrap(), Some(0.5));
        assert!(adapter.get_bool("trailing_stop", "active", false));
        assert_eq!(adapter.get_number("trailing_stop", "percent").unwrap(), Some(3.0));
        assert!(adapter.get_bool("strategy", "include_short", false));
        assert_eq!(adapter.get_number("strategy", "std_dev").unwrap(), Some(2.5));
    }
}
