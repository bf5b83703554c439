//! JSON report adapter.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::ports::report_port::ReportPort;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Writes the full backtest result as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        JsonReportAdapter
    }

    pub fn render(result: &BacktestResult) -> Result<String, BacktestError> {
        serde_json::to_string_pretty(result).map_err(|e| BacktestError::Data {
            reason: format!("failed to serialize report: {}", e),
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), BacktestError> {
        let json = Self::render(result)?;
        let mut writer = BufWriter::new(File::create(output_path)?);
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::info!(path = output_path, bytes = json.len(), "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_backtest, BacktestConfig};
    use crate::domain::ohlcv::{PriceBar, PriceSeries};
    use crate::domain::strategy::{StrategyConfig, StrategyParams};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn make_result() -> BacktestResult {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let closes = [10.0, 11.0, 12.0, 9.0, 8.0, 13.0, 14.0];
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::from_close(start + chrono::Duration::days(i as i64), c))
            .collect();
        let series = PriceSeries::new("DEMO", bars).unwrap();
        let config = BacktestConfig::new(StrategyConfig::new(StrategyParams::Sma { period: 3 }, false));
        run_backtest(&series, &config).unwrap()
    }

    #[test]
    fn render_contains_sections() {
        let json = JsonReportAdapter::render(&make_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["symbol"], "DEMO");
        assert_eq!(value["strategy"]["type"], "SMA");
        assert_eq!(value["strategy"]["period"], 3);
        assert_eq!(value["indicator"]["indicator_type"], "SMA(3)");
        assert_eq!(value["equity_curve"].as_array().unwrap().len(), 7);
        assert_eq!(value["trades"].as_array().unwrap().len(), 2);
        assert_eq!(value["trades"][0]["side"], "long");
        assert!(value["metrics"]["sharpe_ratio"].is_object());
        assert_eq!(value["summary"]["data_points"], 7);
    }

    #[test]
    fn degenerate_metric_serializes_as_null_with_cause() {
        let mut result = make_result();
        result.metrics.sharpe_ratio.value = None;
        result.metrics.sharpe_ratio.degeneracy =
            Some(crate::domain::metrics::Degeneracy::ZeroVariance);

        let value: serde_json::Value =
            serde_json::from_str(&JsonReportAdapter::render(&result).unwrap()).unwrap();
        assert!(value["metrics"]["sharpe_ratio"]["value"].is_null());
        assert_eq!(
            value["metrics"]["sharpe_ratio"]["degeneracy"],
            "zero_variance"
        );
    }

    #[test]
    fn write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let path_str = path.to_str().unwrap();

        JsonReportAdapter::new()
            .write(&make_result(), path_str)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"symbol\": \"DEMO\""));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn write_to_missing_directory_is_io_error() {
        let result = JsonReportAdapter::new().write(&make_result(), "/nonexistent/dir/report.json");
        assert!(matches!(result, Err(BacktestError::Io(_))));
    }
}
