//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use crate::domain::error::BacktestError;
use crate::domain::execution::{ExecutionConfig, TrailingStop};
use crate::domain::indicator::{self, IndicatorValue};
use crate::domain::metrics::DAYS_PER_MONTH;
use crate::domain::strategy::{StrategyConfig, StrategyKind, StrategyParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Rule-based single-asset strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [data] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Write the full result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Compute one indicator over a CSV file and print it aligned to the closes
    Indicator {
        #[arg(long)]
        data: PathBuf,
        /// SMA, EMA, RSI, MACD or BBANDS
        #[arg(long = "type", value_name = "TYPE")]
        kind: String,
        #[arg(long)]
        period: Option<usize>,
        #[arg(long)]
        fast_period: Option<usize>,
        #[arg(long)]
        slow_period: Option<usize>,
        #[arg(long)]
        signal_period: Option<usize>,
        #[arg(long)]
        std_dev: Option<f64>,
    },
    /// List strategies and their parameters
    Strategies {
        #[arg(long)]
        json: bool,
    },
    /// List symbols available in the configured data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, symbol.as_deref(), output.as_deref())
            }
        }
        Command::Indicator {
            data,
            kind,
            period,
            fast_period,
            slow_period,
            signal_period,
            std_dev,
        } => {
            let lookup = |key: &str| -> Result<Option<f64>, BacktestError> {
                Ok(match key {
                    "period" => period.map(|v| v as f64),
                    "fast_period" => fast_period.map(|v| v as f64),
                    "slow_period" => slow_period.map(|v| v as f64),
                    "signal_period" => signal_period.map(|v| v as f64),
                    "std_dev" => std_dev,
                    _ => None,
                })
            };
            run_indicator(&data, &kind, lookup)
        }
        Command::Strategies { json } => run_strategies(json),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

fn report_error(err: &BacktestError) -> ExitCode {
    tracing::debug!(error = ?err, "command failed");
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| report_error(&e))
}

fn run_backtest(config_path: &Path, symbol: Option<&str>, output: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let prepared = validate_backtest_config(&adapter)
        .and_then(|_| validate_strategy_config(&adapter))
        .and_then(|_| build_backtest_config(&adapter))
        .and_then(|config| {
            let symbol = resolve_symbol(symbol, &adapter)?;
            let start = adapter.get_date("data", "start_date")?;
            let end = adapter.get_date("data", "end_date")?;
            Ok((config, symbol, start, end))
        });
    let (bt_config, symbol, start, end) = match prepared {
        Ok(p) => p,
        Err(e) => return report_error(&e),
    };

    let directory = adapter
        .get_string("data", "directory")
        .unwrap_or_else(|| ".".to_string());
    let data_port = CsvAdapter::new(PathBuf::from(directory));
    let report_port = JsonReportAdapter::new();
    let output = output.map(|p| p.display().to_string());
    let report = output
        .as_deref()
        .map(|path| (&report_port as &dyn ReportPort, path));

    match run_backtest_pipeline(&data_port, report, &bt_config, &symbol, start, end) {
        Ok(result) => {
            print_summary(&result);
            if let Some(path) = output {
                eprintln!("\nReport written to: {}", path);
            }
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

/// Fetch prices, run the backtest and optionally write a report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report: Option<(&dyn ReportPort, &str)>,
    bt_config: &BacktestConfig,
    symbol: &str,
    start_date: Option<chrono::NaiveDate>,
    end_date: Option<chrono::NaiveDate>,
) -> Result<BacktestResult, BacktestError> {
    let series = data_port.fetch_prices(symbol, start_date, end_date)?;
    if series.is_empty() {
        return Err(BacktestError::Data {
            reason: format!("no price data for {} in the requested range", symbol),
        });
    }
    eprintln!(
        "Running {} on {}: {} bars",
        bt_config.strategy.indicator_type(),
        symbol,
        series.len()
    );

    let result = backtest_engine::run_backtest(&series, bt_config)?;
    if let Some((port, path)) = report {
        port.write(&result, path)?;
    }
    Ok(result)
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, BacktestError> {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let defaults = ExecutionConfig::default();
    let number = |section: &str, key: &str, default: f64| -> Result<f64, BacktestError> {
        Ok(adapter.get_number(section, key)?.unwrap_or(default))
    };

    let execution = ExecutionConfig {
        initial_capital: number("backtest", "initial_capital", defaults.initial_capital)?,
        position_size: number("backtest", "position_size", defaults.position_size)?,
        commission_rate: number("backtest", "commission", defaults.commission_rate)?,
        trailing_stop: TrailingStop {
            active: adapter.get_bool("trailing_stop", "active", defaults.trailing_stop.active),
            percent: number("trailing_stop", "percent", defaults.trailing_stop.percent)?,
        },
    };

    let mut config = BacktestConfig::new(build_strategy_config(adapter)?);
    config.execution = execution;
    config.annualization_factor =
        number("backtest", "annualization_factor", config.annualization_factor)?;
    Ok(config)
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, BacktestError> {
    let kind: StrategyKind = adapter
        .get_string("strategy", "type")
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "strategy".into(),
            key: "type".into(),
        })?
        .parse()?;
    let params = params_with_overrides(kind, |key| adapter.get_number("strategy", key))?;
    let include_short = adapter.get_bool("strategy", "include_short", false);
    Ok(StrategyConfig::new(params, include_short))
}

/// Default parameters for `kind` with any value `lookup` supplies substituted.
pub fn params_with_overrides<F>(kind: StrategyKind, lookup: F) -> Result<StrategyParams, BacktestError>
where
    F: Fn(&str) -> Result<Option<f64>, BacktestError>,
{
    let whole = |key: &str, default: usize| -> Result<usize, BacktestError> {
        match lookup(key)? {
            None => Ok(default),
            Some(v) if v.is_finite() && v >= 1.0 && v.fract() == 0.0 => Ok(v as usize),
            Some(v) => Err(BacktestError::invalid_parameter(
                key,
                format!("must be a positive whole number, got {}", v),
            )),
        }
    };
    let real = |key: &str, default: f64| -> Result<f64, BacktestError> {
        Ok(lookup(key)?.unwrap_or(default))
    };

    Ok(match StrategyParams::default_for(kind) {
        StrategyParams::Sma { period } => StrategyParams::Sma {
            period: whole("period", period)?,
        },
        StrategyParams::Ema { period } => StrategyParams::Ema {
            period: whole("period", period)?,
        },
        StrategyParams::Rsi {
            period,
            oversold,
            overbought,
        } => StrategyParams::Rsi {
            period: whole("period", period)?,
            oversold: real("oversold", oversold)?,
            overbought: real("overbought", overbought)?,
        },
        StrategyParams::Macd {
            fast_period,
            slow_period,
            signal_period,
        } => StrategyParams::Macd {
            fast_period: whole("fast_period", fast_period)?,
            slow_period: whole("slow_period", slow_period)?,
            signal_period: whole("signal_period", signal_period)?,
        },
        StrategyParams::Bbands { period, std_dev } => StrategyParams::Bbands {
            period: whole("period", period)?,
            std_dev: real("std_dev", std_dev)?,
        },
    })
}

fn print_summary(result: &BacktestResult) {
    let summary = &result.summary;
    let metrics = &result.metrics;
    let stats = &metrics.trade_stats;

    let ratio = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v));
    let pct = |value: Option<f64>| {
        value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
    };

    println!("=== {} on {} ===", result.indicator.indicator_type, result.symbol);
    println!("Bars:             {}", summary.data_points);
    println!("Initial Capital:  {:.2}", summary.initial_capital);
    println!("Final Capital:    {:.2}", summary.final_capital);
    println!("Total Return:     {:.2}%", summary.total_return_pct);
    println!(
        "Buy & Hold:       {}",
        summary
            .buy_and_hold_return_pct
            .map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v))
    );
    println!("Sharpe Ratio:     {}", ratio(metrics.sharpe_ratio.value));
    println!("Sortino Ratio:    {}", ratio(metrics.sortino_ratio.value));
    println!(
        "Max Drawdown:     {}",
        pct(metrics.max_drawdown.as_ref().map(|d| d.value))
    );
    println!("Trades:           {}", stats.trade_count);
    println!("Win Rate:         {}", pct(stats.win_rate));
    println!("Avg Trade Return: {}", pct(stats.avg_return));
    println!(
        "Avg Duration:     {}",
        stats
            .avg_duration
            .map_or_else(|| "n/a".to_string(), |d| format!("{:.1} bars", d))
    );
    println!("Trades / Month:   {}", ratio(stats.trades_per_month));
    println!("Bars in Market:   {}", stats.days_in_market);
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let prepared = validate_backtest_config(&adapter)
        .and_then(|_| validate_strategy_config(&adapter))
        .and_then(|_| build_backtest_config(&adapter))
        .and_then(|config| config.validate().map(|_| config));
    let bt_config = match prepared {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    eprintln!("Config validated successfully");

    let indicator_type = bt_config.strategy.indicator_type();
    println!("Strategy:   {}", bt_config.strategy.kind());
    println!("Indicator:  {}", indicator_type);
    println!("Min bars:   {}", indicator_type.required_bars());
    println!(
        "Symbol:     {}",
        resolve_symbol(None, &adapter).unwrap_or_else(|_| "(from --symbol)".to_string())
    );
    match serde_json::to_string_pretty(&bt_config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("warning: could not render config: {e}"),
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_indicator<F>(data: &Path, kind: &str, lookup: F) -> ExitCode
where
    F: Fn(&str) -> Result<Option<f64>, BacktestError>,
{
    let symbol = data
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("DATA")
        .to_uppercase();

    let computed = kind
        .parse::<StrategyKind>()
        .and_then(|k| params_with_overrides(k, lookup))
        .map(|params| StrategyConfig::new(params, false).indicator_type())
        .and_then(|indicator_type| {
            let series = CsvAdapter::read_file(data, &symbol)?;
            let values = indicator::compute(&indicator_type, &series.closes())?;
            Ok((series, values))
        });
    let (series, values) = match computed {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };

    match write_indicator_csv(&series, &values) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn write_indicator_csv(
    series: &crate::domain::ohlcv::PriceSeries,
    values: &indicator::IndicatorSeries,
) -> Result<(), BacktestError> {
    let columns: &[&str] = match values.values.first() {
        Some(IndicatorValue::Macd { .. }) => &["macd", "signal", "histogram"],
        Some(IndicatorValue::Bands { .. }) => &["upper", "middle", "lower"],
        _ => &["value"],
    };

    let csv_error = |e: csv::Error| BacktestError::Data {
        reason: format!("failed to write CSV: {}", e),
    };
    let mut writer = csv::Writer::from_writer(std::io::stdout());

    let mut header = vec!["timestamp", "close"];
    header.extend_from_slice(columns);
    writer.write_record(&header).map_err(csv_error)?;

    for (i, bar) in series.bars().iter().enumerate() {
        let mut record = vec![bar.timestamp.to_string(), bar.close.to_string()];
        let cells: Vec<f64> = match values.value_at(i) {
            Some(IndicatorValue::Scalar(v)) => vec![*v],
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) => vec![*line, *signal, *histogram],
            Some(IndicatorValue::Bands {
                upper,
                middle,
                lower,
            }) => vec![*upper, *middle, *lower],
            None => Vec::new(),
        };
        if cells.is_empty() {
            record.extend(columns.iter().map(|_| String::new()));
        } else {
            record.extend(cells.iter().map(|v| format!("{:.6}", v)));
        }
        writer.write_record(&record).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_strategies(json: bool) -> ExitCode {
    if json {
        let listing: Vec<_> = StrategyKind::ALL
            .iter()
            .map(|kind| {
                serde_json::json!({
                    "type": kind,
                    "parameters": kind.parameters(),
                })
            })
            .collect();
        return match serde_json::to_string_pretty(&listing) {
            Ok(s) => {
                println!("{}", s);
                ExitCode::SUCCESS
            }
            Err(e) => report_error(&BacktestError::Data {
                reason: e.to_string(),
            }),
        };
    }

    for kind in StrategyKind::ALL {
        println!("{}", kind);
        for param in kind.parameters() {
            println!(
                "  {:<14} default {:<6} range {} to {}",
                param.name, param.default, param.min, param.max
            );
        }
    }
    println!(
        "\nTrades per month assume {} days per month.",
        DAYS_PER_MONTH
    );
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let directory = match config.get_string("data", "directory") {
        Some(d) => d,
        None => {
            return report_error(&BacktestError::ConfigMissing {
                section: "data".into(),
                key: "directory".into(),
            })
        }
    };

    let adapter = CsvAdapter::new(PathBuf::from(&directory));
    match adapter.list_symbols() {
        Ok(symbols) if symbols.is_empty() => {
            eprintln!("No symbols found in {}", directory);
            ExitCode::SUCCESS
        }
        Ok(symbols) => {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            eprintln!("{} symbols found", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating configuration: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checked = validate_backtest_config(&adapter)
        .and_then(|_| validate_strategy_config(&adapter))
        .and_then(|_| build_backtest_config(&adapter))
        .and_then(|config| config.validate().map(|_| config));
    match checked {
        Ok(config) => {
            eprintln!(
                "\nConfiguration is valid: {} with {}",
                config.strategy.kind(),
                config.strategy.indicator_type()
            );
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}
