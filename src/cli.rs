//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::trade_csv_adapter::TradeCsvAdapter;
use crate::domain::backtest;
use crate::domain::config_validation::{parse_date, validate_backtest_config, validate_strategy_config};
use crate::domain::error::LadderError;
use crate::domain::metrics::ResultBundle;
use crate::domain::price_series::{DEFAULT_SYMBOL, load_price_series};
use crate::domain::strategy::{
    DEFAULT_DROP_INTERVAL, DEFAULT_INITIAL_CASH, DEFAULT_INITIAL_INVESTMENT, DEFAULT_MAX_STEPS,
    DEFAULT_MULTIPLIER, DEFAULT_SELL_RECOVERY, DEFAULT_STOP_LOSS, StrategyConfig,
};
use crate::domain::trade::TradeKind;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_OUTPUT: &str = "result.json";

#[derive(Parser, Debug)]
#[command(name = "laddertrader", about = "Drawdown ladder backtester")]
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
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        trades_csv: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range available for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Output locations for a backtest run.
#[derive(Debug, Clone, Default)]
pub struct ExportPaths {
    pub json: Option<PathBuf>,
    pub trades_csv: Option<PathBuf>,
    pub pretty: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
            output,
            trades_csv,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(
                    &config,
                    symbol.as_deref(),
                    data_dir.as_ref(),
                    output.as_ref(),
                    trades_csv.as_ref(),
                )
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Serve { config } => run_serve(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn report_error(err: LadderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    data_dir_override: Option<&PathBuf>,
    output_override: Option<&PathBuf>,
    trades_csv_override: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate and build strategy
    let (strategy, end_date) = match validated_strategy(&adapter) {
        Ok(v) => v,
        Err(e) => return report_error(e),
    };

    // Stage 3: Resolve symbol, data source and exports
    let symbol = resolve_symbol(symbol_override, &adapter);
    let data_dir = resolve_data_dir(data_dir_override, &adapter);
    let exports = ExportPaths {
        json: Some(
            output_override
                .cloned()
                .or_else(|| adapter.get_string("report", "output").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        ),
        trades_csv: trades_csv_override
            .cloned()
            .or_else(|| {
                adapter
                    .get_string("report", "trades_csv")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from)
            }),
        pretty: adapter.get_bool("report", "pretty", true),
    };

    eprintln!("Reading prices for {} from {}", symbol, data_dir.display());
    let data_port = CsvAdapter::new(data_dir);

    // Stages 4-7: Data port dependent pipeline
    match run_backtest_pipeline(&data_port, &strategy, &symbol, end_date, &exports) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report_error(e),
    }
}

/// Validate both config sections and build the run parameters.
pub fn validated_strategy(adapter: &dyn ConfigPort) -> Result<(StrategyConfig, NaiveDate), LadderError> {
    validate_backtest_config(adapter)?;
    validate_strategy_config(adapter)?;
    let strategy = build_strategy_config(adapter)?;
    let end_date = resolve_end_date(adapter)?;
    Ok((strategy, end_date))
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, LadderError> {
    let start_str = adapter.get_string("backtest", "start_date");
    let start_date = parse_date(start_str.as_deref(), "backtest", "start_date")?;

    let max_steps = adapter.get_int("strategy", "max_steps", DEFAULT_MAX_STEPS as i64);
    let max_steps = u32::try_from(max_steps).map_err(|_| {
        LadderError::invalid("strategy", "max_steps", "max_steps must be at least 1")
    })?;

    let config = StrategyConfig {
        initial_cash: adapter.get_double("backtest", "initial_cash", DEFAULT_INITIAL_CASH),
        start_date,
        initial_investment: adapter.get_double(
            "strategy",
            "initial_investment",
            DEFAULT_INITIAL_INVESTMENT,
        ),
        drop_interval: adapter.get_double("strategy", "drop_interval", DEFAULT_DROP_INTERVAL),
        multiplier: adapter.get_double("strategy", "multiplier", DEFAULT_MULTIPLIER),
        sell_recovery: adapter.get_double("strategy", "sell_recovery", DEFAULT_SELL_RECOVERY),
        max_steps,
        stop_loss: adapter.get_double("strategy", "stop_loss", DEFAULT_STOP_LOSS),
    };
    config.validate()?;
    Ok(config)
}

/// `[backtest] end_date`, or today when the config leaves the range open.
pub fn resolve_end_date(adapter: &dyn ConfigPort) -> Result<NaiveDate, LadderError> {
    match adapter.get_string("backtest", "end_date") {
        Some(s) => parse_date(Some(&s), "backtest", "end_date"),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn resolve_symbol(symbol_override: Option<&str>, config: &dyn ConfigPort) -> String {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string())
}

pub fn resolve_data_dir(dir_override: Option<&PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    dir_override
        .cloned()
        .or_else(|| config.get_string("data", "dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &StrategyConfig,
    symbol: &str,
    end_date: NaiveDate,
    exports: &ExportPaths,
) -> Result<ResultBundle, LadderError> {
    // Stage 4: Fetch prices
    let bars = load_price_series(data_port, symbol, strategy.start_date, end_date)?;

    // Stage 5: Run backtest
    eprintln!(
        "Running backtest: {} bars, {} to {}",
        bars.len(),
        strategy.start_date,
        end_date,
    );
    let bundle = backtest::run_backtest(&bars, strategy)?;

    // Stage 6: Print console summary to stderr
    print_summary(&bundle);

    // Stage 7: Write exports
    if let Some(path) = &exports.json {
        JsonReportAdapter::new(exports.pretty).write(&bundle, &path.to_string_lossy())?;
        eprintln!("\nResult written to: {}", path.display());
    }
    if let Some(path) = &exports.trades_csv {
        TradeCsvAdapter::new().write(&bundle, &path.to_string_lossy())?;
        eprintln!("Trade history written to: {}", path.display());
    }

    Ok(bundle)
}

fn print_summary(bundle: &ResultBundle) {
    let count = |kind: TradeKind| {
        bundle
            .trade_history
            .iter()
            .filter(|t| t.kind == kind)
            .count()
    };

    eprintln!("\n=== Backtest Results ===");
    eprintln!("Initial Cash:     ${:.2}", bundle.initial_investment);
    eprintln!("Final Value:      ${:.2}", bundle.final_portfolio_value);
    eprintln!("Total Return:     {:.2}%", bundle.total_return);
    eprintln!("Purchases:        {}", bundle.number_of_purchases);
    eprintln!("Total Invested:   ${:.2}", bundle.total_invested);
    eprintln!("Remaining Cash:   ${:.2}", bundle.remaining_cash);
    eprintln!("Max Drawdown:     -{:.0}%", bundle.max_drawdown);
    eprintln!("Portfolio MDD:    -{:.0}%", bundle.portfolio_max_drawdown);
    eprintln!(
        "Trades:           {} sell, {} stop-loss, {} skipped",
        count(TradeKind::Sell),
        count(TradeKind::StopLoss),
        count(TradeKind::Skip),
    );
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (strategy, end_date) = match validated_strategy(&adapter) {
        Ok(v) => v,
        Err(e) => return report_error(e),
    };
    eprintln!("Config validated successfully");

    eprintln!("\nStrategy (parsed):");
    eprintln!("  initial_cash:       {}", strategy.initial_cash);
    eprintln!("  initial_investment: {}", strategy.initial_investment);
    eprintln!("  drop_interval:      {}%", strategy.drop_interval);
    eprintln!("  multiplier:         {}", strategy.multiplier);
    eprintln!("  sell_recovery:      {}%", strategy.sell_recovery);
    eprintln!("  max_steps:          {}", strategy.max_steps);
    eprintln!("  stop_loss:          {}%", strategy.stop_loss);

    eprintln!("\nLadder:");
    for step in 0..strategy.max_steps {
        eprintln!(
            "  step {:>2}: buy {:.2} at {}% drawdown",
            step,
            strategy.purchase_amount(step),
            strategy.trigger_drawdown(step),
        );
    }

    eprintln!("\nData:");
    eprintln!("  symbol: {}", resolve_symbol(None, &adapter));
    eprintln!("  dir:    {}", resolve_data_dir(None, &adapter).display());
    eprintln!("  range:  {} to {}", strategy.start_date, end_date);

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validated_strategy(&adapter) {
        Ok(_) => {
            eprintln!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => report_error(e),
    }
}

fn run_info(config_path: &Path, symbol_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbol = resolve_symbol(symbol_override, &config);
    let adapter = CsvAdapter::new(resolve_data_dir(None, &config));

    match adapter.get_data_range(&symbol) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{}: {} bars, {} to {}", symbol, count, min_date, max_date);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", symbol);
            ExitCode::SUCCESS
        }
        Err(e) => report_error(e),
    }
}

fn run_serve(config_path: &Path) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;
        use std::sync::Arc;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let data_port = Arc::new(CsvAdapter::new(resolve_data_dir(None, &config)))
            as Arc<dyn DataPort + Send + Sync>;

        let listen = config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let addr: SocketAddr = match listen.parse() {
            Ok(a) => a,
            Err(_) => {
                return report_error(LadderError::invalid(
                    "web",
                    "listen",
                    format!("invalid listen address {listen}"),
                ));
            }
        };

        eprintln!("Starting web server on {}", addr);

        let state = AppState {
            data_port,
            config: Arc::new(config),
        };
        let router = build_router(state);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => return report_error(e.into()),
        };
        let served: Result<(), std::io::Error> = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await
        });

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report_error(e.into()),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
