//! faro CLI binary.
//!
//! Provides a command-line interface for the faro factor pipeline.

mod cmd;
mod config;
mod data;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cmd::{ModeArg, OutputFormat, Strategy};
use config::FaroConfig;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "faro")]
#[command(about = "Idiosyncratic-volatility factor pipeline and backtester", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file; command-line flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (text or json); filter with FARO_LOG
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Monthly input tables.
#[derive(Args)]
struct Inputs {
    /// Volatility CSV (PERMNO, Month, Idiosyncratic Volatility)
    #[arg(long, default_value = "idiosyncratic_volatility.csv")]
    volatility: PathBuf,

    /// Monthly return CSV (PERMNO, Month, RET)
    #[arg(long, default_value = "monthly_returns.csv")]
    returns: PathBuf,
}

/// Overrides shared by the backtesting commands.
#[derive(Args)]
struct Overrides {
    /// Fraction of each month held long and short
    #[arg(short, long)]
    quantile: Option<f64>,

    /// Classifier mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Random seed for the split and the forest
    #[arg(long)]
    seed: Option<u64>,

    /// Number of trees in the forest
    #[arg(long)]
    trees: Option<usize>,

    /// Walk-forward training window in months
    #[arg(short, long)]
    window: Option<usize>,

    /// First month kept in the regression results (YYYY-MM)
    #[arg(long)]
    start: Option<String>,

    /// Periods per year for annualisation (1 for raw ratios)
    #[arg(long)]
    periods_per_year: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build monthly volatility and return tables from daily returns
    Preprocess {
        /// Daily CSV (PERMNO, DATE as YYYYMMDD, RET)
        input: PathBuf,

        /// Directory for the two output tables
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Rolling volatility window in daily rows
        #[arg(long)]
        window: Option<usize>,
    },

    /// Run a backtest
    Backtest {
        /// Strategy to run
        #[arg(value_enum)]
        strategy: Strategy,

        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        overrides: Overrides,

        /// Write the monthly results table to this CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run both strategies and compare them
    Compare {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        overrides: Overrides,

        /// Directory for the per-strategy results tables
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_format).map_err(|e| anyhow::anyhow!(e))?;

    let mut config = FaroConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Preprocess {
            input,
            out_dir,
            window,
        } => {
            if let Some(window) = window {
                config.preprocess.volatility_window = window;
            }
            cmd::preprocess::run_preprocess(&input, &out_dir, config.preprocess)?;
        }
        Commands::Backtest {
            strategy,
            inputs,
            overrides,
            output,
            format,
        } => {
            overrides.apply(&mut config)?;
            cmd::backtest::run_backtest(
                strategy,
                &inputs.volatility,
                &inputs.returns,
                output.as_deref(),
                format,
                &config,
            )?;
        }
        Commands::Compare {
            inputs,
            overrides,
            out_dir,
            format,
        } => {
            overrides.apply(&mut config)?;
            cmd::compare::run_compare(
                &inputs.volatility,
                &inputs.returns,
                out_dir.as_deref(),
                format,
                &config,
            )?;
        }
    }

    Ok(())
}

impl Overrides {
    fn apply(self, config: &mut FaroConfig) -> Result<()> {
        if let Some(q) = self.quantile {
            config.classification.quantile = q;
            config.regression.quantile = q;
        }
        if let Some(mode) = self.mode {
            config.classification.mode = mode.into();
        }
        if let Some(seed) = self.seed {
            config.classification.seed = seed;
            config.classification.forest.seed = seed;
        }
        if let Some(trees) = self.trees {
            config.classification.forest.n_trees = trees;
        }
        if let Some(window) = self.window {
            config.classification.schedule.window = window;
            config.regression.schedule.window = window;
        }
        if let Some(start) = self.start {
            config.regression.start_month = Some(data::parse_month(&start)?);
        }
        if let Some(periods) = self.periods_per_year {
            config.performance.periods_per_year = periods;
        }
        Ok(())
    }
}

/// Install the global subscriber; `FARO_LOG` holds the filter (default `info`).
fn init_tracing(log_format: &str) -> Result<(), String> {
    let filter = std::env::var("FARO_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    if log_format.trim().eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
