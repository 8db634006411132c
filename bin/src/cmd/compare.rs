//! Compare command implementation.

use crate::cmd::backtest::{StrategyOutput, evaluate_strategy, print_text};
use crate::cmd::{OutputFormat, Strategy};
use crate::config::FaroConfig;
use crate::data;
use anyhow::Result;
use std::path::Path;

/// Run both strategies on the same inputs and report them side by side.
pub(crate) fn run_compare(
    volatility: &Path,
    returns: &Path,
    out_dir: Option<&Path>,
    format: OutputFormat,
    config: &FaroConfig,
) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Strategy Comparison                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let outputs: Vec<StrategyOutput> = [Strategy::Ml, Strategy::Vol]
        .into_iter()
        .map(|strategy| evaluate_strategy(strategy, volatility, returns, config))
        .collect::<Result<_>>()?;
    println!();

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)?;
        for out in &outputs {
            let path = dir.join(format!("{}_backtest_results.csv", out.strategy.file_stem()));
            data::write_report(&out.report, &path)?;
            println!("Results written to {}", path.display());
        }
        println!();
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outputs)
                .map_err(|e| anyhow::anyhow!("JSON serialization error: {}", e))?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!(
                "{:<28} {:>12} {:>12}",
                "",
                Strategy::Ml.label(),
                Strategy::Vol.label()
            );
            println!("{}", "-".repeat(54));
            let (ml, vol) = (&outputs[0].report.summary, &outputs[1].report.summary);
            print_row("Sharpe Ratio", ml.sharpe_ratio, vol.sharpe_ratio, false);
            print_row("Market Sharpe", ml.market_sharpe_ratio, vol.market_sharpe_ratio, false);
            print_row("Total Return", ml.total_return, vol.total_return, true);
            print_row("Annualized Return", ml.annualized_return, vol.annualized_return, true);
            print_row("Max Drawdown", ml.max_drawdown, vol.max_drawdown, true);
            print_row("Hit Rate", ml.hit_rate, vol.hit_rate, true);
            println!();

            for out in &outputs {
                println!("== {} ==", out.strategy.label());
                print_text(out);
            }
        }
    }

    Ok(())
}

fn print_row(name: &str, ml: f64, vol: f64, percent: bool) {
    if percent {
        println!("{:<28} {:>11.2}% {:>11.2}%", name, ml * 100.0, vol * 100.0);
    } else {
        println!("{:<28} {:>12.2} {:>12.2}", name, ml, vol);
    }
}
