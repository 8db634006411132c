//! Backtest command implementation.

use crate::cmd::{OutputFormat, Strategy};
use crate::config::FaroConfig;
use crate::data;
use anyhow::Result;
use faro_eval::{
    ClassificationBacktester, ClassificationDiagnostics, PerformanceEvaluator, PerformanceReport,
    RegressionBacktester,
};
use serde::Serialize;
use std::path::Path;

/// JSON shape of one strategy run.
#[derive(Debug, Serialize)]
pub(crate) struct StrategyOutput {
    pub(crate) strategy: Strategy,
    pub(crate) skipped: usize,
    pub(crate) report: PerformanceReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) diagnostics: Option<ClassificationDiagnostics>,
}

/// Run one strategy end to end and return its evaluated output.
pub(crate) fn evaluate_strategy(
    strategy: Strategy,
    volatility: &Path,
    returns: &Path,
    config: &FaroConfig,
) -> Result<StrategyOutput> {
    let evaluator = PerformanceEvaluator::new(config.performance.clone());

    match strategy {
        Strategy::Ml => {
            let panel = data::load_panel(volatility, returns, &config.classification.features)?;
            let run = ClassificationBacktester::new(config.classification.clone()).run(&panel)?;
            Ok(StrategyOutput {
                strategy,
                skipped: run.result.skipped,
                report: evaluator.evaluate(&run.result),
                diagnostics: run.diagnostics,
            })
        }
        Strategy::Vol => {
            let panel = data::load_panel(volatility, returns, &config.regression.features)?;
            let result = RegressionBacktester::new(config.regression.clone()).run(&panel)?;
            Ok(StrategyOutput {
                strategy,
                skipped: result.skipped,
                report: evaluator.evaluate(&result),
                diagnostics: None,
            })
        }
    }
}

/// Run a backtest for one strategy.
pub(crate) fn run_backtest(
    strategy: Strategy,
    volatility: &Path,
    returns: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    config: &FaroConfig,
) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                       Backtesting                            ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Strategy: {}", strategy.label());
    if strategy == Strategy::Ml {
        println!("Mode:     {:?}", config.classification.mode);
    }
    println!("Quantile: {:.0}%", strategy_quantile(strategy, config) * 100.0);
    println!();

    let out = evaluate_strategy(strategy, volatility, returns, config)?;

    if let Some(path) = output {
        data::write_report(&out.report, path)?;
        println!("Results written to {}", path.display());
        println!();
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&out)
                .map_err(|e| anyhow::anyhow!("JSON serialization error: {}", e))?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(&out),
    }

    Ok(())
}

fn strategy_quantile(strategy: Strategy, config: &FaroConfig) -> f64 {
    match strategy {
        Strategy::Ml => config.classification.quantile,
        Strategy::Vol => config.regression.quantile,
    }
}

pub(crate) fn print_text(out: &StrategyOutput) {
    let s = &out.report.summary;
    let first = out.report.rows.first().map(|r| r.month.to_string());
    let last = out.report.rows.last().map(|r| r.month.to_string());
    println!(
        "Period:   {} to {} ({} months, {} skipped)",
        first.as_deref().unwrap_or("-"),
        last.as_deref().unwrap_or("-"),
        s.n_periods,
        out.skipped
    );
    println!();

    println!("Performance Metrics:");
    println!("  Total Return:      {:>10.2}%", s.total_return * 100.0);
    println!("  Annualized Return: {:>10.2}%", s.annualized_return * 100.0);
    println!("  Annualized Vol:    {:>10.2}%", s.annualized_volatility * 100.0);
    println!("  Sharpe Ratio:      {:>10.2}", s.sharpe_ratio);
    println!("  Market Sharpe:     {:>10.2}", s.market_sharpe_ratio);
    println!("  Max Drawdown:      {:>10.2}%", s.max_drawdown * 100.0);
    println!("  Hit Rate:          {:>10.2}%", s.hit_rate * 100.0);
    if let Some(last) = out.report.rows.last() {
        println!("  Final Strategy:    {:>10.4}", last.cumulative_strategy);
        println!("  Final Market:      {:>10.4}", last.cumulative_market);
    }
    println!();

    if let Some(d) = &out.diagnostics {
        println!(
            "Classifier (held-out {} of {} rows):",
            d.test_size,
            d.train_size + d.test_size
        );
        println!("  Label threshold:   {:>10.4}", d.label_threshold);
        println!(
            "  Confusion:         TN {} FP {} FN {} TP {}",
            d.confusion.true_negative,
            d.confusion.false_positive,
            d.confusion.false_negative,
            d.confusion.true_positive
        );
        println!();
        println!("{}", d.report);
        if let Some(importances) = &d.feature_importances {
            println!("Feature Importances:");
            for (feature, importance) in importances {
                println!("  {:25} {:>8.4}", feature.column_name(), importance);
            }
            println!();
        }
    }
}
