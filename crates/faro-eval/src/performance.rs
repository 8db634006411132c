//! Performance evaluation of a backtest.
//!
//! Compounds the strategy and market return series and summarises the
//! strategy with the usual risk and return statistics.

use crate::result::BacktestResult;
use faro_traits::{Month, Result, stats};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Output column names.
pub const MONTH: &str = "Month";
/// Strategy return column.
pub const STRATEGY_RETURN: &str = "StrategyReturn";
/// Market return column.
pub const MARKET_RETURN: &str = "MarketReturn";
/// Compounded strategy column.
pub const CUMULATIVE_STRATEGY: &str = "Cumulative_Strategy";
/// Compounded market column.
pub const CUMULATIVE_MARKET: &str = "Cumulative_Market";

/// Performance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Return periods per year used for annualisation; 1 leaves ratios
    /// per-period.
    pub periods_per_year: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 12,
        }
    }
}

/// One month of the compounded table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    /// Month.
    pub month: Month,
    /// Long-short return.
    pub strategy_return: f64,
    /// Equal-weighted market return.
    pub market_return: f64,
    /// Growth of one unit invested in the strategy.
    pub cumulative_strategy: f64,
    /// Growth of one unit invested in the market.
    pub cumulative_market: f64,
}

/// Summary statistics of the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Number of periods.
    pub n_periods: usize,
    /// Annualised Sharpe ratio of the strategy.
    pub sharpe_ratio: f64,
    /// Annualised Sharpe ratio of the market.
    pub market_sharpe_ratio: f64,
    /// Final compounded return.
    pub total_return: f64,
    /// Geometric annual return.
    pub annualized_return: f64,
    /// Annualised standard deviation of returns.
    pub annualized_volatility: f64,
    /// Largest peak-to-trough loss of the compounded series.
    pub max_drawdown: f64,
    /// Share of periods with a positive return.
    pub hit_rate: f64,
}

/// Compounded table plus summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Month-ordered rows.
    pub rows: Vec<PerformanceRow>,
    /// Summary statistics.
    pub summary: PerformanceSummary,
}

impl PerformanceReport {
    /// The table as a DataFrame with the standard output columns.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let months: Vec<String> = self.rows.iter().map(|r| r.month.to_string()).collect();
        let strategy: Vec<f64> = self.rows.iter().map(|r| r.strategy_return).collect();
        let market: Vec<f64> = self.rows.iter().map(|r| r.market_return).collect();
        let cum_strategy: Vec<f64> = self.rows.iter().map(|r| r.cumulative_strategy).collect();
        let cum_market: Vec<f64> = self.rows.iter().map(|r| r.cumulative_market).collect();

        Ok(df! {
            MONTH => months,
            STRATEGY_RETURN => strategy,
            MARKET_RETURN => market,
            CUMULATIVE_STRATEGY => cum_strategy,
            CUMULATIVE_MARKET => cum_market,
        }?)
    }
}

/// Computes cumulative series and summary statistics.
#[derive(Debug, Clone, Default)]
pub struct PerformanceEvaluator {
    config: PerformanceConfig,
}

impl PerformanceEvaluator {
    /// Creates an evaluator.
    pub const fn new(config: PerformanceConfig) -> Self {
        Self { config }
    }

    /// Evaluates a backtest.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let report = PerformanceEvaluator::default().evaluate(&result);
    /// println!("Sharpe Ratio: {:.2}", report.summary.sharpe_ratio);
    /// ```
    pub fn evaluate(&self, result: &BacktestResult) -> PerformanceReport {
        let periods = self.config.periods_per_year;
        let strategy = result.strategy_returns();
        let market = result.market_returns();
        let cum_strategy = cumulative_product(&strategy);
        let cum_market = cumulative_product(&market);

        let rows = result
            .rows
            .iter()
            .zip(cum_strategy.iter().zip(&cum_market))
            .map(|(r, (&cs, &cm))| PerformanceRow {
                month: r.month,
                strategy_return: r.strategy_return,
                market_return: r.market_return,
                cumulative_strategy: cs,
                cumulative_market: cm,
            })
            .collect();

        let n = strategy.len();
        let total_return = cum_strategy.last().map_or(0.0, |w| w - 1.0);
        let annualized_return = if n > 0 {
            (1.0 + total_return).powf(periods as f64 / n as f64) - 1.0
        } else {
            f64::NAN
        };
        let hit_rate = if n > 0 {
            strategy.iter().filter(|&&r| r > 0.0).count() as f64 / n as f64
        } else {
            f64::NAN
        };

        let summary = PerformanceSummary {
            n_periods: n,
            sharpe_ratio: sharpe_ratio(&strategy, periods),
            market_sharpe_ratio: sharpe_ratio(&market, periods),
            total_return,
            annualized_return,
            annualized_volatility: stats::sample_std(&strategy) * (periods as f64).sqrt(),
            max_drawdown: max_drawdown(&cum_strategy),
            hit_rate,
        };

        tracing::debug!(
            periods = n,
            sharpe = summary.sharpe_ratio,
            total_return,
            "evaluated performance"
        );

        PerformanceReport { rows, summary }
    }
}

/// Running product of `1 + r`.
///
/// # Examples
///
/// ```
/// use faro_eval::cumulative_product;
///
/// let cum = cumulative_product(&[0.1, -0.5]);
/// assert!((cum[0] - 1.1).abs() < 1e-12);
/// assert!((cum[1] - 0.55).abs() < 1e-12);
/// ```
pub fn cumulative_product(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

/// Sharpe ratio: mean over sample standard deviation, scaled by
/// `sqrt(periods_per_year)`.
///
/// Returns `NaN` with fewer than two finite returns or zero deviation.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: usize) -> f64 {
    let std = stats::sample_std(returns);
    if !std.is_finite() || std < stats::MIN_STD_THRESHOLD {
        return f64::NAN;
    }
    stats::mean(returns) / std * (periods_per_year as f64).sqrt()
}

/// Maximum drawdown of a wealth series that starts from 1.
pub fn max_drawdown(wealth: &[f64]) -> f64 {
    let mut max_dd = 0.0;
    let mut peak = 1.0;

    for &w in wealth {
        if w > peak {
            peak = w;
        }
        let dd = (peak - w) / peak;
        if dd > max_dd {
            max_dd = dd;
        }
    }

    max_dd
}
