//! Long-short backtesting and performance evaluation for faro.
//!
//! This crate turns a [`faro_data::Panel`] into monthly strategy returns and
//! summarises them:
//! - [`select_extremes`]: shared long/short quantile selection
//! - [`ClassificationBacktester`]: direction classifier (random forest by default)
//! - [`RegressionBacktester`]: rolling linear-regression baseline
//! - [`PerformanceEvaluator`]: cumulative series, Sharpe ratio and friends
//!
//! # Example
//!
//! ```rust,ignore
//! use faro_eval::{PerformanceEvaluator, RegressionBacktester, RegressionConfig};
//!
//! let result = RegressionBacktester::new(RegressionConfig::default()).run(&panel)?;
//! let report = PerformanceEvaluator::default().evaluate(&result);
//! println!("Sharpe Ratio: {:.2}", report.summary.sharpe_ratio);
//! ```

pub mod classification;
pub mod performance;
pub mod regression;
pub mod result;
pub mod schedule;
pub mod selection;
pub mod snapshot;

mod matrix;
#[cfg(test)]
mod testing;

pub use classification::{
    ClassificationBacktester, ClassificationConfig, ClassificationDiagnostics, ClassificationRun,
    ClassifierMode,
};
pub use performance::{
    PerformanceConfig, PerformanceEvaluator, PerformanceReport, PerformanceRow,
    PerformanceSummary, cumulative_product, max_drawdown, sharpe_ratio,
};
pub use regression::{RegressionBacktester, RegressionConfig};
pub use result::{BacktestResult, PeriodReturn};
pub use schedule::{WalkForward, WalkForwardSplit};
pub use selection::{Extremes, average_ranks, rank_descending, select_extremes};
pub use snapshot::{MonthlySnapshot, ScoredObservation};
