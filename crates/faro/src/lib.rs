#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/faro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Version information for the faro crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Types
// ============================================================================

/// Core types and trait definitions.
///
/// - [`Observation`] - One (security, month) row of the panel
/// - [`Month`] - Calendar month newtype
/// - [`Model`] - Trainable scoring model used by the backtesters
pub mod traits {
    pub use faro_traits::*;
}

pub use faro_traits::{
    FaroError, Feature, FeatureVector, Model, Month, Observation, Result, SecurityId,
};

// ============================================================================
// Data
// ============================================================================

/// Data loading, preprocessing and panel construction.
///
/// ## Inputs
///
/// - **Volatility table**: `PERMNO`, `Month`, `Idiosyncratic Volatility`
/// - **Return table**: `PERMNO`, `Month`, `RET`
/// - **Daily returns**: `PERMNO`, `DATE` (`YYYYMMDD`), `RET`
///
/// The [`Preprocessor`](data::Preprocessor) turns daily returns into the two
/// monthly tables; the [`PanelBuilder`] joins them.
pub mod data {
    pub use faro_data::*;
}

pub use faro_data::{Panel, PanelBuilder, ReturnTable, VolatilityTable};

// ============================================================================
// Models
// ============================================================================

/// Scoring models.
///
/// - **RandomForestClassifier**: class-1 probability that next month beats
///   the median
/// - **LinearRegression**: OLS forecast of next month's return
pub mod models {
    pub use faro_models::*;
}

// ============================================================================
// Evaluation
// ============================================================================

/// Backtesting and performance evaluation.
///
/// ### Strategy return
///
/// Each month, securities are ranked by model score and the strategy holds the
/// top quantile long and the bottom quantile short:
///
/// ```text
/// strategy_t = mean(lead | long) - mean(lead | short)
/// market_t   = mean(lead | all)
/// ```
///
/// ### Sharpe ratio
///
/// ```text
/// Sharpe = mean(strategy) / std(strategy) * sqrt(periods_per_year)
/// ```
pub mod eval {
    pub use faro_eval::*;
}

pub use faro_eval::{
    BacktestResult, ClassificationBacktester, PerformanceEvaluator, RegressionBacktester,
};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use faro::prelude::*;
/// ```
pub mod prelude {
    pub use faro_data::{Panel, PanelBuilder, Preprocessor, ReturnTable, VolatilityTable};
    pub use faro_eval::{
        BacktestResult, ClassificationBacktester, ClassificationConfig, ClassifierMode,
        PerformanceEvaluator, RegressionBacktester, RegressionConfig,
    };
    pub use faro_traits::{FaroError, Feature, Model, Month, Observation, Result};
}
