//! Backtest output.

use faro_traits::Month;
use serde::{Deserialize, Serialize};

/// Strategy and market return for one traded month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    /// Month the portfolio was formed in.
    pub month: Month,
    /// Mean lead return of the long leg minus that of the short leg.
    pub strategy_return: f64,
    /// Equal-weighted mean lead return of every scored security.
    pub market_return: f64,
}

/// Month-ordered strategy returns plus the number of skipped periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// One row per traded month, in calendar order.
    pub rows: Vec<PeriodReturn>,
    /// Months or walk-forward iterations that produced no row.
    pub skipped: usize,
}

impl BacktestResult {
    /// Number of traded months.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no month was traded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Traded months.
    pub fn months(&self) -> Vec<Month> {
        self.rows.iter().map(|r| r.month).collect()
    }

    /// Strategy return series.
    pub fn strategy_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.strategy_return).collect()
    }

    /// Market return series.
    pub fn market_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.market_return).collect()
    }

    /// Drops rows dated before `start`.
    pub fn retain_from(&mut self, start: Month) {
        self.rows.retain(|r| r.month >= start);
    }
}
