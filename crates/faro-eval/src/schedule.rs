//! Rolling walk-forward schedule over month indices.

use faro_traits::{FaroError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One walk-forward iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkForwardSplit {
    /// Half-open range of training month indices.
    pub train: Range<usize>,
    /// Index of the month scored out of sample.
    pub test: usize,
}

/// Rolling training window followed by a gap before the test month.
///
/// With `window = 36` and `gap = 1`, iteration `i` trains on months
/// `[i - 36, i)` and tests on month `i + 1`; month `i` is never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForward {
    /// Number of training months.
    pub window: usize,
    /// Months between the end of the training window and the test month.
    pub gap: usize,
}

impl Default for WalkForward {
    fn default() -> Self {
        Self { window: 36, gap: 1 }
    }
}

impl WalkForward {
    /// Creates a schedule.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `window` is zero.
    pub fn new(window: usize, gap: usize) -> Result<Self> {
        if window == 0 {
            return Err(FaroError::InvalidConfig(
                "walk-forward window must be positive".to_string(),
            ));
        }
        Ok(Self { window, gap })
    }

    /// Iterations over `n_months` sorted months.
    pub fn splits(&self, n_months: usize) -> impl Iterator<Item = WalkForwardSplit> + use<> {
        let Self { window, gap } = *self;
        (window..n_months.saturating_sub(gap)).map(move |i| WalkForwardSplit {
            train: i - window..i,
            test: i + gap,
        })
    }
}
