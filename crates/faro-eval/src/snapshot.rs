//! Scored cross-section of one month and the long/short return it yields.

use crate::result::{BacktestResult, PeriodReturn};
use crate::selection::{rank_descending, select_extremes};
use faro_traits::{FaroError, Month, Observation, Result, stats};

/// An observation with its model score and rank within the month.
#[derive(Debug, Clone, Copy)]
pub struct ScoredObservation<'a> {
    /// The panel row.
    pub observation: &'a Observation,
    /// Model output for the row.
    pub score: f64,
    /// 1-based ordinal rank by score, descending.
    pub rank: usize,
}

/// All scored observations of one month.
#[derive(Debug, Clone)]
pub struct MonthlySnapshot<'a> {
    month: Month,
    rows: Vec<ScoredObservation<'a>>,
}

impl<'a> MonthlySnapshot<'a> {
    /// Attaches scores and ranks to a month's observations.
    ///
    /// # Errors
    ///
    /// `Model` if the score count differs from the observation count.
    pub fn new(month: Month, observations: &'a [Observation], scores: &[f64]) -> Result<Self> {
        if observations.len() != scores.len() {
            return Err(FaroError::Model(format!(
                "{} scores for {} observations in {month}",
                scores.len(),
                observations.len()
            )));
        }
        let ranks = rank_descending(scores);
        let rows = observations
            .iter()
            .zip(scores)
            .zip(ranks)
            .map(|((observation, &score), rank)| ScoredObservation {
                observation,
                score,
                rank,
            })
            .collect();
        Ok(Self { month, rows })
    }

    /// Snapshot month.
    pub const fn month(&self) -> Month {
        self.month
    }

    /// Scored rows in panel order.
    pub fn rows(&self) -> &[ScoredObservation<'a>] {
        &self.rows
    }

    /// Long-short and market return for the month.
    ///
    /// A month whose positions all land in both legs (one observation, or one
    /// tie block) earns a zero spread. Returns `None` when no score is finite,
    /// so the month produces no row.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a fraction outside `(0, 0.5]`.
    pub fn long_short(&self, fraction: f64) -> Result<Option<PeriodReturn>> {
        let scores: Vec<f64> = self.rows.iter().map(|r| r.score).collect();
        let extremes = select_extremes(&scores, fraction)?;
        if !extremes.is_tradable() {
            return Ok(None);
        }

        let leg_mean = |idx: &[usize]| {
            let leads: Vec<f64> = idx
                .iter()
                .map(|&i| self.rows[i].observation.return_lead)
                .collect();
            stats::mean(&leads)
        };
        let all: Vec<f64> = self
            .rows
            .iter()
            .map(|r| r.observation.return_lead)
            .collect();

        Ok(Some(PeriodReturn {
            month: self.month,
            strategy_return: leg_mean(&extremes.top) - leg_mean(&extremes.bottom),
            market_return: stats::mean(&all),
        }))
    }
}

/// Appends the month's long-short row, or counts it as skipped.
pub(crate) fn record_month(
    rows: &[Observation],
    scores: &[f64],
    quantile: f64,
    result: &mut BacktestResult,
) -> Result<()> {
    let Some(first) = rows.first() else {
        result.skipped += 1;
        return Ok(());
    };
    let snapshot = MonthlySnapshot::new(first.month, rows, scores)?;
    match snapshot.long_short(quantile)? {
        Some(period) => result.rows.push(period),
        None => {
            tracing::debug!(month = %first.month, rows = rows.len(), "no finite scores to rank");
            result.skipped += 1;
        }
    }
    Ok(())
}
