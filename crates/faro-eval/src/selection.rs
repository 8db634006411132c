//! Ranking and long/short extreme selection.
//!
//! Within one month, securities are ranked by score (1 = highest), tied scores
//! sharing the average of the ranks they span. The long leg takes every rank
//! at or below the `fraction` quantile of those ranks and the short leg every
//! rank at or above the `1 - fraction` quantile, so a tie straddling a cut
//! lands wholly inside the leg.

use faro_traits::{FaroError, Result, stats};
use serde::{Deserialize, Serialize};

const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Indices (into the scored slice) of the long and short legs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extremes {
    /// Highest-scored positions, best first.
    pub top: Vec<usize>,
    /// Lowest-scored positions, best first.
    pub bottom: Vec<usize>,
}

impl Extremes {
    /// Both legs hold at least one position.
    pub fn is_tradable(&self) -> bool {
        !self.top.is_empty() && !self.bottom.is_empty()
    }
}

fn descending_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (scores[a], scores[b]);
        match (sa.is_finite(), sb.is_finite()) {
            (true, true) => sb.total_cmp(&sa),
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (false, false) => std::cmp::Ordering::Equal,
        }
    });
    order
}

/// Ordinal ranks by score, descending and 1-based.
///
/// Ties keep their input order. Non-finite scores rank after every finite
/// score.
///
/// # Examples
///
/// ```
/// use faro_eval::rank_descending;
///
/// assert_eq!(rank_descending(&[0.1, 0.9, f64::NAN, 0.5]), vec![3, 1, 4, 2]);
/// ```
pub fn rank_descending(scores: &[f64]) -> Vec<usize> {
    let mut ranks = vec![0; scores.len()];
    for (position, idx) in descending_order(scores).into_iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}

/// Average ranks by score, descending and 1-based.
///
/// Equal scores share the mean of the ranks they occupy. Non-finite scores
/// have no rank.
///
/// # Examples
///
/// ```
/// use faro_eval::average_ranks;
///
/// assert_eq!(
///     average_ranks(&[0.9, 0.9, f64::NAN, 0.4]),
///     vec![Some(1.5), Some(1.5), None, Some(3.0)]
/// );
/// ```
pub fn average_ranks(scores: &[f64]) -> Vec<Option<f64>> {
    let order: Vec<usize> = descending_order(scores)
        .into_iter()
        .filter(|&i| scores[i].is_finite())
        .collect();

    let mut ranks = vec![None; scores.len()];
    let mut start = 0;
    for block in order.chunk_by(|&a, &b| scores[a] == scores[b]) {
        let end = start + block.len();
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in block {
            ranks[idx] = Some(rank);
        }
        start = end;
    }
    ranks
}

/// Splits scored positions into the long (top) and short (bottom) legs.
///
/// Cuts are the linear-interpolated `fraction` and `1 - fraction` quantiles
/// of the average ranks; ties at a cut are included. A position qualifying
/// for both legs stays long. If that leaves the short leg empty (a single
/// observation, or a cut inside the lowest tie block), the short leg is the
/// set of positions that qualified for it, so the legs overlap. Non-finite
/// scores are never selected.
///
/// # Errors
///
/// `InvalidConfig` if `fraction` is outside `(0, 0.5]`.
pub fn select_extremes(scores: &[f64], fraction: f64) -> Result<Extremes> {
    if !(fraction > 0.0 && fraction <= 0.5) {
        return Err(FaroError::InvalidConfig(format!(
            "selection fraction must lie in (0, 0.5], got {fraction}"
        )));
    }

    let ranks = average_ranks(scores);
    let ranked: Vec<f64> = ranks.iter().flatten().copied().collect();
    if ranked.is_empty() {
        return Ok(Extremes::default());
    }
    let top_cut = stats::quantile(&ranked, fraction) + BOUNDARY_TOLERANCE;
    let bottom_cut = stats::quantile(&ranked, 1.0 - fraction) - BOUNDARY_TOLERANCE;

    let mut by_rank: Vec<(f64, usize)> = ranks
        .into_iter()
        .enumerate()
        .filter_map(|(idx, rank)| rank.map(|r| (r, idx)))
        .collect();
    by_rank.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut extremes = Extremes::default();
    let mut absorbed = Vec::new();
    for (rank, idx) in by_rank {
        let short = rank >= bottom_cut;
        if rank <= top_cut {
            extremes.top.push(idx);
            if short {
                absorbed.push(idx);
            }
        } else if short {
            extremes.bottom.push(idx);
        }
    }
    if extremes.bottom.is_empty() {
        extremes.bottom = absorbed;
    }
    Ok(extremes)
}
