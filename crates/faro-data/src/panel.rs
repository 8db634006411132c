//! Panel construction.
//!
//! The [`PanelBuilder`] inner-joins the volatility and return tables on
//! (security, month), derives the lead/lag return features per security and
//! keeps only complete rows. The resulting [`Panel`] is immutable and is
//! passed by reference into the backtesters.

use crate::tables::{
    IDIOSYNCRATIC_VOLATILITY, MONTH, PERMNO, RET, ReturnTable, VolatilityTable,
};
use faro_traits::{FaroError, Feature, FeatureVector, Month, Observation, Result, SecurityId};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;

/// Panel builder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Features a row must carry to be kept. `return_lead` is always required.
    pub required_features: Vec<Feature>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            required_features: Feature::ALL.to_vec(),
        }
    }
}

/// Joins the monthly source tables into a [`Panel`].
#[derive(Debug, Clone, Default)]
pub struct PanelBuilder {
    config: PanelConfig,
}

#[derive(Debug, Clone, Copy)]
struct JoinedRow {
    month: Month,
    monthly_return: Option<f64>,
    idiosyncratic_volatility: Option<f64>,
}

impl PanelBuilder {
    /// Creates a builder.
    pub const fn new(config: PanelConfig) -> Self {
        Self { config }
    }

    /// Builder that only drops rows missing the given features.
    pub fn requiring(features: &[Feature]) -> Self {
        Self::new(PanelConfig {
            required_features: features.to_vec(),
        })
    }

    /// Builds the panel.
    ///
    /// # Errors
    ///
    /// `DataIntegrity` if a (security, month) pair occurs more than once in
    /// either table. No partial panel is returned.
    pub fn build(&self, volatility: &VolatilityTable, returns: &ReturnTable) -> Result<Panel> {
        ensure_unique(
            "volatility",
            volatility.records().iter().map(|r| (r.security_id, r.month)),
        )?;
        ensure_unique(
            "returns",
            returns.records().iter().map(|r| (r.security_id, r.month)),
        )?;

        let return_lookup: HashMap<(SecurityId, Month), Option<f64>> = returns
            .records()
            .iter()
            .map(|r| ((r.security_id, r.month), r.monthly_return))
            .collect();

        let mut by_security: BTreeMap<SecurityId, Vec<JoinedRow>> = BTreeMap::new();
        let mut joined = 0usize;
        for record in volatility.records() {
            if let Some(&monthly_return) = return_lookup.get(&(record.security_id, record.month)) {
                by_security
                    .entry(record.security_id)
                    .or_default()
                    .push(JoinedRow {
                        month: record.month,
                        monthly_return,
                        idiosyncratic_volatility: record.idiosyncratic_volatility,
                    });
                joined += 1;
            }
        }

        let mut observations = Vec::with_capacity(joined);
        for (security_id, mut rows) in by_security {
            rows.sort_by_key(|r| r.month);
            for (idx, row) in rows.iter().enumerate() {
                let Some(return_lead) = rows.get(idx + 1).and_then(|next| next.monthly_return)
                else {
                    continue;
                };
                let lag_2_return = idx
                    .checked_sub(2)
                    .and_then(|prev| rows[prev].monthly_return);

                let features = FeatureVector {
                    idiosyncratic_volatility: row.idiosyncratic_volatility,
                    lag_2_return,
                };
                if features.select(&self.config.required_features).is_none() {
                    continue;
                }

                observations.push(Observation {
                    security_id,
                    month: row.month,
                    monthly_return: row.monthly_return,
                    return_lead,
                    features,
                });
            }
        }

        tracing::info!(
            volatility_rows = volatility.len(),
            return_rows = returns.len(),
            joined_rows = joined,
            complete_rows = observations.len(),
            "built panel"
        );

        Panel::from_observations(observations)
    }
}

fn ensure_unique(
    table: &str,
    keys: impl Iterator<Item = (SecurityId, Month)>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for (security_id, month) in keys {
        if !seen.insert((security_id, month)) {
            return Err(FaroError::DataIntegrity(format!(
                "duplicate key (PERMNO {security_id}, {month}) in {table} table"
            )));
        }
    }
    Ok(())
}

/// Immutable, month-ordered collection of complete observations.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    observations: Vec<Observation>,
    months: Vec<(Month, Range<usize>)>,
}

impl Panel {
    /// Creates a panel from observations.
    ///
    /// Rows are ordered by (month, security).
    ///
    /// # Errors
    ///
    /// `DataIntegrity` if a (security, month) pair appears twice.
    pub fn from_observations(mut observations: Vec<Observation>) -> Result<Self> {
        ensure_unique(
            "panel",
            observations.iter().map(|o| (o.security_id, o.month)),
        )?;
        observations.sort_by_key(|o| (o.month, o.security_id));

        let mut months: Vec<(Month, Range<usize>)> = Vec::new();
        for (idx, obs) in observations.iter().enumerate() {
            match months.last_mut() {
                Some((month, range)) if *month == obs.month => range.end = idx + 1,
                _ => months.push((obs.month, idx..idx + 1)),
            }
        }

        Ok(Self {
            observations,
            months,
        })
    }

    /// All observations, ordered by (month, security).
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the panel is empty.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Sorted distinct months.
    pub fn months(&self) -> Vec<Month> {
        self.months.iter().map(|(m, _)| *m).collect()
    }

    /// Observations for one month (empty if the month is absent).
    pub fn month(&self, month: Month) -> &[Observation] {
        self.months
            .binary_search_by_key(&month, |(m, _)| *m)
            .map(|pos| &self.observations[self.months[pos].1.clone()])
            .unwrap_or(&[])
    }

    /// Iterates over (month, observations) in calendar order.
    pub fn iter_months(&self) -> impl Iterator<Item = (Month, &[Observation])> + '_ {
        self.months
            .iter()
            .map(|(m, range)| (*m, &self.observations[range.clone()]))
    }

    /// Observations whose month lies in the half-open index range of
    /// [`Panel::months`].
    pub fn months_slice(&self, months: Range<usize>) -> &[Observation] {
        let Some(first) = self.months.get(months.start) else {
            return &[];
        };
        let last_idx = months.end.min(self.months.len());
        if last_idx <= months.start {
            return &[];
        }
        let last = &self.months[last_idx - 1];
        &self.observations[first.1.start..last.1.end]
    }

    /// The panel as a DataFrame with the source column names plus
    /// `RET_lead` and `LAG_2`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let obs = &self.observations;
        let ids: Vec<i64> = obs.iter().map(|o| o.security_id).collect();
        let months: Vec<String> = obs.iter().map(|o| o.month.to_string()).collect();
        let rets: Vec<Option<f64>> = obs.iter().map(|o| o.monthly_return).collect();
        let leads: Vec<f64> = obs.iter().map(|o| o.return_lead).collect();
        let vols: Vec<Option<f64>> = obs
            .iter()
            .map(|o| o.features.idiosyncratic_volatility)
            .collect();
        let lags: Vec<Option<f64>> = obs.iter().map(|o| o.features.lag_2_return).collect();

        Ok(df! {
            PERMNO => ids,
            MONTH => months,
            RET => rets,
            "RET_lead" => leads,
            IDIOSYNCRATIC_VOLATILITY => vols,
            Feature::Lag2Return.column_name() => lags,
        }?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{ReturnRecord, VolatilityRecord};

    fn m(month: u32) -> Month {
        Month::new(1990, month).unwrap()
    }

    fn tables(rows: &[(SecurityId, u32, f64, f64)]) -> (VolatilityTable, ReturnTable) {
        let vol = rows
            .iter()
            .map(|&(id, month, vol, _)| VolatilityRecord {
                security_id: id,
                month: m(month),
                idiosyncratic_volatility: Some(vol),
            })
            .collect();
        let ret = rows
            .iter()
            .map(|&(id, month, _, ret)| ReturnRecord {
                security_id: id,
                month: m(month),
                monthly_return: Some(ret),
            })
            .collect();
        (VolatilityTable::new(vol), ReturnTable::new(ret))
    }

    #[test]
    fn test_three_securities_four_months() {
        // Security 3 only has two months and contributes nothing.
        let (vol, ret) = tables(&[
            (1, 1, 0.10, 0.01),
            (1, 2, 0.11, 0.02),
            (1, 3, 0.12, 0.03),
            (1, 4, 0.13, 0.04),
            (2, 1, 0.20, -0.01),
            (2, 2, 0.21, -0.02),
            (2, 3, 0.22, -0.03),
            (2, 4, 0.23, -0.04),
            (3, 1, 0.30, 0.05),
            (3, 2, 0.31, 0.06),
        ]);

        let panel = PanelBuilder::default().build(&vol, &ret).unwrap();

        // Only month 3 has both a two-month lag and a lead.
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.months(), vec![m(3)]);

        let first = &panel.observations()[0];
        assert_eq!(first.security_id, 1);
        assert_eq!(first.return_lead, 0.04);
        assert_eq!(first.features.lag_2_return, Some(0.01));
        assert_eq!(first.features.idiosyncratic_volatility, Some(0.12));

        let second = &panel.observations()[1];
        assert_eq!(second.security_id, 2);
        assert_eq!(second.return_lead, -0.04);
        assert_eq!(second.features.lag_2_return, Some(-0.01));

        assert!(panel.observations().iter().all(|o| o.security_id != 3));
    }

    #[test]
    fn test_lead_matches_next_return() {
        let (vol, ret) = tables(&[
            (1, 1, 0.1, 0.01),
            (1, 2, 0.1, 0.02),
            (1, 3, 0.1, 0.03),
            (1, 4, 0.1, 0.04),
            (1, 5, 0.1, 0.05),
        ]);
        let panel = PanelBuilder::default().build(&vol, &ret).unwrap();
        for obs in panel.observations() {
            let next = ret
                .records()
                .iter()
                .find(|r| r.month > obs.month)
                .and_then(|r| r.monthly_return);
            assert_eq!(Some(obs.return_lead), next);
        }
        assert_eq!(panel.len(), 2);
    }

    #[test]
    fn test_requiring_subset_keeps_more_rows() {
        let (vol, ret) = tables(&[
            (1, 1, 0.1, 0.01),
            (1, 2, 0.1, 0.02),
            (1, 3, 0.1, 0.03),
        ]);
        let full = PanelBuilder::default().build(&vol, &ret).unwrap();
        let vol_only = PanelBuilder::requiring(&[Feature::IdiosyncraticVolatility])
            .build(&vol, &ret)
            .unwrap();
        assert_eq!(full.len(), 0);
        assert_eq!(vol_only.len(), 2);
        assert_eq!(vol_only.observations()[0].features.lag_2_return, None);
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let (vol, mut ret) = tables(&[
            (1, 1, 0.1, 0.01),
            (1, 2, 0.1, 0.02),
            (1, 3, 0.1, 0.03),
            (1, 4, 0.1, 0.04),
        ]);
        // Returns for a security with no volatility rows are ignored.
        let mut extra = ret.records().to_vec();
        extra.push(ReturnRecord {
            security_id: 9,
            month: m(1),
            monthly_return: Some(0.5),
        });
        ret = ReturnTable::new(extra);

        let panel = PanelBuilder::default().build(&vol, &ret).unwrap();
        assert_eq!(panel.len(), 1);
        assert_eq!(panel.observations()[0].security_id, 1);
    }

    #[test]
    fn test_duplicate_keys_fail() {
        let (vol, ret) = tables(&[(1, 1, 0.1, 0.01), (1, 1, 0.2, 0.02)]);
        let err = PanelBuilder::default().build(&vol, &ret).unwrap_err();
        assert!(matches!(err, FaroError::DataIntegrity(_)));
    }

    #[test]
    fn test_missing_return_breaks_shifts() {
        let vol = VolatilityTable::new(
            (1..=4)
                .map(|month| VolatilityRecord {
                    security_id: 1,
                    month: m(month),
                    idiosyncratic_volatility: Some(0.1),
                })
                .collect(),
        );
        let ret = ReturnTable::new(vec![
            ReturnRecord { security_id: 1, month: m(1), monthly_return: None },
            ReturnRecord { security_id: 1, month: m(2), monthly_return: Some(0.02) },
            ReturnRecord { security_id: 1, month: m(3), monthly_return: Some(0.03) },
            ReturnRecord { security_id: 1, month: m(4), monthly_return: Some(0.04) },
        ]);
        // Month 3 would need the return of month 1 as its lag.
        let panel = PanelBuilder::default().build(&vol, &ret).unwrap();
        assert!(panel.is_empty());
    }

    #[test]
    fn test_month_access() {
        let obs = |id, month| Observation {
            security_id: id,
            month: m(month),
            monthly_return: Some(0.0),
            return_lead: 0.01,
            features: FeatureVector::default(),
        };
        let panel =
            Panel::from_observations(vec![obs(2, 2), obs(1, 1), obs(1, 2), obs(3, 4)]).unwrap();

        assert_eq!(panel.months(), vec![m(1), m(2), m(4)]);
        assert_eq!(panel.month(m(2)).len(), 2);
        assert_eq!(panel.month(m(2))[0].security_id, 1);
        assert!(panel.month(m(3)).is_empty());
        assert_eq!(panel.months_slice(0..2).len(), 3);
        assert_eq!(panel.months_slice(2..10).len(), 1);
        assert!(panel.months_slice(5..7).is_empty());
        assert_eq!(panel.iter_months().count(), 3);

        let err = Panel::from_observations(vec![obs(1, 1), obs(1, 1)]).unwrap_err();
        assert!(matches!(err, FaroError::DataIntegrity(_)));
    }

    #[test]
    fn test_to_frame() {
        let (vol, ret) = tables(&[
            (1, 1, 0.1, 0.01),
            (1, 2, 0.1, 0.02),
            (1, 3, 0.1, 0.03),
            (1, 4, 0.1, 0.04),
        ]);
        let panel = PanelBuilder::default().build(&vol, &ret).unwrap();
        let df = panel.to_frame().unwrap();
        assert_eq!(df.height(), 1);
        assert!(df.column("RET_lead").is_ok());
        assert!(df.column("LAG_2").is_ok());
    }
}
