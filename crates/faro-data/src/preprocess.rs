//! Daily-to-monthly preprocessing.
//!
//! Turns a CRSP `dsf`-style daily file (`PERMNO`, `DATE`, `RET`) into the two
//! monthly tables consumed by the panel builder:
//!
//! - idiosyncratic volatility: rolling sample standard deviation of daily
//!   returns over the last `volatility_window` rows of each security, taking
//!   the last defined value inside each month;
//! - monthly return: mean of the finite daily returns in the month.

use crate::tables::{
    PERMNO, RET, ReturnRecord, ReturnTable, VolatilityRecord, VolatilityTable, id_column,
    numeric_column, read_csv, text_column,
};
use chrono::NaiveDate;
use faro_traits::{FaroError, Month, Result, SecurityId, stats};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Daily date column (`YYYYMMDD`).
pub const DATE: &str = "DATE";

/// Preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Number of daily rows in the rolling volatility window.
    pub volatility_window: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            volatility_window: 30,
        }
    }
}

/// One daily return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Trading date.
    pub date: NaiveDate,
    /// Daily return, `None` when not numeric.
    pub daily_return: Option<f64>,
}

/// Raw daily returns.
#[derive(Debug, Clone, Default)]
pub struct DailyReturns {
    records: Vec<DailyRecord>,
}

impl DailyReturns {
    /// Wraps already-typed records.
    pub const fn new(records: Vec<DailyRecord>) -> Self {
        Self { records }
    }

    /// Loads daily returns from a CSV file.
    pub fn from_csv(path: &Path) -> Result<Self> {
        Self::from_frame(&read_csv(path)?)
    }

    /// Extracts records from a DataFrame with `PERMNO`, `DATE` and `RET`.
    ///
    /// # Errors
    ///
    /// `DataIntegrity` when a `DATE` is not a valid `YYYYMMDD` value.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let ids = id_column(df, PERMNO)?;
        let dates = text_column(df, DATE)?;
        let rets = numeric_column(df, RET)?;

        let records = ids
            .into_iter()
            .zip(dates)
            .zip(rets)
            .map(|((security_id, raw), daily_return)| {
                Ok(DailyRecord {
                    security_id,
                    date: parse_daily_date(&raw)?,
                    daily_return,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// Records in file order.
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn parse_daily_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y%m%d")
        .map_err(|e| FaroError::DataIntegrity(format!("malformed DATE '{raw}': {e}")))
}

/// Builds the monthly volatility and return tables from daily data.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    /// Creates a preprocessor.
    pub const fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Runs the preprocessing.
    ///
    /// Rows are sorted by (security, date) first; rows that share both keep
    /// their file order.
    pub fn run(&self, daily: &DailyReturns) -> Result<(VolatilityTable, ReturnTable)> {
        let window = self.config.volatility_window;
        if window < 2 {
            return Err(FaroError::InvalidConfig(format!(
                "volatility window must be at least 2, got {window}"
            )));
        }

        let mut rows: Vec<&DailyRecord> = daily.records().iter().collect();
        rows.sort_by_key(|r| (r.security_id, r.date));

        let mut volatility = Vec::new();
        let mut returns = Vec::new();

        for security in rows.chunk_by(|a, b| a.security_id == b.security_id) {
            let rolling = rolling_std(security, window);

            let mut start = 0;
            while start < security.len() {
                let month = Month::from_date(security[start].date);
                let end = start
                    + security[start..]
                        .iter()
                        .take_while(|r| Month::from_date(r.date) == month)
                        .count();

                let daily_returns: Vec<f64> = security[start..end]
                    .iter()
                    .filter_map(|r| r.daily_return)
                    .collect();
                let monthly_return = Some(stats::mean(&daily_returns)).filter(|m| m.is_finite());
                let idiosyncratic_volatility =
                    rolling[start..end].iter().rev().find_map(|v| *v);

                let security_id = security[start].security_id;
                volatility.push(VolatilityRecord {
                    security_id,
                    month,
                    idiosyncratic_volatility,
                });
                returns.push(ReturnRecord {
                    security_id,
                    month,
                    monthly_return,
                });
                start = end;
            }
        }

        tracing::info!(
            daily_rows = daily.len(),
            monthly_rows = returns.len(),
            window,
            "preprocessed daily returns"
        );

        Ok((VolatilityTable::new(volatility), ReturnTable::new(returns)))
    }
}

/// Rolling sample standard deviation over the last `window` rows.
///
/// Undefined until the window is full, and whenever a missing return sits
/// inside it.
fn rolling_std(rows: &[&DailyRecord], window: usize) -> Vec<Option<f64>> {
    (0..rows.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let values: Option<Vec<f64>> = rows[i + 1 - window..=i]
                .iter()
                .map(|r| r.daily_return)
                .collect();
            values
                .map(|v| stats::sample_std(&v))
                .filter(|s| s.is_finite())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use polars::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(id: SecurityId, date: NaiveDate, ret: Option<f64>) -> DailyRecord {
        DailyRecord {
            security_id: id,
            date,
            daily_return: ret,
        }
    }

    #[test]
    fn test_from_frame_parses_dates_and_returns() {
        let df = df! {
            "PERMNO" => &[10001i64, 10001],
            "DATE" => &[19900102i64, 19900103],
            "RET" => &["0.01", "B"],
        }
        .unwrap();

        let daily = DailyReturns::from_frame(&df).unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily.records()[0].date, day(1990, 1, 2));
        assert_eq!(daily.records()[1].daily_return, None);
    }

    #[test]
    fn test_malformed_date_fails() {
        let df = df! {
            "PERMNO" => &[10001i64],
            "DATE" => &[19901332i64],
            "RET" => &[0.01],
        }
        .unwrap();

        let err = DailyReturns::from_frame(&df).unwrap_err();
        assert!(matches!(err, FaroError::DataIntegrity(_)));
    }

    #[test]
    fn test_rolling_window_needs_full_history() {
        let rows: Vec<DailyRecord> = (0..5)
            .map(|i| record(1, day(1990, 1, 1 + i), Some(f64::from(i))))
            .collect();
        let refs: Vec<&DailyRecord> = rows.iter().collect();

        let rolling = rolling_std(&refs, 3);
        assert_eq!(rolling[0], None);
        assert_eq!(rolling[1], None);
        // std of [0, 1, 2] with N-1 denominator is 1
        assert_relative_eq!(rolling[2].unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rolling[4].unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_return_blanks_window() {
        let rows = vec![
            record(1, day(1990, 1, 1), Some(0.01)),
            record(1, day(1990, 1, 2), None),
            record(1, day(1990, 1, 3), Some(0.03)),
            record(1, day(1990, 1, 4), Some(0.02)),
        ];
        let refs: Vec<&DailyRecord> = rows.iter().collect();
        let rolling = rolling_std(&refs, 2);
        assert_eq!(rolling[1], None);
        assert_eq!(rolling[2], None);
        assert!(rolling[3].is_some());
    }

    #[test]
    fn test_monthly_aggregation() {
        // Out of order on purpose; two securities, two months.
        let daily = DailyReturns::new(vec![
            record(2, day(1990, 1, 3), Some(0.04)),
            record(1, day(1990, 2, 1), Some(0.02)),
            record(1, day(1990, 1, 2), Some(0.01)),
            record(1, day(1990, 1, 3), Some(0.03)),
            record(1, day(1990, 2, 2), None),
        ]);

        let preprocessor = Preprocessor::new(PreprocessConfig {
            volatility_window: 2,
        });
        let (vol, ret) = preprocessor.run(&daily).unwrap();

        assert_eq!(ret.len(), 3);
        let first = &ret.records()[0];
        assert_eq!(first.security_id, 1);
        assert_eq!(first.month, Month::new(1990, 1).unwrap());
        assert_relative_eq!(first.monthly_return.unwrap(), 0.02, epsilon = 1e-12);

        // February for security 1 only has one numeric return
        assert_relative_eq!(ret.records()[1].monthly_return.unwrap(), 0.02, epsilon = 1e-12);

        // January: window [0.01, 0.03]; February: last window contains a gap,
        // so the value carried onto the month is the one from 1990-02-01.
        let jan = vol.records()[0].idiosyncratic_volatility.unwrap();
        assert_relative_eq!(jan, (0.0002_f64).sqrt(), epsilon = 1e-12);
        let feb = vol.records()[1].idiosyncratic_volatility.unwrap();
        assert_relative_eq!(feb, (0.00005_f64).sqrt(), epsilon = 1e-12);

        // Security 2 has a single day, so no volatility
        assert_eq!(vol.records()[2].idiosyncratic_volatility, None);
    }

    #[test]
    fn test_invalid_window() {
        let preprocessor = Preprocessor::new(PreprocessConfig {
            volatility_window: 1,
        });
        let err = preprocessor.run(&DailyReturns::default()).unwrap_err();
        assert!(matches!(err, FaroError::InvalidConfig(_)));
    }
}
