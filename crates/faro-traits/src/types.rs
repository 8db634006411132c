//! Common types used throughout faro.
//!
//! A panel is a collection of [`Observation`]s, one per (security, month)
//! pair. Months are represented by the [`Month`] newtype so calendar periods
//! can never be confused with daily dates.

use crate::{FaroError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Security identifier (CRSP `PERMNO`).
pub type SecurityId = i64;

/// A calendar month.
///
/// Internally stored as the first day of the month so ordering and hashing
/// follow the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month(NaiveDate);

impl Month {
    /// Creates a month from a year and a 1-based month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Truncates a date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Parses `YYYY-MM`, `YYYY-MM-DD` or a timestamp starting with `YYYY-MM-DD`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let parsed = match trimmed.get(..10) {
            Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d"),
            None => NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d"),
        };
        parsed
            .map(Self::from_date)
            .map_err(|e| FaroError::DataIntegrity(format!("malformed month '{raw}': {e}")))
    }

    /// First calendar day of the month.
    pub const fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month number, 1-based.
    pub fn month(&self) -> u32 {
        self.0.month()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = FaroError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Month {
    type Error = FaroError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}

/// Model input features available on an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Rolling standard deviation of daily returns.
    IdiosyncraticVolatility,
    /// Monthly return two rows earlier for the same security.
    Lag2Return,
}

impl Feature {
    /// Both features, in model column order.
    pub const ALL: [Self; 2] = [Self::IdiosyncraticVolatility, Self::Lag2Return];

    /// Column label used in input files and reports.
    pub const fn column_name(&self) -> &'static str {
        match self {
            Self::IdiosyncraticVolatility => "Idiosyncratic Volatility",
            Self::Lag2Return => "LAG_2",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// The two model inputs attached to an observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Rolling volatility carried onto the monthly row.
    pub idiosyncratic_volatility: Option<f64>,
    /// Return two months prior.
    pub lag_2_return: Option<f64>,
}

impl FeatureVector {
    /// Value of a single feature, if defined.
    pub const fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::IdiosyncraticVolatility => self.idiosyncratic_volatility,
            Feature::Lag2Return => self.lag_2_return,
        }
    }

    /// Values for the requested features in order, or `None` if any is missing.
    pub fn select(&self, features: &[Feature]) -> Option<Vec<f64>> {
        features.iter().map(|&f| self.get(f)).collect()
    }
}

/// One (security, month) row of the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Calendar month of the row.
    pub month: Month,
    /// Realised return for the month.
    pub monthly_return: Option<f64>,
    /// Next row's return for the same security; the prediction target.
    pub return_lead: f64,
    /// Model inputs.
    pub features: FeatureVector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_parse_formats() {
        let expected = Month::new(1990, 3).unwrap();
        assert_eq!(Month::parse("1990-03").unwrap(), expected);
        assert_eq!(Month::parse("1990-03-31").unwrap(), expected);
        assert_eq!(Month::parse("1990-03-15 00:00:00").unwrap(), expected);
        assert_eq!(Month::parse(" 1990-03 ").unwrap(), expected);
    }

    #[test]
    fn test_month_parse_invalid() {
        let err = Month::parse("March 1990").unwrap_err();
        assert!(matches!(err, FaroError::DataIntegrity(_)));
        assert!(Month::parse("1990-13").is_err());
    }

    #[test]
    fn test_month_ordering_and_display() {
        let a = Month::new(1989, 12).unwrap();
        let b = Month::new(1990, 1).unwrap();
        assert!(a < b);
        assert_eq!(a.to_string(), "1989-12");
        assert_eq!(b.first_day(), NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
    }

    #[test]
    fn test_month_serde_as_string() {
        let month = Month::new(2001, 7).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, "\"2001-07\"");
        let back: Month = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
    }

    #[test]
    fn test_feature_vector_select() {
        let fv = FeatureVector {
            idiosyncratic_volatility: Some(0.02),
            lag_2_return: None,
        };
        assert_eq!(fv.select(&[Feature::IdiosyncraticVolatility]), Some(vec![0.02]));
        assert_eq!(fv.select(&Feature::ALL), None);
    }

    #[test]
    fn test_feature_column_names() {
        assert_eq!(
            Feature::IdiosyncraticVolatility.column_name(),
            "Idiosyncratic Volatility"
        );
        assert_eq!(Feature::Lag2Return.to_string(), "LAG_2");
    }
}
