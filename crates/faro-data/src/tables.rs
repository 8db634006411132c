//! Monthly source tables and CSV I/O.
//!
//! Two tables feed the panel: per-(security, month) idiosyncratic volatility
//! and per-(security, month) returns. Both are read from CSV through polars
//! and converted into typed records; unknown columns are ignored.

use faro_traits::{FaroError, Month, Result, SecurityId};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Security identifier column.
pub const PERMNO: &str = "PERMNO";
/// Monthly period column.
pub const MONTH: &str = "Month";
/// Return column.
pub const RET: &str = "RET";
/// Rolling volatility column.
pub const IDIOSYNCRATIC_VOLATILITY: &str = "Idiosyncratic Volatility";

/// Reads a CSV file with a header row into a DataFrame.
///
/// The whole file is scanned for schema inference so a column that only
/// turns non-numeric late in the file is read as text instead of failing.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    // Surface a plain I/O error for missing files.
    File::open(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Writes a DataFrame to CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| FaroError::MissingFeature(name.to_string()))
}

/// Integer column; every value must be present.
pub(crate) fn id_column(df: &DataFrame, name: &str) -> Result<Vec<SecurityId>> {
    let series = require_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    series
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| FaroError::DataIntegrity(format!("row {row}: missing {name}")))
        })
        .collect()
}

/// Numeric column; values that do not parse as numbers become `None`.
pub(crate) fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = require_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Text column; every value must be present.
pub(crate) fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = require_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(str::to_string)
                .ok_or_else(|| FaroError::DataIntegrity(format!("row {row}: missing {name}")))
        })
        .collect()
}

fn month_column(df: &DataFrame) -> Result<Vec<Month>> {
    text_column(df, MONTH)?
        .iter()
        .map(|raw| Month::parse(raw))
        .collect()
}

/// One row of the volatility table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityRecord {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Month of the row.
    pub month: Month,
    /// Rolling volatility carried onto the month, if defined.
    pub idiosyncratic_volatility: Option<f64>,
}

/// Volatility per (security, month).
#[derive(Debug, Clone, Default)]
pub struct VolatilityTable {
    records: Vec<VolatilityRecord>,
}

impl VolatilityTable {
    /// Wraps already-typed records.
    pub const fn new(records: Vec<VolatilityRecord>) -> Self {
        Self { records }
    }

    /// Loads the table from a CSV file.
    pub fn from_csv(path: &Path) -> Result<Self> {
        Self::from_frame(&read_csv(path)?)
    }

    /// Extracts records from a DataFrame with `PERMNO`, `Month` and
    /// `Idiosyncratic Volatility` columns.
    ///
    /// # Errors
    ///
    /// `MissingFeature` if a column is absent, `DataIntegrity` if an
    /// identifier or month is missing or malformed.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let ids = id_column(df, PERMNO)?;
        let months = month_column(df)?;
        let vols = numeric_column(df, IDIOSYNCRATIC_VOLATILITY)?;

        let records = ids
            .into_iter()
            .zip(months)
            .zip(vols)
            .map(|((security_id, month), idiosyncratic_volatility)| VolatilityRecord {
                security_id,
                month,
                idiosyncratic_volatility,
            })
            .collect();
        Ok(Self { records })
    }

    /// Converts the table back into a DataFrame.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let ids: Vec<i64> = self.records.iter().map(|r| r.security_id).collect();
        let months: Vec<String> = self.records.iter().map(|r| r.month.to_string()).collect();
        let vols: Vec<Option<f64>> = self
            .records
            .iter()
            .map(|r| r.idiosyncratic_volatility)
            .collect();
        Ok(df! {
            PERMNO => ids,
            MONTH => months,
            IDIOSYNCRATIC_VOLATILITY => vols,
        }?)
    }

    /// Records in file order.
    pub fn records(&self) -> &[VolatilityRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One row of the return table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Month of the row.
    pub month: Month,
    /// Monthly return; `None` when the source value was not numeric.
    pub monthly_return: Option<f64>,
}

/// Return per (security, month).
#[derive(Debug, Clone, Default)]
pub struct ReturnTable {
    records: Vec<ReturnRecord>,
}

impl ReturnTable {
    /// Wraps already-typed records.
    pub const fn new(records: Vec<ReturnRecord>) -> Self {
        Self { records }
    }

    /// Loads the table from a CSV file.
    pub fn from_csv(path: &Path) -> Result<Self> {
        Self::from_frame(&read_csv(path)?)
    }

    /// Extracts records from a DataFrame with `PERMNO`, `Month` and `RET`
    /// columns. Non-numeric `RET` values become missing returns.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let ids = id_column(df, PERMNO)?;
        let months = month_column(df)?;
        let rets = numeric_column(df, RET)?;

        let records = ids
            .into_iter()
            .zip(months)
            .zip(rets)
            .map(|((security_id, month), monthly_return)| ReturnRecord {
                security_id,
                month,
                monthly_return,
            })
            .collect();
        Ok(Self { records })
    }

    /// Converts the table back into a DataFrame.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let ids: Vec<i64> = self.records.iter().map(|r| r.security_id).collect();
        let months: Vec<String> = self.records.iter().map(|r| r.month.to_string()).collect();
        let rets: Vec<Option<f64>> = self.records.iter().map(|r| r.monthly_return).collect();
        Ok(df! {
            PERMNO => ids,
            MONTH => months,
            RET => rets,
        }?)
    }

    /// Records in file order.
    pub fn records(&self) -> &[ReturnRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
