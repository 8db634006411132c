//! Data layer for faro.
//!
//! - [`tables`]: monthly volatility and return tables, CSV I/O
//! - [`preprocess`]: daily returns to monthly tables
//! - [`panel`]: the joined, feature-complete [`Panel`]
//!
//! # Example
//!
//! ```rust,ignore
//! use faro_data::{PanelBuilder, ReturnTable, VolatilityTable};
//!
//! let vol = VolatilityTable::from_csv("idiosyncratic_volatility.csv".as_ref())?;
//! let ret = ReturnTable::from_csv("monthly_returns.csv".as_ref())?;
//! let panel = PanelBuilder::default().build(&vol, &ret)?;
//! ```

pub mod panel;
pub mod preprocess;
pub mod tables;

pub use panel::{Panel, PanelBuilder, PanelConfig};
pub use preprocess::{DailyRecord, DailyReturns, PreprocessConfig, Preprocessor};
pub use tables::{
    ReturnRecord, ReturnTable, VolatilityRecord, VolatilityTable, read_csv, write_csv,
};
