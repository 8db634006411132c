//! Data loading utilities for the faro CLI.

use anyhow::{Context, Result};
use faro_data::{Panel, PanelBuilder, ReturnTable, VolatilityTable, write_csv};
use faro_eval::PerformanceReport;
use faro_traits::{Feature, Month};
use std::path::Path;

/// Load the monthly tables and build a panel that requires `features`.
pub(crate) fn load_panel(volatility: &Path, returns: &Path, features: &[Feature]) -> Result<Panel> {
    let vol = VolatilityTable::from_csv(volatility)
        .with_context(|| format!("loading {}", volatility.display()))?;
    let ret = ReturnTable::from_csv(returns)
        .with_context(|| format!("loading {}", returns.display()))?;

    println!(
        "Loaded {} volatility rows and {} return rows",
        vol.len(),
        ret.len()
    );

    let panel = PanelBuilder::requiring(features).build(&vol, &ret)?;
    println!(
        "Panel: {} observations over {} months",
        panel.len(),
        panel.months().len()
    );
    Ok(panel)
}

/// Parse a `YYYY-MM` (or `YYYY-MM-DD`) month argument.
pub(crate) fn parse_month(raw: &str) -> Result<Month> {
    Month::parse(raw).with_context(|| format!("invalid month '{raw}'"))
}

/// Write the compounded backtest table as CSV.
pub(crate) fn write_report(report: &PerformanceReport, path: &Path) -> Result<()> {
    let mut df = report.to_frame()?;
    write_csv(&mut df, path).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = df.height(), "wrote backtest results");
    Ok(())
}
