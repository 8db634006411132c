//! Preprocess command implementation.

use anyhow::{Context, Result};
use faro_data::{DailyReturns, PreprocessConfig, Preprocessor, write_csv};
use std::path::Path;

/// Default output file names.
pub(crate) const VOLATILITY_FILE: &str = "idiosyncratic_volatility.csv";
pub(crate) const RETURNS_FILE: &str = "monthly_returns.csv";

/// Turn a daily `PERMNO, DATE, RET` file into the two monthly tables.
pub(crate) fn run_preprocess(input: &Path, out_dir: &Path, config: PreprocessConfig) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Preprocessing                            ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Input:    {}", input.display());
    println!("Window:   {} rows", config.volatility_window);
    println!();

    let daily = DailyReturns::from_csv(input)
        .with_context(|| format!("loading {}", input.display()))?;
    println!("Loaded {} daily rows", daily.len());

    let (volatility, returns) = Preprocessor::new(config).run(&daily)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let vol_path = out_dir.join(VOLATILITY_FILE);
    let ret_path = out_dir.join(RETURNS_FILE);
    write_csv(&mut volatility.to_frame()?, &vol_path)?;
    write_csv(&mut returns.to_frame()?, &ret_path)?;

    let with_vol = volatility
        .records()
        .iter()
        .filter(|r| r.idiosyncratic_volatility.is_some())
        .count();
    println!(
        "Wrote {} monthly rows ({} with volatility)",
        returns.len(),
        with_vol
    );
    println!("  {}", vol_path.display());
    println!("  {}", ret_path.display());
    println!();

    Ok(())
}
