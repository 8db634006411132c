//! Run configuration loaded from `--config`.

use anyhow::{Context, Result};
use faro_data::PreprocessConfig;
use faro_eval::{ClassificationConfig, PerformanceConfig, RegressionConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every tunable of a run. Missing sections fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FaroConfig {
    pub(crate) preprocess: PreprocessConfig,
    pub(crate) classification: ClassificationConfig,
    pub(crate) regression: RegressionConfig,
    pub(crate) performance: PerformanceConfig,
}

impl FaroConfig {
    /// Reads a JSON config file, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
