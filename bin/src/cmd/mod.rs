//! CLI subcommand modules.
//!
//! This module contains the implementations for all faro CLI subcommands.

pub(crate) mod backtest;
pub(crate) mod compare;
pub(crate) mod preprocess;

use clap::ValueEnum;
use serde::Serialize;

/// Which model ranks the cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Strategy {
    /// Random-forest direction classifier on volatility and lagged return
    Ml,
    /// Rolling linear regression on idiosyncratic volatility
    Vol,
}

impl Strategy {
    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::Ml => "ML strategy",
            Self::Vol => "Vol strategy",
        }
    }

    pub(crate) const fn file_stem(self) -> &'static str {
        match self {
            Self::Ml => "ml",
            Self::Vol => "vol",
        }
    }
}

/// Stdout format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Classifier training mode as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeArg {
    /// Single fit on a random 80/20 split
    Legacy,
    /// Rolling refit scored out of sample
    WalkForward,
}

impl From<ModeArg> for faro_eval::ClassifierMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Legacy => Self::Legacy,
            ModeArg::WalkForward => Self::WalkForward,
        }
    }
}
