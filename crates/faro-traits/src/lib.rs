#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/faro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// The version of the faro-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod model;
pub mod stats;
pub mod types;

pub use error::{FaroError, Result};
pub use model::{Model, check_training_data};
pub use types::{Feature, FeatureVector, Month, Observation, SecurityId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
