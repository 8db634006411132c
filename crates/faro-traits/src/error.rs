//! Error types for the faro workspace.
//!
//! Every crate in the workspace returns [`FaroError`]. The variants follow the
//! failure classes of the pipeline: integrity problems in the source tables are
//! fatal, empty partitions are recoverable inside the backtesters, and missing
//! columns are reported as soon as a table is loaded.

use thiserror::Error;

/// The main error type for faro operations.
#[derive(Debug, Error)]
pub enum FaroError {
    /// Source data violates an integrity rule (duplicate join keys, malformed dates).
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// A train or test partition contained no usable rows.
    #[error("Empty partition: {0}")]
    EmptyPartition(String),

    /// A required column is absent from an input table.
    #[error("Missing required feature: {0}")]
    MissingFeature(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Model fitting or prediction failed.
    #[error("Model error: {0}")]
    Model(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for FaroError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for FaroError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for faro operations.
pub type Result<T> = std::result::Result<T, FaroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FaroError::DataIntegrity("duplicate (10001, 1990-01)".to_string());
        assert_eq!(
            err.to_string(),
            "Data integrity violation: duplicate (10001, 1990-01)"
        );

        let err = FaroError::MissingFeature("RET".to_string());
        assert_eq!(err.to_string(), "Missing required feature: RET");
    }

    #[test]
    fn test_error_from_str() {
        let err: FaroError = "boom".into();
        assert!(matches!(err, FaroError::Other(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: FaroError = io.into();
        assert!(matches!(err, FaroError::Io(_)));
    }
}
