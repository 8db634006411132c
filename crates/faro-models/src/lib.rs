//! Models for faro.
//!
//! - [`LinearRegression`]: OLS with intercept, used by the volatility strategy
//! - [`RandomForestClassifier`]: bagged CART trees, used by the ML strategy
//! - [`diagnostics`]: confusion matrix and classification report
//!
//! Both models implement [`faro_traits::Model`], so backtesters accept either
//! (or any other implementation) as the scoring model.

pub mod diagnostics;
pub mod forest;
pub mod linear;
mod tree;

pub use diagnostics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use forest::{ForestConfig, RandomForestClassifier};
pub use linear::{LinearFit, LinearRegression};
pub use tree::{DecisionTree, TreeConfig};
