//! Model capability trait.
//!
//! Backtesters only need two things from a model: fit it on a feature matrix
//! and a target, then score new rows. Anything implementing [`Model`] can be
//! dropped into either backtester.

use crate::{FaroError, Result};
use ndarray::{Array1, Array2};

/// A trainable model that maps feature rows to scores.
///
/// For classifiers the score is the probability of the positive class; for
/// regressors it is the forecast itself. Implementations must be thread-safe
/// (`Send + Sync`) so fitted models can be shared across workers.
///
/// # Example
///
/// ```no_run
/// use faro_traits::{Model, Result};
/// use ndarray::{Array1, Array2};
///
/// struct MeanModel(f64);
///
/// impl Model for MeanModel {
///     fn name(&self) -> &str {
///         "mean"
///     }
///
///     fn fit(&mut self, _features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
///         self.0 = target.mean().unwrap_or(0.0);
///         Ok(())
///     }
///
///     fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
///         Ok(Array1::from_elem(features.nrows(), self.0))
///     }
/// }
/// ```
pub trait Model: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Fits the model, discarding any previous fit.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs are empty, their shapes disagree, or the
    /// estimation itself fails.
    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()>;

    /// Scores each row of `features`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been fitted or the column count
    /// differs from the training data.
    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>>;

    /// Normalised per-feature importances of the last fit, if the model
    /// tracks them.
    fn feature_importances(&self) -> Option<&[f64]> {
        None
    }
}

/// Checks that a training set is non-empty and that rows line up with targets.
pub fn check_training_data(features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
    if features.nrows() == 0 {
        return Err(FaroError::EmptyPartition("no training rows".to_string()));
    }
    if features.ncols() == 0 {
        return Err(FaroError::Model("feature matrix has no columns".to_string()));
    }
    if features.nrows() != target.len() {
        return Err(FaroError::Model(format!(
            "{} feature rows but {} targets",
            features.nrows(),
            target.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct ConstantModel {
        value: Option<f64>,
    }

    impl Model for ConstantModel {
        fn name(&self) -> &str {
            "constant"
        }

        fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
            check_training_data(features, target)?;
            self.value = target.mean();
            Ok(())
        }

        fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
            let value = self
                .value
                .ok_or_else(|| FaroError::Model("not fitted".to_string()))?;
            Ok(Array1::from_elem(features.nrows(), value))
        }
    }

    #[test]
    fn test_model_fit_predict() {
        let mut model = ConstantModel { value: None };
        assert!(model.predict(&array![[1.0]]).is_err());

        model.fit(&array![[1.0], [2.0]], &array![0.1, 0.3]).unwrap();
        let scores = model.predict(&array![[5.0], [6.0], [7.0]]).unwrap();
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 0.2).abs() < 1e-12);
        assert!(model.feature_importances().is_none());
    }

    #[test]
    fn test_check_training_data() {
        let empty = Array2::<f64>::zeros((0, 2));
        let err = check_training_data(&empty, &Array1::zeros(0)).unwrap_err();
        assert!(matches!(err, FaroError::EmptyPartition(_)));

        let err = check_training_data(&array![[1.0], [2.0]], &array![1.0]).unwrap_err();
        assert!(matches!(err, FaroError::Model(_)));
    }

    #[test]
    fn test_model_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn Model>>();
    }
}
