//! Ordinary least squares regression.
//!
//! Fits `y = intercept + X · coefficients` by solving the centred normal
//! equations. Constant feature columns carry no information and receive a
//! zero coefficient instead of making the system singular.

use faro_traits::{FaroError, Model, Result, check_training_data, stats::MIN_STD_THRESHOLD};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted OLS parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Intercept term.
    pub intercept: f64,
    /// One coefficient per feature column.
    pub coefficients: Vec<f64>,
}

/// Linear regression with intercept.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    fit: Option<LinearFit>,
}

impl LinearRegression {
    /// Creates an unfitted model.
    pub const fn new() -> Self {
        Self { fit: None }
    }

    /// Parameters of the last fit.
    pub const fn fitted(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }
}

impl Model for LinearRegression {
    fn name(&self) -> &str {
        "linear_regression"
    }

    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
        check_training_data(features, target)?;
        let n = features.nrows() as f64;

        let x_mean = features
            .mean_axis(Axis(0))
            .ok_or_else(|| FaroError::Model("empty feature matrix".to_string()))?;
        let y_mean = target.sum() / n;

        let xc = features - &x_mean;
        let yc = target - y_mean;

        // Columns with no spread are left out of the system.
        let active: Vec<usize> = (0..features.ncols())
            .filter(|&j| {
                let col = xc.column(j);
                (col.dot(&col) / n).sqrt() > MIN_STD_THRESHOLD
            })
            .collect();

        let mut coefficients = vec![0.0; features.ncols()];
        if !active.is_empty() {
            let xa = xc.select(Axis(1), &active);
            let xtx = xa.t().dot(&xa);
            let xty = xa.t().dot(&yc);
            let beta = solve(xtx, xty)?;
            for (&j, b) in active.iter().zip(beta.iter()) {
                coefficients[j] = *b;
            }
        }

        let intercept = y_mean
            - x_mean
                .iter()
                .zip(&coefficients)
                .map(|(m, b)| m * b)
                .sum::<f64>();

        self.fit = Some(LinearFit {
            intercept,
            coefficients,
        });
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let fit = self
            .fit
            .as_ref()
            .ok_or_else(|| FaroError::Model("linear regression is not fitted".to_string()))?;
        if features.ncols() != fit.coefficients.len() {
            return Err(FaroError::Model(format!(
                "expected {} features, got {}",
                fit.coefficients.len(),
                features.ncols()
            )));
        }
        let coef = Array1::from_vec(fit.coefficients.clone());
        Ok(features.dot(&coef) + fit.intercept)
    }
}

/// Solves `a · x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < MIN_STD_THRESHOLD {
            return Err(FaroError::Model(
                "singular design matrix (collinear features)".to_string(),
            ));
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            b.swap(pivot, col);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_recovers_exact_line() {
        let x = array![[0.01], [0.02], [0.03], [0.04]];
        let y = x.column(0).mapv(|v| 0.005 - 0.3 * v);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let fit = model.fitted().unwrap();
        assert_relative_eq!(fit.intercept, 0.005, epsilon = 1e-12);
        assert_relative_eq!(fit.coefficients[0], -0.3, epsilon = 1e-10);

        let pred = model.predict(&array![[0.05]]).unwrap();
        assert_relative_eq!(pred[0], 0.005 - 0.015, epsilon = 1e-12);
    }

    #[test]
    fn test_two_features() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0], [0.0, 3.0]];
        let y = x
            .rows()
            .into_iter()
            .map(|r| 1.0 + 2.0 * r[0] - 0.5 * r[1])
            .collect::<Array1<f64>>();

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let fit = model.fitted().unwrap();
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], -0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_constant_feature_predicts_mean() {
        let x = array![[0.2], [0.2], [0.2]];
        let y = array![0.01, 0.02, 0.03];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&array![[0.5]]).unwrap();
        assert_relative_eq!(pred[0], 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_requires_fit_and_shape() {
        let model = LinearRegression::new();
        assert!(model.predict(&array![[1.0]]).is_err());

        let mut model = LinearRegression::new();
        model.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        assert!(model.predict(&array![[1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_empty_training_set() {
        let mut model = LinearRegression::new();
        let err = model
            .fit(&Array2::zeros((0, 1)), &Array1::zeros(0))
            .unwrap_err();
        assert!(matches!(err, FaroError::EmptyPartition(_)));
    }
}
