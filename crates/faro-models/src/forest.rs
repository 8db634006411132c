//! Random forest classifier.
//!
//! Bagged CART trees with per-split feature sampling. The predicted score is
//! the mean class-1 probability across trees. Trees are grown in parallel,
//! each from its own RNG seeded with `seed + tree_index`, so a fixed seed
//! gives identical forests on any number of threads.

use crate::tree::{DecisionTree, Samples, TreeConfig};
use faro_traits::{FaroError, Model, Result, check_training_data};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest.
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples in a leaf.
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` uses `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample for each tree.
    pub bootstrap: bool,
    /// Random seed.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Random forest for binary (0/1) targets.
#[derive(Debug, Clone, Default)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForestClassifier {
    /// Creates an unfitted forest.
    pub const fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fitted trees.
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

}

impl Model for RandomForestClassifier {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
        check_training_data(features, target)?;
        if target.iter().any(|&y| y != 0.0 && y != 1.0) {
            return Err(FaroError::Model(
                "random forest targets must be 0 or 1".to_string(),
            ));
        }
        if self.config.n_trees == 0 {
            return Err(FaroError::InvalidConfig("n_trees must be positive".to_string()));
        }

        let rows: Vec<Vec<f64>> = features.rows().into_iter().map(|r| r.to_vec()).collect();
        let labels = target.to_vec();
        let n = rows.len();
        let n_features = features.ncols();

        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features);
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features,
        };

        let samples = Samples {
            rows: &rows,
            labels: &labels,
        };
        let bootstrap = self.config.bootstrap;
        let seed = self.config.seed;

        let trees: Vec<DecisionTree> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                let indices: Vec<usize> = if bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(samples, indices, tree_config, &mut rng)
            })
            .collect();

        let mut importances = vec![0.0; n_features];
        for tree in &trees {
            for (total, imp) in importances.iter_mut().zip(tree.feature_importances()) {
                *total += imp;
            }
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut importances {
                *imp /= sum;
            }
        }

        tracing::debug!(
            n_trees = trees.len(),
            n_samples = n,
            n_features,
            max_features,
            "fitted random forest"
        );

        self.trees = trees;
        self.n_features = n_features;
        self.feature_importances = importances;
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(FaroError::Model("random forest is not fitted".to_string()));
        }
        if features.ncols() != self.n_features {
            return Err(FaroError::Model(format!(
                "expected {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }

        let n_trees = self.trees.len() as f64;
        let rows: Vec<Vec<f64>> = features.rows().into_iter().map(|r| r.to_vec()).collect();
        let scores: Vec<f64> = rows
            .par_iter()
            .map(|row| {
                self.trees
                    .iter()
                    .map(|t| t.predict_proba_one(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect();
        Ok(Array1::from_vec(scores))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        (!self.feature_importances.is_empty()).then_some(self.feature_importances.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                i as f64 / n as f64
            } else {
                ((i * 7) % 11) as f64
            }
        });
        let y = Array1::from_shape_fn(n, |i| if i >= n / 2 { 1.0 } else { 0.0 });
        (x, y)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 25,
            ..Default::default()
        }
    }

    #[test]
    fn test_forest_learns_separable_problem() {
        let (x, y) = separable(200);
        let mut forest = RandomForestClassifier::new(small_config());
        forest.fit(&x, &y).unwrap();

        let scores = forest.predict(&x).unwrap();
        let correct = scores
            .iter()
            .zip(y.iter())
            .filter(|&(s, label)| (*s > 0.5) == (*label == 1.0))
            .count();
        assert!(correct as f64 / 200.0 > 0.95);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_forest_is_reproducible() {
        let (x, y) = separable(120);
        let mut a = RandomForestClassifier::new(small_config());
        let mut b = RandomForestClassifier::new(small_config());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
        assert!(a.feature_importances().is_some());
    }

    #[test]
    fn test_importances_favour_informative_feature() {
        let (x, y) = separable(200);
        let mut forest = RandomForestClassifier::new(small_config());
        forest.fit(&x, &y).unwrap();

        let imp = forest.feature_importances().unwrap();
        assert_eq!(imp.len(), 2);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1]);
    }

    #[test]
    fn test_rejects_non_binary_targets() {
        let x = Array2::zeros((3, 1));
        let y = Array1::from_vec(vec![0.0, 2.0, 1.0]);
        let mut forest = RandomForestClassifier::default();
        assert!(matches!(forest.fit(&x, &y), Err(FaroError::Model(_))));
    }

    #[test]
    fn test_predict_before_fit() {
        let forest = RandomForestClassifier::default();
        assert!(forest.predict(&Array2::zeros((1, 2))).is_err());
    }
}
