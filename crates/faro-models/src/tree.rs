//! Binary classification tree (CART, Gini impurity).
//!
//! Leaves store the fraction of positive samples that reached them, so a tree
//! predicts a class-1 probability rather than a hard label.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Tree growth limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples in each child of a split.
    pub min_samples_leaf: usize,
    /// Features drawn per split (at least one valid split is always searched for).
    pub max_features: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        probability: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    /// Position in the sorted index list where the right child starts.
    cut: usize,
    gain: f64,
}

/// Training rows: feature matrix in row-major order plus 0/1 labels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Samples<'a> {
    pub(crate) rows: &'a [Vec<f64>],
    pub(crate) labels: &'a [f64],
}

/// A fitted classification tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

fn gini(positives: f64, n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let p = positives / n;
    2.0 * p * (1.0 - p)
}

struct Builder<'a> {
    config: TreeConfig,
    samples: Samples<'a>,
    n_total: f64,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl Builder<'_> {
    fn grow(&mut self, indices: &mut [usize], depth: usize, rng: &mut ChaCha8Rng) -> usize {
        let n = indices.len();
        let positives: f64 = indices.iter().map(|&i| self.samples.labels[i]).sum();
        let impurity = gini(positives, n as f64);

        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        let split = if depth_reached || n < self.config.min_samples_split || impurity <= 0.0 {
            None
        } else {
            self.best_split(indices, positives, impurity, rng)
        };

        let Some(split) = split else {
            self.nodes.push(Node::Leaf {
                probability: if n == 0 { 0.0 } else { positives / n as f64 },
            });
            return self.nodes.len() - 1;
        };

        self.importances[split.feature] += split.gain * n as f64 / self.n_total;

        // Reserve the slot so children can be appended after it.
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf { probability: 0.0 });

        let rows = self.samples.rows;
        indices.sort_by(|&a, &b| rows[a][split.feature].total_cmp(&rows[b][split.feature]));
        let (left_idx, right_idx) = indices.split_at_mut(split.cut);
        let left = self.grow(left_idx, depth + 1, rng);
        let right = self.grow(right_idx, depth + 1, rng);

        self.nodes[slot] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        slot
    }

    fn best_split(
        &self,
        indices: &[usize],
        positives: f64,
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<Split> {
        let n = indices.len();
        let n_features = self.samples.rows.first().map_or(0, Vec::len);
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut sorted = indices.to_vec();
        let mut best: Option<Split> = None;

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= self.config.max_features && best.is_some() {
                break;
            }

            let rows = self.samples.rows;
            sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

            let mut left_pos = 0.0;
            for k in 0..n - 1 {
                left_pos += self.samples.labels[sorted[k]];
                let here = rows[sorted[k]][feature];
                let next = rows[sorted[k + 1]][feature];
                if here >= next {
                    continue;
                }

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(left_pos, n_left as f64)
                    + n_right as f64 * gini(positives - left_pos, n_right as f64))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if best.is_none_or(|b| gain > b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        cut: n_left,
                        gain,
                    });
                }
            }
        }

        best
    }
}

impl DecisionTree {
    /// Grows a tree on the rows referenced by `indices` (duplicates allowed).
    pub(crate) fn fit(
        samples: Samples<'_>,
        mut indices: Vec<usize>,
        config: TreeConfig,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let n_features = samples.rows.first().map_or(0, Vec::len);
        let mut builder = Builder {
            config,
            samples,
            n_total: indices.len().max(1) as f64,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        builder.grow(&mut indices, 0, rng);

        let total: f64 = builder.importances.iter().sum();
        if total > 0.0 {
            for imp in &mut builder.importances {
                *imp /= total;
            }
        }

        Self {
            nodes: builder.nodes,
            importances: builder.importances,
        }
    }

    /// Class-1 probability for one feature row.
    pub fn predict_proba_one(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            match self.nodes.get(node) {
                Some(Node::Leaf { probability }) => return *probability,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    node = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Normalised impurity decrease per feature.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}
