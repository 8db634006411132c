//! Classification-based long-short backtest.
//!
//! Securities are labelled 1 when their next-month return beats the median
//! and a classifier (a random forest by default) learns the direction from
//! the feature vector. Each month, the predicted class-1 probability ranks the
//! cross-section and the strategy goes long the top quantile and short the
//! bottom quantile.
//!
//! Two modes are available:
//!
//! - [`ClassifierMode::Legacy`]: one global median, one seeded 80/20 random
//!   split over all rows, one fit, and every row of the panel is scored. Rows
//!   seen in training are scored as if out of sample, so the resulting returns
//!   carry look-ahead bias. Held-out diagnostics are reported for the split.
//! - [`ClassifierMode::WalkForward`]: the rolling schedule of the regression
//!   baseline; each iteration labels its training window with the window's own
//!   median and scores only the test month.

use crate::matrix::{complete_rows, direction_labels, feature_matrix, lead_returns};
use crate::result::BacktestResult;
use crate::schedule::WalkForward;
use crate::snapshot::record_month;
use faro_data::Panel;
use faro_models::{ClassificationReport, ConfusionMatrix, ForestConfig, RandomForestClassifier};
use faro_traits::{FaroError, Feature, Model, Result, stats};
use ndarray::Axis;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// How the classifier is trained and applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    /// Single fit on a random split, every row scored.
    #[default]
    Legacy,
    /// Rolling refit, test month scored out of sample.
    WalkForward,
}

/// Classification backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Training mode.
    pub mode: ClassifierMode,
    /// Model inputs, in column order.
    pub features: Vec<Feature>,
    /// Fraction of each month held long and short.
    pub quantile: f64,
    /// Share of rows held out in legacy mode.
    pub test_fraction: f64,
    /// Seed for the legacy train/test shuffle.
    pub seed: u64,
    /// Walk-forward schedule.
    pub schedule: WalkForward,
    /// Forest hyperparameters for the default model.
    pub forest: ForestConfig,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::default(),
            features: Feature::ALL.to_vec(),
            quantile: 0.2,
            test_fraction: 0.2,
            seed: 42,
            schedule: WalkForward::default(),
            forest: ForestConfig::default(),
        }
    }
}

/// Held-out evaluation of the legacy-mode classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationDiagnostics {
    /// Median lead return used as the label threshold.
    pub label_threshold: f64,
    /// Training rows.
    pub train_size: usize,
    /// Held-out rows.
    pub test_size: usize,
    /// Held-out confusion matrix.
    pub confusion: ConfusionMatrix,
    /// Held-out per-class report.
    pub report: ClassificationReport,
    /// Feature names and importances, when the model provides them.
    pub feature_importances: Option<Vec<(Feature, f64)>>,
}

/// Backtest output plus legacy-mode diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRun {
    /// Monthly strategy returns.
    pub result: BacktestResult,
    /// Present in legacy mode.
    pub diagnostics: Option<ClassificationDiagnostics>,
}

/// Runs the classification strategy over a [`Panel`].
#[derive(Debug, Clone)]
pub struct ClassificationBacktester<M = RandomForestClassifier> {
    config: ClassificationConfig,
    model: M,
}

impl ClassificationBacktester {
    /// Backtester with a random forest built from `config.forest`.
    pub fn new(config: ClassificationConfig) -> Self {
        let model = RandomForestClassifier::new(config.forest.clone());
        Self { config, model }
    }
}

impl Default for ClassificationBacktester {
    fn default() -> Self {
        Self::new(ClassificationConfig::default())
    }
}

impl<M: Model> ClassificationBacktester<M> {
    /// Backtester with a caller-supplied model.
    pub const fn with_model(config: ClassificationConfig, model: M) -> Self {
        Self { config, model }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &ClassificationConfig {
        &self.config
    }

    /// The model as left by the last fit.
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Runs the backtest.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for out-of-range fractions, an empty feature list or a
    /// zero walk-forward window,
    /// `EmptyPartition` if legacy mode has no training rows, and any model
    /// error.
    pub fn run(&mut self, panel: &Panel) -> Result<ClassificationRun> {
        self.validate()?;
        tracing::info!(
            mode = ?self.config.mode,
            model = self.model.name(),
            observations = panel.len(),
            months = panel.months().len(),
            "starting classification backtest"
        );

        let run = match self.config.mode {
            ClassifierMode::Legacy => self.run_legacy(panel)?,
            ClassifierMode::WalkForward => ClassificationRun {
                result: self.run_walk_forward(panel)?,
                diagnostics: None,
            },
        };

        if run.result.skipped > 0 {
            tracing::warn!(
                skipped = run.result.skipped,
                "months without a tradable portfolio"
            );
        }
        tracing::info!(periods = run.result.len(), "classification backtest finished");
        Ok(run)
    }

    fn validate(&self) -> Result<()> {
        if self.config.features.is_empty() {
            return Err(FaroError::InvalidConfig(
                "classifier needs at least one feature".to_string(),
            ));
        }
        let f = self.config.test_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(FaroError::InvalidConfig(format!(
                "test fraction must lie in (0, 1), got {f}"
            )));
        }
        let q = self.config.quantile;
        if !(q > 0.0 && q <= 0.5) {
            return Err(FaroError::InvalidConfig(format!(
                "quantile must lie in (0, 0.5], got {q}"
            )));
        }
        if self.config.mode == ClassifierMode::WalkForward {
            WalkForward::new(self.config.schedule.window, self.config.schedule.gap)?;
        }
        Ok(())
    }

    fn run_legacy(&mut self, panel: &Panel) -> Result<ClassificationRun> {
        let features = &self.config.features;
        let rows = complete_rows(panel.observations(), features);
        if rows.is_empty() {
            return Err(FaroError::EmptyPartition(
                "panel has no rows with the classifier features".to_string(),
            ));
        }

        let leads = lead_returns(&rows).to_vec();
        let threshold = stats::median(&leads);
        let labels = direction_labels(&rows, threshold);
        let x = feature_matrix(&rows, features)?;

        let (train_idx, test_idx) =
            shuffle_split(rows.len(), self.config.test_fraction, self.config.seed);
        if train_idx.is_empty() {
            return Err(FaroError::EmptyPartition(format!(
                "{} rows leave nothing to train on",
                rows.len()
            )));
        }

        self.model.fit(
            &x.select(Axis(0), &train_idx),
            &labels.select(Axis(0), &train_idx),
        )?;
        let scores = self.model.predict(&x)?;

        let test_labels = labels.select(Axis(0), &test_idx).to_vec();
        let test_scores = scores.select(Axis(0), &test_idx).to_vec();
        let confusion = ConfusionMatrix::from_scores(&test_labels, &test_scores);
        let diagnostics = ClassificationDiagnostics {
            label_threshold: threshold,
            train_size: train_idx.len(),
            test_size: test_idx.len(),
            confusion,
            report: ClassificationReport::from_confusion(&confusion),
            feature_importances: self
                .model
                .feature_importances()
                .map(|imp| features.iter().copied().zip(imp.iter().copied()).collect()),
        };
        tracing::info!(
            threshold,
            train = diagnostics.train_size,
            test = diagnostics.test_size,
            accuracy = diagnostics.report.accuracy,
            "fitted classifier on random split"
        );

        let scores = scores.to_vec();
        let mut result = BacktestResult::default();
        let mut offset = 0;
        for month_rows in rows.chunk_by(|a, b| a.month == b.month) {
            let month_scores = &scores[offset..offset + month_rows.len()];
            offset += month_rows.len();
            record_month(month_rows, month_scores, self.config.quantile, &mut result)?;
        }

        Ok(ClassificationRun {
            result,
            diagnostics: Some(diagnostics),
        })
    }

    fn run_walk_forward(&mut self, panel: &Panel) -> Result<BacktestResult> {
        let features = &self.config.features;
        let months = panel.months();
        let mut result = BacktestResult::default();

        for split in self.config.schedule.splits(months.len()) {
            let test_month = months[split.test];
            let train = complete_rows(panel.months_slice(split.train.clone()), features);
            let test = complete_rows(panel.month(test_month), features);
            if train.is_empty() || test.is_empty() {
                tracing::warn!(
                    month = %test_month,
                    train = train.len(),
                    test = test.len(),
                    "skipping iteration with an empty partition"
                );
                result.skipped += 1;
                continue;
            }

            let leads = lead_returns(&train).to_vec();
            let threshold = stats::median(&leads);
            self.model.fit(
                &feature_matrix(&train, features)?,
                &direction_labels(&train, threshold),
            )?;
            let scores = self
                .model
                .predict(&feature_matrix(&test, features)?)?
                .to_vec();

            tracing::debug!(
                month = %test_month,
                train = train.len(),
                test = test.len(),
                threshold,
                "scored month"
            );
            record_month(&test, &scores, self.config.quantile, &mut result)?;
        }

        Ok(result)
    }
}

/// Seeded shuffle; the first `ceil(test_fraction * n)` indices are held out.
fn shuffle_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((test_fraction * n as f64).ceil() as usize).min(n);
    let train = indices.split_off(n_test);
    (train, indices)
}
