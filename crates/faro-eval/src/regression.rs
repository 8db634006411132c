//! Rolling linear-regression baseline.
//!
//! For every walk-forward iteration a model is fitted on the lead returns of
//! the training window and forecasts the lead return of every security in the
//! test month. The forecasts rank the cross-section exactly like the
//! classifier's probabilities.

use crate::matrix::{complete_rows, feature_matrix, lead_returns};
use crate::result::BacktestResult;
use crate::schedule::WalkForward;
use crate::snapshot::record_month;
use faro_data::Panel;
use faro_models::LinearRegression;
use faro_traits::{FaroError, Feature, Model, Month, Result};
use serde::{Deserialize, Serialize};

/// Regression backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Model inputs, in column order.
    pub features: Vec<Feature>,
    /// Fraction of each month held long and short.
    pub quantile: f64,
    /// Walk-forward schedule.
    pub schedule: WalkForward,
    /// Rows before this month are dropped from the result.
    pub start_month: Option<Month>,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            features: vec![Feature::IdiosyncraticVolatility],
            quantile: 0.2,
            schedule: WalkForward::default(),
            start_month: Month::new(1989, 1),
        }
    }
}

/// Runs the regression strategy over a [`Panel`].
#[derive(Debug, Clone, Default)]
pub struct RegressionBacktester<M = LinearRegression> {
    config: RegressionConfig,
    model: M,
}

impl RegressionBacktester {
    /// Backtester with ordinary least squares.
    pub const fn new(config: RegressionConfig) -> Self {
        Self {
            config,
            model: LinearRegression::new(),
        }
    }
}

impl<M: Model> RegressionBacktester<M> {
    /// Backtester with a caller-supplied model.
    pub const fn with_model(config: RegressionConfig, model: M) -> Self {
        Self { config, model }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Runs the backtest.
    ///
    /// Iterations whose training or test partition is empty, and test months
    /// without a finite forecast, are counted in
    /// [`BacktestResult::skipped`] instead of producing a row.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a bad quantile, window or feature list, and any
    /// model error.
    pub fn run(&mut self, panel: &Panel) -> Result<BacktestResult> {
        if self.config.features.is_empty() {
            return Err(FaroError::InvalidConfig(
                "regression needs at least one feature".to_string(),
            ));
        }
        let q = self.config.quantile;
        if !(q > 0.0 && q <= 0.5) {
            return Err(FaroError::InvalidConfig(format!(
                "quantile must lie in (0, 0.5], got {q}"
            )));
        }
        let schedule = WalkForward::new(self.config.schedule.window, self.config.schedule.gap)?;

        let features = &self.config.features;
        let months = panel.months();
        tracing::info!(
            model = self.model.name(),
            months = months.len(),
            window = schedule.window,
            "starting regression backtest"
        );

        let mut result = BacktestResult::default();
        for split in schedule.splits(months.len()) {
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

            self.model.fit(
                &feature_matrix(&train, features)?,
                &lead_returns(&train),
            )?;
            let forecasts = self
                .model
                .predict(&feature_matrix(&test, features)?)?
                .to_vec();
            tracing::debug!(
                month = %test_month,
                train = train.len(),
                test = test.len(),
                "forecast month"
            );
            record_month(&test, &forecasts, q, &mut result)?;
        }

        if let Some(start) = self.config.start_month {
            let before = result.len();
            result.retain_from(start);
            tracing::debug!(
                start = %start,
                dropped = before - result.len(),
                "trimmed rows before start month"
            );
        }
        if result.skipped > 0 {
            tracing::warn!(skipped = result.skipped, "iterations without a result row");
        }
        tracing::info!(periods = result.len(), "regression backtest finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{month, synthetic_observations, synthetic_panel};
    use faro_traits::Observation;
    use ndarray::{Array1, Array2};
    use std::sync::{Arc, Mutex};

    fn config(window: usize) -> RegressionConfig {
        RegressionConfig {
            schedule: WalkForward { window, gap: 1 },
            start_month: None,
            ..Default::default()
        }
    }

    /// Records the largest feature value of every fit and forecasts `-x`.
    struct Recorder {
        fits: Arc<Mutex<Vec<f64>>>,
    }

    impl Model for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn fit(&mut self, features: &Array2<f64>, _target: &Array1<f64>) -> Result<()> {
            let max = features.iter().copied().fold(f64::MIN, f64::max);
            self.fits.lock().unwrap().push(max);
            Ok(())
        }

        fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(features.column(0).mapv(|v| -v))
        }
    }

    #[test]
    fn test_rows_follow_schedule() {
        let panel = synthetic_panel(10, 10);
        let result = RegressionBacktester::new(config(4)).run(&panel).unwrap();

        // window 4, gap 1: test months 5..=9
        assert_eq!(result.months(), (5..10).map(month).collect::<Vec<_>>());
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_low_volatility_long_wins() {
        // Lead return falls with volatility, so a fitted slope ranks
        // low-volatility names first and the spread is positive.
        let panel = synthetic_panel(10, 10);
        let result = RegressionBacktester::new(config(4)).run(&panel).unwrap();
        assert!(result.rows.iter().all(|r| r.strategy_return > 0.0));
    }

    #[test]
    fn test_training_never_touches_test_or_gap_month() {
        // The feature is the month index, so a fit reveals the latest
        // training month it saw.
        let rows: Vec<Observation> = synthetic_observations(10, 10)
            .into_iter()
            .map(|mut o| {
                let index = (o.month.year() - 1986) * 12 + o.month.month() as i32 - 1;
                o.features.idiosyncratic_volatility = Some(f64::from(index));
                o
            })
            .collect();
        let panel = Panel::from_observations(rows).unwrap();

        let fits = Arc::new(Mutex::new(Vec::new()));
        let model = Recorder {
            fits: Arc::clone(&fits),
        };
        let result = RegressionBacktester::with_model(config(4), model)
            .run(&panel)
            .unwrap();

        let fits = fits.lock().unwrap();
        assert_eq!(fits.len(), result.len());
        for (latest_train, test) in fits.iter().zip(5..10) {
            assert!(*latest_train < f64::from(test - 1));
        }
    }

    #[test]
    fn test_empty_test_partition_is_absent() {
        let rows: Vec<Observation> = synthetic_observations(10, 10)
            .into_iter()
            .map(|mut o| {
                if o.month == month(7) {
                    o.features.idiosyncratic_volatility = None;
                }
                o
            })
            .collect();
        let panel = Panel::from_observations(rows).unwrap();
        let result = RegressionBacktester::new(config(4)).run(&panel).unwrap();

        assert!(!result.months().contains(&month(7)));
        assert_eq!(result.len(), 4);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_start_month_trims_rows() {
        let panel = synthetic_panel(10, 10);
        let config = RegressionConfig {
            start_month: Some(month(8)),
            ..config(4)
        };
        let result = RegressionBacktester::new(config).run(&panel).unwrap();
        assert_eq!(result.months(), vec![month(8), month(9)]);
    }

    #[test]
    fn test_default_start_month() {
        assert_eq!(RegressionConfig::default().start_month, Month::new(1989, 1));
        assert_eq!(RegressionConfig::default().schedule.window, 36);
    }

    #[test]
    fn test_zero_window_rejected() {
        let panel = synthetic_panel(4, 5);
        let err = RegressionBacktester::new(config(0)).run(&panel).unwrap_err();
        assert!(matches!(err, FaroError::InvalidConfig(_)));
    }
}
