//! Observation slices to model inputs.

use faro_traits::{FaroError, Feature, Observation, Result};
use ndarray::{Array1, Array2};

/// Rows carrying every feature in `features`, in input order.
pub(crate) fn complete_rows(observations: &[Observation], features: &[Feature]) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| o.features.select(features).is_some())
        .cloned()
        .collect()
}

/// Row-major feature matrix for `observations`, one column per feature.
pub(crate) fn feature_matrix(observations: &[Observation], features: &[Feature]) -> Result<Array2<f64>> {
    let mut values = Vec::with_capacity(observations.len() * features.len());
    for obs in observations {
        let row = obs.features.select(features).ok_or_else(|| {
            FaroError::MissingFeature(format!(
                "PERMNO {} in {} lacks one of {:?}",
                obs.security_id, obs.month, features
            ))
        })?;
        values.extend(row);
    }
    Array2::from_shape_vec((observations.len(), features.len()), values)
        .map_err(|e| FaroError::Model(e.to_string()))
}

/// Lead returns of `observations`.
pub(crate) fn lead_returns(observations: &[Observation]) -> Array1<f64> {
    observations.iter().map(|o| o.return_lead).collect()
}

/// 1 where the lead return exceeds `threshold`, else 0.
pub(crate) fn direction_labels(observations: &[Observation], threshold: f64) -> Array1<f64> {
    observations
        .iter()
        .map(|o| if o.return_lead > threshold { 1.0 } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faro_traits::{FeatureVector, Month};

    fn obs(vol: Option<f64>, lag: Option<f64>, lead: f64) -> Observation {
        Observation {
            security_id: 7,
            month: Month::new(2000, 1).unwrap(),
            monthly_return: None,
            return_lead: lead,
            features: FeatureVector {
                idiosyncratic_volatility: vol,
                lag_2_return: lag,
            },
        }
    }

    #[test]
    fn test_matrix_column_order() {
        let rows = vec![obs(Some(0.1), Some(0.02), 0.0), obs(Some(0.3), Some(-0.01), 0.0)];
        let x = feature_matrix(&rows, &[Feature::Lag2Return, Feature::IdiosyncraticVolatility])
            .unwrap();
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(x[[0, 0]], 0.02);
        assert_eq!(x[[1, 1]], 0.3);
    }

    #[test]
    fn test_missing_feature() {
        let rows = vec![obs(Some(0.1), None, 0.0)];
        let err = feature_matrix(&rows, &Feature::ALL).unwrap_err();
        assert!(matches!(err, FaroError::MissingFeature(_)));
        assert!(feature_matrix(&rows, &[Feature::IdiosyncraticVolatility]).is_ok());
    }

    #[test]
    fn test_complete_rows() {
        let rows = vec![obs(Some(0.1), None, 0.0), obs(Some(0.2), Some(0.0), 0.0)];
        assert_eq!(complete_rows(&rows, &Feature::ALL).len(), 1);
        assert_eq!(complete_rows(&rows, &[Feature::IdiosyncraticVolatility]).len(), 2);
    }

    #[test]
    fn test_direction_labels() {
        let rows = vec![obs(None, None, 0.02), obs(None, None, 0.01), obs(None, None, 0.0)];
        assert_eq!(direction_labels(&rows, 0.01).to_vec(), vec![1.0, 0.0, 0.0]);
    }
}
