//! Classifier diagnostics: confusion matrix and per-class report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-class confusion matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Actual 0, predicted 0.
    pub true_negative: usize,
    /// Actual 0, predicted 1.
    pub false_positive: usize,
    /// Actual 1, predicted 0.
    pub false_negative: usize,
    /// Actual 1, predicted 1.
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Tallies predicted class-1 probabilities against 0/1 labels.
    ///
    /// A probability above 0.5 predicts class 1.
    pub fn from_scores(labels: &[f64], scores: &[f64]) -> Self {
        let mut matrix = Self::default();
        for (&label, &score) in labels.iter().zip(scores) {
            match (label > 0.5, score > 0.5) {
                (false, false) => matrix.true_negative += 1,
                (false, true) => matrix.false_positive += 1,
                (true, false) => matrix.false_negative += 1,
                (true, true) => matrix.true_positive += 1,
            }
        }
        matrix
    }

    /// Total number of samples.
    pub const fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    /// Fraction of correct predictions.
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negative + self.true_positive, self.total())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Correct predictions of the class over all predictions of the class.
    pub precision: f64,
    /// Correct predictions of the class over all actual members.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of actual members.
    pub support: usize,
}

impl ClassMetrics {
    fn new(hits: usize, predicted: usize, support: usize) -> Self {
        let precision = ratio(hits, predicted);
        let recall = ratio(hits, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Per-class metrics plus accuracy and averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Metrics for class 0 and class 1.
    pub classes: [ClassMetrics; 2],
    /// Overall accuracy.
    pub accuracy: f64,
    /// Unweighted mean over classes.
    pub macro_avg: ClassMetrics,
    /// Support-weighted mean over classes.
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Builds the report from a confusion matrix.
    pub fn from_confusion(m: &ConfusionMatrix) -> Self {
        let negatives = ClassMetrics::new(
            m.true_negative,
            m.true_negative + m.false_negative,
            m.true_negative + m.false_positive,
        );
        let positives = ClassMetrics::new(
            m.true_positive,
            m.true_positive + m.false_positive,
            m.true_positive + m.false_negative,
        );
        let total = m.total();

        let average = |weights: [f64; 2]| ClassMetrics {
            precision: weights[0] * negatives.precision + weights[1] * positives.precision,
            recall: weights[0] * negatives.recall + weights[1] * positives.recall,
            f1: weights[0] * negatives.f1 + weights[1] * positives.f1,
            support: total,
        };
        let macro_avg = average([0.5, 0.5]);
        let weighted_avg = average([
            ratio(negatives.support, total),
            ratio(positives.support, total),
        ]);

        Self {
            classes: [negatives, positives],
            accuracy: m.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, m) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (label, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_confusion_from_scores() {
        let labels = [0.0, 0.0, 1.0, 1.0, 1.0];
        let scores = [0.2, 0.7, 0.9, 0.4, 0.5];
        let m = ConfusionMatrix::from_scores(&labels, &scores);
        assert_eq!(
            m,
            ConfusionMatrix {
                true_negative: 1,
                false_positive: 1,
                false_negative: 2,
                true_positive: 1,
            }
        );
        assert_relative_eq!(m.accuracy(), 0.4);
    }

    #[test]
    fn test_report_matches_hand_computation() {
        let m = ConfusionMatrix {
            true_negative: 8,
            false_positive: 2,
            false_negative: 3,
            true_positive: 7,
        };
        let report = ClassificationReport::from_confusion(&m);

        let neg = report.classes[0];
        assert_relative_eq!(neg.precision, 8.0 / 11.0);
        assert_relative_eq!(neg.recall, 0.8);
        assert_eq!(neg.support, 10);

        let pos = report.classes[1];
        assert_relative_eq!(pos.precision, 7.0 / 9.0);
        assert_relative_eq!(pos.recall, 0.7);

        assert_relative_eq!(report.accuracy, 0.75);
        assert_relative_eq!(report.macro_avg.recall, 0.75);
        assert_eq!(report.weighted_avg.support, 20);

        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("weighted avg"));
    }

    #[test]
    fn test_empty_class_has_zero_metrics() {
        let m = ConfusionMatrix {
            true_negative: 5,
            ..Default::default()
        };
        let report = ClassificationReport::from_confusion(&m);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
        assert_relative_eq!(report.accuracy, 1.0);
    }
}
