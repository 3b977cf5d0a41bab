//! Per-label classification metrics.
//!
//! Each label is scored as its own binary problem over the test samples.
//! Ratios with a zero denominator are 0 and never an error.

use crate::core::error::{PredictionBiasError, Result};
use crate::core::types::*;
use crate::dataset::frequency::labels_by_frequency;
use crate::metrics::utils;
use serde::{Deserialize, Serialize};

/// Confusion counts for one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryConfusion {
    /// True positives
    pub tp: usize,
    /// False positives
    pub fp: usize,
    /// True negatives
    pub tn: usize,
    /// False negatives
    pub fn_: usize,
}

impl BinaryConfusion {
    /// Build the binary problem of `label` from parallel true/predicted sets.
    pub fn for_label(
        label: &str,
        true_labels: &[LabelSet],
        predicted_labels: &[LabelSet],
    ) -> Result<Self> {
        if true_labels.len() != predicted_labels.len() {
            return Err(PredictionBiasError::dimension_mismatch(
                format!("{} predicted label sets, one per true label set", true_labels.len()),
                format!("{} predicted label sets", predicted_labels.len()),
            ));
        }

        let mut confusion = BinaryConfusion::default();
        for (truth, predicted) in true_labels.iter().zip(predicted_labels) {
            match (truth.contains(label), predicted.contains(label)) {
                (true, true) => confusion.tp += 1,
                (false, true) => confusion.fp += 1,
                (false, false) => confusion.tn += 1,
                (true, false) => confusion.fn_ += 1,
            }
        }
        Ok(confusion)
    }

    /// Number of samples that actually carry the label.
    pub fn support(&self) -> usize {
        self.tp + self.fn_
    }

    /// `tp / (tp + fp)`, 0 when nothing was predicted.
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// `tp / (tp + fn)`, 0 when the label has no support.
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// `tn / (tn + fp)`, 0 when every sample carries the label.
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    /// Harmonic mean of precision and recall, 0 when both are 0.
    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        }
    }

    /// Unweighted mean of sensitivity and specificity.
    ///
    /// A rate whose class is absent from the ground truth is left out of the
    /// mean; with both classes absent the result is 0.
    pub fn balanced_accuracy(&self) -> f64 {
        let mut rates = Vec::with_capacity(2);
        if self.tp + self.fn_ > 0 {
            rates.push(self.recall());
        }
        if self.tn + self.fp > 0 {
            rates.push(self.specificity());
        }
        utils::mean(&rates)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Labels present in both the training and the test frequency table,
/// ordered by ascending training frequency.
///
/// Labels missing from either table are excluded, not reported as errors:
/// an untrained label would be rewarded for nothing, and a label without
/// test support has undefined precision and recall.
pub fn qualifying_labels(train_freq: &FrequencyTable, test_freq: &FrequencyTable) -> Vec<Label> {
    let training_only = train_freq.keys().filter(|l| !test_freq.contains_key(*l)).count();
    let test_only = test_freq.keys().filter(|l| !train_freq.contains_key(*l)).count();
    if training_only > 0 || test_only > 0 {
        log::debug!(
            "Excluding {} labels absent from the test split and {} labels unseen in training",
            training_only,
            test_only
        );
    }

    labels_by_frequency(train_freq)
        .into_iter()
        .filter(|label| test_freq.contains_key(label))
        .collect()
}

/// Metrics of one qualifying label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    /// Label identifier
    pub label: Label,
    /// Frequency of the label in the training split
    pub train_frequency: f64,
    /// Frequency of the label in the test split
    pub test_frequency: f64,
    /// Number of test samples carrying the label
    pub support: usize,
    /// Precision
    pub precision: f64,
    /// Recall
    pub recall: f64,
    /// F1-score
    pub f1: f64,
    /// Balanced accuracy
    pub balanced_accuracy: f64,
}

impl LabelScore {
    /// Value of the given target metric.
    pub fn metric(&self, target: TargetMetric) -> f64 {
        match target {
            TargetMetric::Precision => self.precision,
            TargetMetric::Recall => self.recall,
            TargetMetric::FScore => self.f1,
        }
    }
}

/// Score every qualifying label, ordered by ascending training frequency.
pub fn evaluate_labels(
    train_freq: &FrequencyTable,
    test_freq: &FrequencyTable,
    true_labels: &[LabelSet],
    predicted_labels: &[LabelSet],
) -> Result<Vec<LabelScore>> {
    qualifying_labels(train_freq, test_freq)
        .into_iter()
        .map(|label| {
            let confusion = BinaryConfusion::for_label(&label, true_labels, predicted_labels)?;
            Ok(LabelScore {
                train_frequency: train_freq[&label],
                test_frequency: test_freq[&label],
                support: confusion.support(),
                precision: confusion.precision(),
                recall: confusion.recall(),
                f1: confusion.f1(),
                balanced_accuracy: confusion.balanced_accuracy(),
                label,
            })
        })
        .collect()
}

/// Arithmetic means over the qualifying labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerLabelSummary {
    /// Number of labels averaged
    pub num_labels: usize,
    /// Mean precision
    pub avg_precision: f64,
    /// Mean recall
    pub avg_recall: f64,
    /// Mean F1-score
    pub avg_fscore: f64,
    /// Mean balanced accuracy
    pub avg_balanced_accuracy: f64,
}

impl PerLabelSummary {
    /// Average a set of label scores. An empty set averages to 0.
    pub fn from_scores(scores: &[LabelScore]) -> Self {
        if scores.is_empty() {
            log::warn!("No label occurs in both the training and the test split");
            return PerLabelSummary::default();
        }

        let column = |f: fn(&LabelScore) -> f64| -> f64 {
            let values: Vec<f64> = scores.iter().map(f).collect();
            utils::mean(&values)
        };

        PerLabelSummary {
            num_labels: scores.len(),
            avg_precision: column(|s| s.precision),
            avg_recall: column(|s| s.recall),
            avg_fscore: column(|s| s.f1),
            avg_balanced_accuracy: column(|s| s.balanced_accuracy),
        }
    }
}
