//! Label ranking metrics for multi-label predictions.
//!
//! Every function takes a ground truth indicator matrix and a score matrix
//! of identical shape `(samples, vocabulary)`. Within a sample, labels are
//! ranked by descending score; rank 1 is the highest score.

use crate::core::error::{PredictionBiasError, Result};
use crate::core::types::Score;
use crate::metrics::utils;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Validate a `(y_true, y_score)` pair.
fn validate_inputs(y_true: &ArrayView2<'_, u8>, y_score: &ArrayView2<'_, Score>) -> Result<()> {
    if y_true.dim() != y_score.dim() {
        return Err(PredictionBiasError::dimension_mismatch(
            format!("y_true shape {:?}", y_true.dim()),
            format!("y_score shape {:?}", y_score.dim()),
        ));
    }

    if y_true.nrows() == 0 {
        return Err(PredictionBiasError::division(
            "ranking metrics are undefined over zero samples",
        ));
    }

    if y_score.iter().any(|s| !s.is_finite()) {
        return Err(PredictionBiasError::numerical("scores must be finite"));
    }

    Ok(())
}

/// Coverage of one sample: how many labels score at least as high as the
/// lowest scoring true label. Ties count against the model. Zero when the
/// sample has no true label.
fn sample_coverage(truth: &ArrayView1<'_, u8>, scores: &ArrayView1<'_, Score>) -> usize {
    let lowest_true = truth
        .iter()
        .zip(scores.iter())
        .filter(|(t, _)| **t != 0)
        .map(|(_, &s)| s)
        .fold(f64::INFINITY, f64::min);

    if lowest_true == f64::INFINITY {
        return 0;
    }

    scores.iter().filter(|&&s| s >= lowest_true).count()
}

/// Raw coverage error averaged over samples.
pub fn coverage_error(y_true: &ArrayView2<'_, u8>, y_score: &ArrayView2<'_, Score>) -> Result<f64> {
    validate_inputs(y_true, y_score)?;

    let total: usize = y_true
        .outer_iter()
        .zip(y_score.outer_iter())
        .map(|(truth, scores)| sample_coverage(&truth, &scores))
        .sum();

    Ok(total as f64 / y_true.nrows() as f64)
}

/// Coverage error rescaled to `[0, 1]`.
///
/// `(raw - best) / (worst - best)` where `best` is the mean number of true
/// labels per sample and `worst` the vocabulary size.
pub fn normalized_coverage_error(
    y_true: &ArrayView2<'_, u8>,
    y_score: &ArrayView2<'_, Score>,
) -> Result<f64> {
    let raw = coverage_error(y_true, y_score)?;

    let true_labels: usize = y_true.iter().filter(|&&t| t != 0).count();
    let best = true_labels as f64 / y_true.nrows() as f64;
    let worst = y_true.ncols() as f64;

    if worst == best {
        return Err(PredictionBiasError::division(format!(
            "normalized coverage error is undefined when the best possible coverage ({}) equals the vocabulary size",
            best
        )));
    }

    Ok((raw - best) / (worst - best))
}

/// Label ranking average precision (LRAP).
///
/// For each true label, the fraction of labels ranked at or above it that
/// are also true, averaged over true labels and then over samples. Samples
/// whose labels are all true or all false score 1.
pub fn label_ranking_average_precision(
    y_true: &ArrayView2<'_, u8>,
    y_score: &ArrayView2<'_, Score>,
) -> Result<f64> {
    validate_inputs(y_true, y_score)?;

    let num_labels = y_true.ncols();
    let per_sample: Vec<f64> = y_true
        .outer_iter()
        .zip(y_score.outer_iter())
        .map(|(truth, scores)| {
            let relevant: Vec<Score> = truth
                .iter()
                .zip(scores.iter())
                .filter(|(t, _)| **t != 0)
                .map(|(_, &s)| s)
                .collect();

            if relevant.is_empty() || relevant.len() == num_labels {
                return 1.0;
            }

            let precision_sum: f64 = relevant
                .iter()
                .map(|&s| {
                    let rank = scores.iter().filter(|&&other| other >= s).count();
                    let relevant_rank = relevant.iter().filter(|&&other| other >= s).count();
                    relevant_rank as f64 / rank as f64
                })
                .sum();

            precision_sum / relevant.len() as f64
        })
        .collect();

    Ok(utils::mean(&per_sample))
}

/// Label ranking loss.
///
/// Fraction of (true, false) label pairs where the true label does not score
/// strictly higher than the false one, averaged over samples. Samples with
/// no true or no false label contribute 0.
pub fn label_ranking_loss(
    y_true: &ArrayView2<'_, u8>,
    y_score: &ArrayView2<'_, Score>,
) -> Result<f64> {
    validate_inputs(y_true, y_score)?;

    let per_sample: Vec<f64> = y_true
        .outer_iter()
        .zip(y_score.outer_iter())
        .map(|(truth, scores)| {
            let (positives, negatives): (Vec<(u8, Score)>, Vec<(u8, Score)>) = truth
                .iter()
                .copied()
                .zip(scores.iter().copied())
                .partition(|(t, _)| *t != 0);

            if positives.is_empty() || negatives.is_empty() {
                return 0.0;
            }

            let misordered = positives
                .iter()
                .map(|&(_, p)| negatives.iter().filter(|&&(_, n)| p <= n).count())
                .sum::<usize>();

            misordered as f64 / (positives.len() * negatives.len()) as f64
        })
        .collect();

    Ok(utils::mean(&per_sample))
}

/// Rank-based exposure of the true labels of one sample.
///
/// Labels are sorted by descending score with ties kept in vocabulary order;
/// a true label at 0-based position `j` earns `1 / log2(2 + j)`. With
/// `normalize`, the sum is rescaled so that true labels in the top `k`
/// positions give 1 and in the bottom `k` positions give 0. A sample with no
/// true label has exposure 0.
pub fn sample_exposure(
    truth: &ArrayView1<'_, u8>,
    scores: &ArrayView1<'_, Score>,
    normalize: bool,
) -> f64 {
    let num_labels = scores.len();
    let mut order: Vec<usize> = (0..num_labels).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let k = truth.iter().filter(|&&t| t != 0).count();
    if k == 0 {
        return 0.0;
    }

    let raw: f64 = order
        .iter()
        .enumerate()
        .filter(|(_, label)| truth[**label] != 0)
        .map(|(position, _)| utils::position_discount(position))
        .sum();

    if !normalize {
        return raw;
    }

    let best: f64 = (0..k).map(utils::position_discount).sum();
    let worst: f64 = (num_labels - k..num_labels).map(utils::position_discount).sum();

    // k == vocabulary size: every placement is the optimal one
    if best == worst {
        return 1.0;
    }

    (raw - worst) / (best - worst)
}

/// Mean per-sample exposure over all samples.
pub fn average_exposure(
    y_true: &ArrayView2<'_, u8>,
    y_score: &ArrayView2<'_, Score>,
    normalize: bool,
) -> Result<f64> {
    validate_inputs(y_true, y_score)?;

    let per_sample: Vec<f64> = y_true
        .outer_iter()
        .zip(y_score.outer_iter())
        .map(|(truth, scores)| sample_exposure(&truth, &scores, normalize))
        .collect();

    Ok(utils::mean(&per_sample))
}

/// Aggregate ranking quality of one prediction batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    /// Label ranking average precision
    pub lraps: f64,
    /// Label ranking loss
    pub lrl: f64,
    /// Raw coverage error
    pub raw_coverage_error: f64,
    /// Normalized coverage error
    pub coverage_error: f64,
    /// Average (optionally normalized) exposure of true labels
    pub exposure: f64,
}

impl RankingSummary {
    /// Compute every ranking metric for one batch.
    pub fn compute(
        y_true: &ArrayView2<'_, u8>,
        y_score: &ArrayView2<'_, Score>,
        normalize_exposure: bool,
    ) -> Result<Self> {
        Ok(RankingSummary {
            lraps: label_ranking_average_precision(y_true, y_score)?,
            lrl: label_ranking_loss(y_true, y_score)?,
            raw_coverage_error: coverage_error(y_true, y_score)?,
            coverage_error: normalized_coverage_error(y_true, y_score)?,
            exposure: average_exposure(y_true, y_score, normalize_exposure)?,
        })
    }
}
