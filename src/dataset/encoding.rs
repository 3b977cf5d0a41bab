//! Conversions between label sets and vocabulary-ordered vectors.
//!
//! The vocabulary is the classifier's ordered label list. Position `i` of a
//! binary indicator vector is 1 iff `vocabulary[i]` is in the sample's label
//! set; score matrices share the same column order.

use crate::core::error::{PredictionBiasError, Result};
use crate::core::types::*;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::collections::HashMap;

/// Binary indicator matrix, shape `(label_sets.len(), vocabulary.len())`.
///
/// Labels missing from the vocabulary cannot be scored and are left out.
pub fn indicator_matrix(label_sets: &[LabelSet], vocabulary: &[Label]) -> Array2<u8> {
    let index: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    let mut matrix = Array2::zeros((label_sets.len(), vocabulary.len()));
    let mut unknown = 0usize;

    for (row, labels) in label_sets.iter().enumerate() {
        for label in labels {
            match index.get(label.as_str()) {
                Some(&col) => matrix[[row, col]] = 1,
                None => unknown += 1,
            }
        }
    }

    if unknown > 0 {
        log::debug!(
            "{} label assignments are outside the {}-label vocabulary and were not encoded",
            unknown,
            vocabulary.len()
        );
    }

    matrix
}

/// Check that a confidence threshold lies in `[0, 1]`.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(PredictionBiasError::invalid_parameter(
            "confidence_threshold",
            threshold.to_string(),
            "must be in range [0.0, 1.0]",
        ));
    }
    Ok(())
}

/// Labels of one score vector whose score is strictly above `threshold`.
pub fn labels_above_threshold(
    scores: &ArrayView1<'_, Score>,
    vocabulary: &[Label],
    threshold: f64,
) -> LabelSet {
    scores
        .iter()
        .zip(vocabulary)
        .filter(|(score, _)| **score > threshold)
        .map(|(_, label)| label.clone())
        .collect()
}

/// Threshold every row of a score matrix.
pub fn threshold_scores(
    scores: &ArrayView2<'_, Score>,
    vocabulary: &[Label],
    threshold: f64,
) -> Result<Vec<LabelSet>> {
    validate_threshold(threshold)?;

    if scores.ncols() != vocabulary.len() {
        return Err(PredictionBiasError::dimension_mismatch(
            format!("{} score columns (vocabulary size)", vocabulary.len()),
            format!("{} score columns", scores.ncols()),
        ));
    }

    Ok(scores
        .rows()
        .into_iter()
        .map(|row| labels_above_threshold(&row, vocabulary, threshold))
        .collect())
}
