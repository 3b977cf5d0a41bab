//! Label frequency statistics.
//!
//! Occurrence and frequency tables are built fresh for every split (training
//! fold, test fold) and only read afterwards. Labels that never occur are
//! absent from the tables rather than present with a zero count.

use crate::core::error::{PredictionBiasError, Result};
use crate::core::types::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Count how many label sets contain each label.
pub fn occurrences<'a, I>(label_sets: I) -> OccurrenceTable
where
    I: IntoIterator<Item = &'a LabelSet>,
{
    let mut table = OccurrenceTable::new();
    for labels in label_sets {
        for label in labels {
            *table.entry(label.clone()).or_insert(0) += 1;
        }
    }
    table
}

/// Proportion of label sets containing each label.
///
/// Fails with a division error for an empty collection.
pub fn frequencies(label_sets: &[LabelSet]) -> Result<FrequencyTable> {
    if label_sets.is_empty() {
        return Err(PredictionBiasError::division(
            "cannot compute label frequencies of an empty sample set",
        ));
    }

    let total = label_sets.len() as f64;
    Ok(occurrences(label_sets)
        .into_iter()
        .map(|(label, count)| (label, count as f64 / total))
        .collect())
}

/// Occurrence table of a slice of samples.
pub fn sample_occurrences(samples: &[Sample]) -> OccurrenceTable {
    occurrences(samples.iter().map(Sample::labels))
}

/// Frequency table of a slice of samples.
pub fn sample_frequencies(samples: &[Sample]) -> Result<FrequencyTable> {
    if samples.is_empty() {
        return Err(PredictionBiasError::division(
            "cannot compute label frequencies of an empty sample set",
        ));
    }

    let total = samples.len() as f64;
    Ok(sample_occurrences(samples)
        .into_iter()
        .map(|(label, count)| (label, count as f64 / total))
        .collect())
}

/// Labels of a frequency table sorted by ascending frequency.
///
/// Equal frequencies fall back to label order, so the result is fully
/// deterministic.
pub fn labels_by_frequency(table: &FrequencyTable) -> Vec<Label> {
    let mut entries: Vec<(&Label, f64)> = table.iter().map(|(l, &f)| (l, f)).collect();
    entries.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    entries.into_iter().map(|(label, _)| label.clone()).collect()
}

/// Descriptive statistics of a multi-label collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSetStatistics {
    /// Number of label sets
    pub num_samples: usize,
    /// Number of distinct labels
    pub num_labels: usize,
    /// Number of label sets with no label at all
    pub num_unlabeled: usize,
    /// Mean number of labels per sample
    pub cardinality: f64,
    /// Cardinality divided by the number of distinct labels
    pub density: f64,
}

impl LabelSetStatistics {
    /// Compute statistics for a collection of label sets.
    pub fn from_label_sets(label_sets: &[LabelSet]) -> Result<Self> {
        if label_sets.is_empty() {
            return Err(PredictionBiasError::division(
                "cannot describe an empty sample set",
            ));
        }

        let table = occurrences(label_sets);
        let num_samples = label_sets.len();
        let num_labels = table.len();
        let total_assignments: usize = label_sets.iter().map(|s| s.len()).sum();
        let cardinality = total_assignments as f64 / num_samples as f64;
        let density = if num_labels > 0 {
            cardinality / num_labels as f64
        } else {
            0.0
        };

        Ok(LabelSetStatistics {
            num_samples,
            num_labels,
            num_unlabeled: label_sets.iter().filter(|s| s.is_empty()).count(),
            cardinality,
            density,
        })
    }
}
