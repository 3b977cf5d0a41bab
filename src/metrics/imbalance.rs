//! Label imbalance indicators.
//!
//! All indicators are derived from an occurrence table. Its key domain is
//! the set of labels that actually occur, so every count is positive.

use crate::core::error::{PredictionBiasError, Result};
use crate::core::types::*;
use crate::metrics::utils;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Imbalance ratio of every label: `max(counts) / count(label)`.
///
/// The majority label gets 1, every other label something larger.
pub fn imbalance_ratios(occurrences: &OccurrenceTable) -> Result<BTreeMap<Label, f64>> {
    let max_count = occurrences.values().copied().max().ok_or_else(|| {
        PredictionBiasError::division("cannot compute imbalance ratios of an empty occurrence table")
    })?;

    occurrences
        .iter()
        .map(|(label, &count)| {
            if count == 0 {
                return Err(PredictionBiasError::division(format!(
                    "label '{}' has a zero occurrence count",
                    label
                )));
            }
            Ok((label.clone(), max_count as f64 / count as f64))
        })
        .collect()
}

/// Mean imbalance ratio (meanIR).
pub fn mean_ir(occurrences: &OccurrenceTable) -> Result<f64> {
    let ratios = imbalance_ratios(occurrences)?;
    let values: Vec<f64> = ratios.values().copied().collect();
    Ok(utils::mean(&values))
}

/// Coefficient of variation of the imbalance ratio (CVIR).
///
/// Population standard deviation of the ratios divided by meanIR.
pub fn cv_ir(occurrences: &OccurrenceTable) -> Result<f64> {
    let ratios = imbalance_ratios(occurrences)?;
    let values: Vec<f64> = ratios.values().copied().collect();
    coefficient_of_variation(&values)
}

fn coefficient_of_variation(values: &[f64]) -> Result<f64> {
    let mean = utils::mean(values);
    if mean == 0.0 {
        return Err(PredictionBiasError::division("mean imbalance ratio is zero"));
    }
    Ok(utils::population_std_dev(values) / mean)
}

/// Likelihood-ratio imbalance degree (LRID).
///
/// `-2 * Σ count(l) * ln(N / (C * count(l)))` with `N` the number of samples
/// and `C` the number of distinct labels. Zero for a perfectly uniform label
/// distribution; its magnitude grows with skew.
pub fn lrid(occurrences: &OccurrenceTable, num_samples: usize) -> Result<f64> {
    if occurrences.is_empty() {
        return Err(PredictionBiasError::division(
            "cannot compute LRID of an empty occurrence table",
        ));
    }
    if num_samples == 0 {
        return Err(PredictionBiasError::division(
            "cannot compute LRID over zero samples",
        ));
    }

    let n = num_samples as f64;
    let c = occurrences.len() as f64;
    let mut sum = 0.0;
    for (label, &count) in occurrences {
        if count == 0 {
            return Err(PredictionBiasError::division(format!(
                "label '{}' has a zero occurrence count",
                label
            )));
        }
        let count = count as f64;
        sum += count * (n / (c * count)).ln();
    }

    Ok(-2.0 * sum)
}

/// Imbalance summary of one split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImbalanceIndicators {
    /// Mean imbalance ratio
    pub mean_ir: f64,
    /// Coefficient of variation of the imbalance ratio
    pub cv_ir: f64,
    /// Likelihood-ratio imbalance degree
    pub lrid: f64,
    /// Imbalance ratio per label
    pub ratios: BTreeMap<Label, f64>,
}

impl ImbalanceIndicators {
    /// Compute every indicator from an occurrence table.
    pub fn from_occurrences(occurrences: &OccurrenceTable, num_samples: usize) -> Result<Self> {
        let ratios = imbalance_ratios(occurrences)?;
        let values: Vec<f64> = ratios.values().copied().collect();

        Ok(ImbalanceIndicators {
            mean_ir: utils::mean(&values),
            cv_ir: coefficient_of_variation(&values)?,
            lrid: lrid(occurrences, num_samples)?,
            ratios,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn table(entries: &[(&str, usize)]) -> OccurrenceTable {
        entries.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    #[test]
    fn test_imbalance_ratio_of_majority_is_one() {
        let ratios = imbalance_ratios(&table(&[("earn", 8), ("grain", 2)])).unwrap();
        assert_abs_diff_eq!(ratios["earn"], 1.0);
        assert_abs_diff_eq!(ratios["grain"], 4.0);
    }

    #[test]
    fn test_mean_ir_and_cv_ir() {
        let occurrences = table(&[("A", 8), ("B", 2)]);
        assert_abs_diff_eq!(mean_ir(&occurrences).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cv_ir(&occurrences).unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_balanced_table() {
        let occurrences = table(&[("A", 3), ("B", 3), ("C", 3)]);
        assert_abs_diff_eq!(mean_ir(&occurrences).unwrap(), 1.0);
        assert_abs_diff_eq!(cv_ir(&occurrences).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_table_is_a_division_error() {
        let empty = OccurrenceTable::new();
        assert!(matches!(mean_ir(&empty), Err(PredictionBiasError::Division { .. })));
        assert!(matches!(cv_ir(&empty), Err(PredictionBiasError::Division { .. })));
        assert!(matches!(lrid(&empty, 10), Err(PredictionBiasError::Division { .. })));
    }

    #[test]
    fn test_lrid_is_zero_for_uniform_distribution() {
        // 3 labels, 30 samples, 10 each: N / (C * count) == 1
        let occurrences = table(&[("A", 10), ("B", 10), ("C", 10)]);
        assert_abs_diff_eq!(lrid(&occurrences, 30).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lrid_matches_formula() {
        let occurrences = table(&[("A", 8), ("B", 2)]);
        let expected = -2.0 * (8.0 * (10.0f64 / 16.0).ln() + 2.0 * (10.0f64 / 4.0).ln());
        assert_abs_diff_eq!(lrid(&occurrences, 10).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_indicators_bundle() {
        let indicators = ImbalanceIndicators::from_occurrences(&table(&[("A", 8), ("B", 2)]), 10).unwrap();
        assert_abs_diff_eq!(indicators.mean_ir, 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(indicators.cv_ir, 0.6, epsilon = 1e-12);
        assert_eq!(indicators.ratios.len(), 2);
    }
}
