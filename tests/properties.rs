//! Property-based tests for the metric invariants.

use ndarray::Array2;
use prediction_bias::metrics::imbalance::mean_ir;
use prediction_bias::metrics::ranking::{normalized_coverage_error, sample_exposure};
use prediction_bias::*;
use proptest::prelude::*;

/// Vocabulary size plus, per sample, a label permutation and how many of
/// its leading labels are true (at least one true and one false label).
fn ranked_rows() -> impl Strategy<Value = (usize, Vec<(Vec<usize>, usize)>)> {
    (2usize..8).prop_flat_map(|num_labels| {
        let row = (Just((0..num_labels).collect::<Vec<_>>()).prop_shuffle(), 1..num_labels);
        prop::collection::vec(row, 1..6).prop_map(move |rows| (num_labels, rows))
    })
}

/// Indicator and score matrices where the true labels get the highest
/// scores, or the lowest with `reversed`.
fn placed_matrices(
    num_labels: usize,
    rows: &[(Vec<usize>, usize)],
    reversed: bool,
) -> (Array2<u8>, Array2<Score>) {
    let mut y_true = Array2::zeros((rows.len(), num_labels));
    let mut y_score = Array2::zeros((rows.len(), num_labels));
    for (i, (order, k)) in rows.iter().enumerate() {
        for (position, &label) in order.iter().enumerate() {
            y_true[[i, label]] = u8::from(position < *k);
            let rank = if reversed { num_labels - position } else { position + 1 };
            y_score[[i, label]] = 1.0 - rank as f64 / (num_labels + 1) as f64;
        }
    }
    (y_true, y_score)
}

fn label_sets() -> impl Strategy<Value = Vec<LabelSet>> {
    prop::collection::vec(prop::collection::btree_set(0usize..6, 0..4), 1..30).prop_map(|sets| {
        sets.into_iter()
            .map(|set| set.into_iter().map(|l| format!("l{}", l)).collect())
            .collect()
    })
}

proptest! {
    #[test]
    fn frequencies_are_proportions(sets in label_sets()) {
        let freqs = frequencies(&sets).unwrap();
        let stats = LabelSetStatistics::from_label_sets(&sets).unwrap();

        for &value in freqs.values() {
            prop_assert!(value > 0.0 && value <= 1.0);
        }
        let total: f64 = freqs.values().sum();
        prop_assert!(total <= freqs.len() as f64 + 1e-12);
        prop_assert!((total - stats.cardinality).abs() < 1e-9);
    }

    #[test]
    fn mean_ir_is_one_only_when_balanced(counts in prop::collection::vec(1usize..50, 1..10)) {
        let table: OccurrenceTable = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (format!("l{}", i), c))
            .collect();
        let value = mean_ir(&table).unwrap();

        prop_assert!(value >= 1.0);
        let balanced = counts.iter().all(|&c| c == counts[0]);
        prop_assert_eq!(value == 1.0, balanced);
    }

    #[test]
    fn coverage_spans_best_to_worst_placement((num_labels, rows) in ranked_rows()) {
        let (y_true, best) = placed_matrices(num_labels, &rows, false);
        let (_, worst) = placed_matrices(num_labels, &rows, true);

        let top = normalized_coverage_error(&y_true.view(), &best.view()).unwrap();
        let bottom = normalized_coverage_error(&y_true.view(), &worst.view()).unwrap();
        prop_assert!(top.abs() < 1e-12);
        prop_assert!((bottom - 1.0).abs() < 1e-12);
    }

    #[test]
    fn exposure_spans_best_to_worst_placement((num_labels, rows) in ranked_rows()) {
        let (y_true, best) = placed_matrices(num_labels, &rows, false);
        let (_, worst) = placed_matrices(num_labels, &rows, true);

        for i in 0..rows.len() {
            let truth = y_true.row(i);
            let top = sample_exposure(&truth, &best.row(i), true);
            let bottom = sample_exposure(&truth, &worst.row(i), true);
            prop_assert!((top - 1.0).abs() < 1e-12);
            prop_assert!(bottom.abs() < 1e-12);

            let unnormalized = sample_exposure(&truth, &best.row(i), false);
            prop_assert!(unnormalized > 0.0);
        }
    }

    #[test]
    fn exposure_without_true_labels_is_zero(scores in prop::collection::vec(0.0f64..1.0, 1..10)) {
        let truth = ndarray::Array1::<u8>::zeros(scores.len());
        let scores = ndarray::Array1::from(scores);
        prop_assert_eq!(sample_exposure(&truth.view(), &scores.view(), true), 0.0);
        prop_assert_eq!(sample_exposure(&truth.view(), &scores.view(), false), 0.0);
    }

    #[test]
    fn spearman_ignores_monotonic_transforms(
        pairs in prop::collection::vec((-1000i32..1000, -1000i32..1000), 2..25)
    ) {
        let x: Vec<f64> = pairs.iter().map(|(a, _)| *a as f64).collect();
        let y: Vec<f64> = pairs.iter().map(|(_, b)| *b as f64).collect();
        let x_cubed: Vec<f64> = x.iter().map(|v| v.powi(3)).collect();
        let y_shifted: Vec<f64> = y.iter().map(|v| 0.5 * v - 3.0).collect();

        let base = spearman(&x, &y).unwrap();
        let transformed = spearman(&x_cubed, &y_shifted).unwrap();
        if base.is_nan() {
            prop_assert!(transformed.is_nan());
        } else {
            prop_assert!((-1.0..=1.0).contains(&base));
            prop_assert!((base - transformed).abs() < 1e-12);
        }
    }

    #[test]
    fn confusion_ratios_stay_in_unit_interval(
        tp in 0usize..20, fp in 0usize..20, tn in 0usize..20, fn_ in 0usize..20
    ) {
        let confusion = BinaryConfusion { tp, fp, tn, fn_ };
        for value in [
            confusion.precision(),
            confusion.recall(),
            confusion.f1(),
            confusion.balanced_accuracy(),
        ] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
        if tp == 0 {
            prop_assert_eq!(confusion.precision(), 0.0);
            prop_assert_eq!(confusion.recall(), 0.0);
            prop_assert_eq!(confusion.f1(), 0.0);
        }
    }
}
