//! Evaluation metrics for imbalanced multi-label classification.
//!
//! - [`imbalance`]: imbalance ratio indicators of a label distribution
//! - [`ranking`]: coverage, ranking loss, LRAP and rank-based exposure
//! - [`classification`]: per-label precision, recall, F1, balanced accuracy
//! - [`correlation`]: trend fitting and rank correlation against frequency
//!
//! # Example
//!
//! ```rust
//! use prediction_bias::metrics::correlation::spearman;
//!
//! # fn main() -> prediction_bias::Result<()> {
//! let train_frequency = [0.1, 0.3, 0.6];
//! let fscore = [0.2, 0.5, 0.9];
//! let pbc = spearman(&train_frequency, &fscore)?;
//! assert!((pbc - 1.0).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

pub mod classification;
pub mod correlation;
pub mod imbalance;
pub mod ranking;

pub use classification::{
    evaluate_labels, qualifying_labels, BinaryConfusion, LabelScore, PerLabelSummary,
};
pub use correlation::{analyze, spearman, CorrelationResult, PolynomialFit, TrendPlot};
pub use imbalance::{cv_ir, imbalance_ratios, lrid, mean_ir, ImbalanceIndicators};
pub use ranking::{
    average_exposure, coverage_error, label_ranking_average_precision, label_ranking_loss,
    normalized_coverage_error, sample_exposure, RankingSummary,
};

/// Utility functions for metric calculations.
pub mod utils {
    use std::cmp::Ordering;

    /// Arithmetic mean; 0 for an empty slice.
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population standard deviation; 0 for an empty slice.
    pub fn population_std_dev(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mean = mean(values);
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }

    /// Rank discount of a 0-based position: `1 / log2(2 + position)`.
    pub fn position_discount(position: usize) -> f64 {
        1.0 / (position as f64 + 2.0).log2()
    }

    /// 1-based ascending ranks; tied values share the mean of their ranks.
    pub fn average_ranks(values: &[f64]) -> Vec<f64> {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

        let mut ranks = vec![0.0; values.len()];
        let mut start = 0;
        while start < order.len() {
            let mut end = start + 1;
            while end < order.len() && values[order[end]] == values[order[start]] {
                end += 1;
            }
            // positions start..end (0-based) share rank mean(start+1 ..= end)
            let shared = (start + end + 1) as f64 / 2.0;
            for &index in &order[start..end] {
                ranks[index] = shared;
            }
            start = end;
        }
        ranks
    }
}
