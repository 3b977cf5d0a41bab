//! # Prediction Bias
//!
//! Diagnostics for label imbalance in multi-label text classification,
//! centred on the Prediction Bias Coefficient (PBC): the Spearman rank
//! correlation between each label's training frequency and the F-score the
//! classifier achieves on it.
//!
//! ## Features
//!
//! - **Imbalance Indicators**: meanIR, CVIR and LRID of a label distribution.
//! - **Ranking Metrics**: label ranking average precision, ranking loss,
//!   normalized coverage error and rank-based exposure of true labels.
//! - **Per-Label Metrics**: precision, recall, F1 and balanced accuracy for
//!   every label seen in both the training and the test split.
//! - **Correlation Analysis**: polynomial trend lines against training
//!   frequency, their value at zero frequency and the rank correlation.
//! - **Cross-Validation**: seeded k-fold evaluation with one fresh classifier
//!   per fold, optionally in parallel using Rayon.
//! - **Typed Reports**: per-fold records plus a global mean/std record,
//!   exported as JSON or CSV.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ndarray::Array2;
//! use prediction_bias::{
//!     Classifier, CrossValidator, EvaluationConfigBuilder, Label, Result, Sample, Score,
//! };
//!
//! /// Scores a label 1.0 when its name occurs in the text.
//! struct KeywordClassifier;
//!
//! impl Classifier for KeywordClassifier {
//!     type Model = Vec<Label>;
//!
//!     fn train(&mut self, samples: &[Sample]) -> Result<Self::Model> {
//!         let mut labels: Vec<Label> = samples.iter().flat_map(|s| s.labels().iter().cloned()).collect();
//!         labels.sort();
//!         labels.dedup();
//!         Ok(labels)
//!     }
//!
//!     fn vocabulary<'m>(&self, model: &'m Self::Model) -> &'m [Label] {
//!         model
//!     }
//!
//!     fn predict_scores(&self, model: &Self::Model, samples: &[Sample]) -> Result<Array2<Score>> {
//!         Ok(Array2::from_shape_fn((samples.len(), model.len()), |(i, j)| {
//!             if samples[i].text().contains(model[j].as_str()) { 1.0 } else { 0.0 }
//!         }))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! prediction_bias::init()?;
//!
//! let samples: Vec<Sample> = load_corpus();
//! let config = EvaluationConfigBuilder::new()
//!     .num_folds(5)
//!     .confidence_threshold(0.5)
//!     .build()?;
//!
//! let report = CrossValidator::new(config)
//!     .with_normalizer(|text: &str| text.to_lowercase())
//!     .run(&samples, || KeywordClassifier, None)?;
//!
//! let pbc = report.prediction_bias_coefficient();
//! println!("PBC = {:.3} ± {:.3}", pbc.mean, pbc.std);
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! # fn load_corpus() -> Vec<Sample> { Vec::new() }
//! ```
//!
//! ## Architecture
//!
//! - [`core`](crate::core): labels, samples, error handling and the collaborator traits
//! - [`config`]: evaluation configuration, files and environment overrides
//! - [`dataset`]: frequency tables, indicator encoding, k-fold partitioning
//! - [`metrics`]: imbalance, ranking, per-label and correlation metrics
//! - [`cross_validation`]: the fold aggregator
//! - [`report`]: typed metric records and export
//!
//! ## Collaborators
//!
//! Corpus loading, text normalization, the classifier itself and plotting
//! live outside this crate. Samples are passed in directly; the other three
//! are the [`TextNormalizer`], [`Classifier`] and [`Plotter`] traits.

#![doc(html_root_url = "https://docs.rs/prediction-bias/")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Label tables, encodings and splitting
pub mod dataset;

// Metric computations
pub mod metrics;

// Fold aggregator
pub mod cross_validation;

// Typed records and export
pub mod report;

pub use crate::core::{
    constants::*,
    error::{PredictionBiasError, Result},
    traits::{
        Classifier, IdentityNormalizer, NoopPlotter, Plotter, Predictions, RecordingPlotter,
        TextNormalizer,
    },
    types::*,
};

pub use config::{ConfigManager, EvaluationConfig, EvaluationConfigBuilder};

pub use dataset::{frequencies, occurrences, FoldSplit, KFold, LabelSetStatistics};

pub use metrics::{
    analyze, spearman, BinaryConfusion, CorrelationResult, ImbalanceIndicators, LabelScore,
    PerLabelSummary, PolynomialFit, RankingSummary, TrendPlot,
};

pub use cross_validation::CrossValidator;

pub use report::{
    CrossValidationReport, FoldReport, GlobalRecord, MeanStd, MetricKey, MetricsRecord,
};

pub use crate::core::constants::PREDICTION_BIAS_VERSION as VERSION;

/// Initialize the library.
///
/// Installs the `env_logger` backend for the `log` macros used throughout
/// the crate. Calling it is optional and repeated calls are harmless.
///
/// # Examples
///
/// ```rust
/// fn main() -> prediction_bias::Result<()> {
///     prediction_bias::init()?;
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    crate::core::initialize_logging();
    Ok(())
}

/// Check if the library has been initialized.
pub fn is_initialized() -> bool {
    crate::core::is_logging_initialized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_initialization() {
        assert!(init().is_ok());
        assert!(is_initialized());
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = EvaluationConfigBuilder::new()
            .num_folds(10)
            .fit_degree(2)
            .build()
            .unwrap();

        assert_eq!(config.num_folds, 10);
        assert_eq!(config.fit_degree, 2);
    }

    #[test]
    fn test_error_integration() {
        let err = PredictionBiasError::config("test error");
        assert_eq!(err.category(), "config");
    }
}
