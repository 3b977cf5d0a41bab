//! Trait seams for the external collaborators of the metrics core.
//!
//! The core never trains or loads anything itself. Text normalization, the
//! multi-label classifier and plotting are supplied by the caller through
//! the traits below.

use crate::core::error::Result;
use crate::core::types::*;
use crate::dataset::encoding::threshold_scores;
use crate::metrics::correlation::TrendPlot;
use ndarray::Array2;

/// Pure string to string text normalization (lower-casing, stemming, ...).
pub trait TextNormalizer: Send + Sync {
    /// Normalize one document text.
    fn normalize(&self, text: &str) -> String;
}

impl<F> TextNormalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn normalize(&self, text: &str) -> String {
        self(text)
    }
}

/// Normalizer that returns the text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl TextNormalizer for IdentityNormalizer {
    fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Output of [`Classifier::predict`].
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    /// One score row per sample, columns in vocabulary order
    pub scores: Array2<Score>,
    /// Labels whose score exceeds the confidence threshold, per sample
    pub labels: Vec<LabelSet>,
}

/// Multi-label classifier capability.
///
/// A classifier value holds an immutable configuration. Every call to
/// [`train`](Classifier::train) returns a fresh, independent model, so no
/// state leaks from one fold into the next.
pub trait Classifier: Send {
    /// Trained model handle.
    type Model: Send;

    /// Train a new model on the given samples.
    fn train(&mut self, samples: &[Sample]) -> Result<Self::Model>;

    /// Ordered label vocabulary of a trained model; score columns follow it.
    fn vocabulary<'m>(&self, model: &'m Self::Model) -> &'m [Label];

    /// Raw per-label scores, shape `(samples.len(), vocabulary.len())`.
    fn predict_scores(&self, model: &Self::Model, samples: &[Sample]) -> Result<Array2<Score>>;

    /// Scores plus thresholded label sets.
    ///
    /// A label is predicted iff its score is strictly greater than
    /// `threshold`, which must lie in `[0, 1]`.
    fn predict(
        &self,
        model: &Self::Model,
        samples: &[Sample],
        threshold: f64,
    ) -> Result<Predictions> {
        let scores = self.predict_scores(model, samples)?;
        let labels = threshold_scores(&scores.view(), self.vocabulary(model), threshold)?;
        Ok(Predictions { scores, labels })
    }
}

/// Sink for correlation scatter plots. Presentation only; nothing is read back.
pub trait Plotter {
    /// Render one frequency-versus-metric plot.
    fn plot(&mut self, plot: &TrendPlot);
}

/// Plotter that discards every plot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlotter;

impl Plotter for NoopPlotter {
    fn plot(&mut self, _plot: &TrendPlot) {}
}

/// Plotter that keeps every plot in memory, useful for tests and reports.
#[derive(Debug, Clone, Default)]
pub struct RecordingPlotter {
    /// Plots received so far, in call order
    pub plots: Vec<TrendPlot>,
}

impl Plotter for RecordingPlotter {
    fn plot(&mut self, plot: &TrendPlot) {
        self.plots.push(plot.clone());
    }
}
