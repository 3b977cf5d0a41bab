//! K-fold cross-validated evaluation of a multi-label classifier.
//!
//! Every fold trains a fresh classifier from the caller's factory, predicts
//! the held-out split and reduces the predictions to one
//! [`MetricsRecord`]. The run either yields a record for every fold or
//! fails as a whole; a failing fold is never averaged away.

use crate::config::EvaluationConfig;
use crate::core::error::{PredictionBiasError, Result};
use crate::core::traits::{Classifier, IdentityNormalizer, Plotter, RecordingPlotter, TextNormalizer};
use crate::core::types::*;
use crate::dataset::encoding::indicator_matrix;
use crate::dataset::frequency::{frequencies, occurrences, LabelSetStatistics};
use crate::dataset::partition::{FoldSplit, KFold};
use crate::metrics::classification::{evaluate_labels, LabelScore, PerLabelSummary};
use crate::metrics::correlation::{analyze, AxisTitles, CorrelationResult, TrendPlot};
use crate::metrics::imbalance::ImbalanceIndicators;
use crate::metrics::ranking::RankingSummary;
use crate::report::{CrossValidationReport, FoldCorrelations, FoldReport, MetricsRecord};
use rayon::prelude::*;

/// Horizontal axis title of every correlation plot.
pub const FREQUENCY_AXIS_TITLE: &str = "Training frequency";

type FoldOutcome = (FoldReport, Vec<TrendPlot>);

/// Cross-validation driver.
pub struct CrossValidator {
    config: EvaluationConfig,
    normalizer: Box<dyn TextNormalizer>,
}

impl std::fmt::Debug for CrossValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CrossValidator {
    /// Create a validator that passes texts through unchanged.
    pub fn new(config: EvaluationConfig) -> Self {
        CrossValidator {
            config,
            normalizer: Box::new(IdentityNormalizer),
        }
    }

    /// Normalize every text before it reaches the classifier.
    pub fn with_normalizer<N: TextNormalizer + 'static>(mut self, normalizer: N) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// Configuration of this validator.
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Run k-fold cross-validation over `samples`.
    ///
    /// `make_classifier` is called once per fold. When plotting is enabled
    /// and a plotter is given, it receives three plots per fold (precision,
    /// recall, F-score) in fold order, also when folds run in parallel.
    pub fn run<C, F>(
        &self,
        samples: &[Sample],
        make_classifier: F,
        plotter: Option<&mut dyn Plotter>,
    ) -> Result<CrossValidationReport>
    where
        C: Classifier,
        F: Fn() -> C + Sync,
    {
        self.config.validate_for_samples(samples.len())?;
        let splits = KFold::new(self.config.num_folds, self.config.shuffle, self.config.random_seed)?
            .split(samples.len())?;

        log::info!(
            "Starting {}-fold cross-validation over {} samples",
            splits.len(),
            samples.len()
        );

        let record_plots = self.config.plot_correlations && plotter.is_some();
        let evaluate = |split: &FoldSplit| -> Result<FoldOutcome> {
            let mut recorder = RecordingPlotter::default();
            let mut classifier = make_classifier();
            let (train, test) = split.select(samples);
            let report = self
                .evaluate_fold(
                    split.fold,
                    &train,
                    &test,
                    &mut classifier,
                    record_plots.then_some(&mut recorder as &mut dyn Plotter),
                )
                .map_err(|e| e.in_fold(split.fold))?;
            Ok((report, recorder.plots))
        };

        let outcomes = if self.config.parallel_folds {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.effective_num_threads())
                .build()
                .map_err(|e| PredictionBiasError::config(format!("Failed to create thread pool: {}", e)))?;
            log::debug!("Evaluating folds on {} threads", pool.current_num_threads());
            pool.install(|| splits.par_iter().map(evaluate).collect::<Result<Vec<_>>>())
        } else {
            splits.iter().map(evaluate).collect::<Result<Vec<_>>>()
        };
        let outcomes = outcomes.map_err(|e| {
            log::error!("Cross-validation aborted ({}): {}", e.category(), e);
            e
        })?;

        let mut folds = Vec::with_capacity(outcomes.len());
        let mut plotter = plotter;
        for (report, plots) in outcomes {
            if let Some(plotter) = plotter.as_deref_mut() {
                for plot in &plots {
                    plotter.plot(plot);
                }
            }
            folds.push(report);
        }

        let report = CrossValidationReport::new(self.config.clone(), folds)?;
        let pbc = report.prediction_bias_coefficient();
        log::info!(
            "Cross-validation finished: PBC = {:.4} ± {:.4}",
            pbc.mean,
            pbc.std
        );
        Ok(report)
    }

    /// Evaluate one pre-split fold.
    ///
    /// Errors are returned as they occur; [`run`](Self::run) adds the fold
    /// number.
    pub fn evaluate_fold<C: Classifier>(
        &self,
        fold: FoldIndex,
        train: &[Sample],
        test: &[Sample],
        classifier: &mut C,
        mut plotter: Option<&mut dyn Plotter>,
    ) -> Result<FoldReport> {
        log::info!(
            "Fold {}: training on {} samples, testing on {}",
            fold,
            train.len(),
            test.len()
        );

        let train = self.normalize(train);
        let test = self.normalize(test);
        let train_sets: Vec<LabelSet> = train.iter().map(|s| s.labels().clone()).collect();
        let test_sets: Vec<LabelSet> = test.iter().map(|s| s.labels().clone()).collect();

        let train_freq = frequencies(&train_sets)?;
        let test_freq = frequencies(&test_sets)?;
        let train_statistics = LabelSetStatistics::from_label_sets(&train_sets)?;
        let test_statistics = LabelSetStatistics::from_label_sets(&test_sets)?;

        let model = classifier.train(&train)?;
        let predictions = classifier.predict(&model, &test, self.config.confidence_threshold)?;
        let vocabulary = classifier.vocabulary(&model);
        log::debug!("Fold {}: model vocabulary has {} labels", fold, vocabulary.len());

        let imbalance = ImbalanceIndicators::from_occurrences(&occurrences(&train_sets), train.len())?;
        log::debug!(
            "Fold {}: meanIR = {:.4}, CVIR = {:.4}, LRID = {:.4}",
            fold,
            imbalance.mean_ir,
            imbalance.cv_ir,
            imbalance.lrid
        );

        let y_true = indicator_matrix(&test_sets, vocabulary);
        let ranking = RankingSummary::compute(
            &y_true.view(),
            &predictions.scores.view(),
            self.config.normalize_exposure,
        )?;
        log::debug!(
            "Fold {}: LRAP = {:.4}, ranking loss = {:.4}, coverage = {:.4}, exposure = {:.4}",
            fold,
            ranking.lraps,
            ranking.lrl,
            ranking.coverage_error,
            ranking.exposure
        );

        let label_scores = evaluate_labels(&train_freq, &test_freq, &test_sets, &predictions.labels)?;
        let summary = PerLabelSummary::from_scores(&label_scores);

        let mut correlate = |target: TargetMetric| -> Result<CorrelationResult> {
            correlate_with_frequency(
                &label_scores,
                target,
                self.config.fit_degree,
                plotter.as_mut().map(|p| &mut **p as &mut dyn Plotter),
            )
        };
        let correlations = FoldCorrelations {
            precision: correlate(TargetMetric::Precision)?,
            recall: correlate(TargetMetric::Recall)?,
            fscore: correlate(TargetMetric::FScore)?,
        };

        let record = MetricsRecord {
            mean_ir: imbalance.mean_ir,
            cv_ir: imbalance.cv_ir,
            lraps: ranking.lraps,
            lrl: ranking.lrl,
            cov_err: ranking.coverage_error,
            avg_exp: ranking.exposure,
            avg_balanced_accuracy: summary.avg_balanced_accuracy,
            avg_precision: summary.avg_precision,
            avg_recall: summary.avg_recall,
            avg_fscore: summary.avg_fscore,
            precision_correlation: correlations.precision.correlation,
            asymptotic_precision: correlations.precision.asymptotic_value,
            recall_correlation: correlations.recall.correlation,
            asymptotic_recall: correlations.recall.asymptotic_value,
            fscore_correlation: correlations.fscore.correlation,
            asymptotic_fscore: correlations.fscore.asymptotic_value,
        };

        log::info!(
            "Fold {}: {} qualifying labels, avg F-score = {:.4}, PBC = {:.4}",
            fold,
            summary.num_labels,
            summary.avg_fscore,
            record.prediction_bias_coefficient()
        );

        Ok(FoldReport {
            fold,
            record,
            train_statistics,
            test_statistics,
            imbalance,
            ranking,
            correlations,
            label_scores,
        })
    }

    fn normalize(&self, samples: &[Sample]) -> Vec<Sample> {
        samples
            .iter()
            .map(|s| s.with_text(self.normalizer.normalize(s.text())))
            .collect()
    }
}

/// Correlate one per-label metric with training frequency.
pub fn correlate_with_frequency(
    label_scores: &[LabelScore],
    target: TargetMetric,
    degree: usize,
    plotter: Option<&mut dyn Plotter>,
) -> Result<CorrelationResult> {
    let x: Vec<f64> = label_scores.iter().map(|s| s.train_frequency).collect();
    let y: Vec<f64> = label_scores.iter().map(|s| s.metric(target)).collect();
    let labels: Vec<Label> = label_scores.iter().map(|s| s.label.clone()).collect();
    let axes = AxisTitles::new(FREQUENCY_AXIS_TITLE, target.axis_title());

    analyze(&x, &y, Some(labels.as_slice()), degree, &axes, plotter)
}
