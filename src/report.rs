//! Typed per-fold and global metric records.
//!
//! A cross-validation report is an ordered list of fold reports, indexed by
//! fold number, plus one global record holding the mean and population
//! standard deviation of every metric across folds.

use crate::config::EvaluationConfig;
use crate::core::error::{PredictionBiasError, Result};
use crate::core::types::{nan_from_null, FoldIndex};
use crate::dataset::frequency::LabelSetStatistics;
use crate::metrics::classification::LabelScore;
use crate::metrics::correlation::CorrelationResult;
use crate::metrics::imbalance::ImbalanceIndicators;
use crate::metrics::ranking::RankingSummary;
use crate::metrics::utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Closed set of metric record keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKey {
    /// Mean imbalance ratio of the training split
    #[serde(rename = "meanIR")]
    MeanIr,
    /// Coefficient of variation of the imbalance ratio
    #[serde(rename = "CVIR")]
    CvIr,
    /// Label ranking average precision
    #[serde(rename = "lraps")]
    Lraps,
    /// Label ranking loss
    #[serde(rename = "lrl")]
    Lrl,
    /// Normalized coverage error
    #[serde(rename = "cov_err")]
    CoverageError,
    /// Average rank-based exposure
    #[serde(rename = "avg_exp")]
    AverageExposure,
    /// Mean per-label balanced accuracy
    #[serde(rename = "avg_balanced_accuracy")]
    AverageBalancedAccuracy,
    /// Mean per-label precision
    #[serde(rename = "avg_precision")]
    AveragePrecision,
    /// Mean per-label recall
    #[serde(rename = "avg_recall")]
    AverageRecall,
    /// Mean per-label F1-score
    #[serde(rename = "avg_fscore")]
    AverageFScore,
    /// Spearman correlation of precision with training frequency
    #[serde(rename = "precision_correlation")]
    PrecisionCorrelation,
    /// Precision trend at zero frequency
    #[serde(rename = "asymptotic_precision")]
    AsymptoticPrecision,
    /// Spearman correlation of recall with training frequency
    #[serde(rename = "recall_correlation")]
    RecallCorrelation,
    /// Recall trend at zero frequency
    #[serde(rename = "asymptotic_recall")]
    AsymptoticRecall,
    /// Prediction Bias Coefficient
    #[serde(rename = "fscore_correlation")]
    FScoreCorrelation,
    /// F-score trend at zero frequency
    #[serde(rename = "asymptotic_fscore")]
    AsymptoticFScore,
}

static_assertions::const_assert_eq!(MetricKey::ALL.len(), 16);

impl MetricKey {
    /// Every key, in record order.
    pub const ALL: [MetricKey; 16] = [
        MetricKey::MeanIr,
        MetricKey::CvIr,
        MetricKey::Lraps,
        MetricKey::Lrl,
        MetricKey::CoverageError,
        MetricKey::AverageExposure,
        MetricKey::AverageBalancedAccuracy,
        MetricKey::AveragePrecision,
        MetricKey::AverageRecall,
        MetricKey::AverageFScore,
        MetricKey::PrecisionCorrelation,
        MetricKey::AsymptoticPrecision,
        MetricKey::RecallCorrelation,
        MetricKey::AsymptoticRecall,
        MetricKey::FScoreCorrelation,
        MetricKey::AsymptoticFScore,
    ];

    /// Key name as it appears in exported records.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::MeanIr => "meanIR",
            MetricKey::CvIr => "CVIR",
            MetricKey::Lraps => "lraps",
            MetricKey::Lrl => "lrl",
            MetricKey::CoverageError => "cov_err",
            MetricKey::AverageExposure => "avg_exp",
            MetricKey::AverageBalancedAccuracy => "avg_balanced_accuracy",
            MetricKey::AveragePrecision => "avg_precision",
            MetricKey::AverageRecall => "avg_recall",
            MetricKey::AverageFScore => "avg_fscore",
            MetricKey::PrecisionCorrelation => "precision_correlation",
            MetricKey::AsymptoticPrecision => "asymptotic_precision",
            MetricKey::RecallCorrelation => "recall_correlation",
            MetricKey::AsymptoticRecall => "asymptotic_recall",
            MetricKey::FScoreCorrelation => "fscore_correlation",
            MetricKey::AsymptoticFScore => "asymptotic_fscore",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric values of one fold, one field per [`MetricKey`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MetricsRecord {
    #[serde(rename = "meanIR")]
    #[serde(deserialize_with = "nan_from_null")]
    pub mean_ir: f64,
    #[serde(rename = "CVIR")]
    #[serde(deserialize_with = "nan_from_null")]
    pub cv_ir: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub lraps: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub lrl: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub cov_err: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub avg_exp: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub avg_balanced_accuracy: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub avg_precision: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub avg_recall: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub avg_fscore: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub precision_correlation: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub asymptotic_precision: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub recall_correlation: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub asymptotic_recall: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub fscore_correlation: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub asymptotic_fscore: f64,
}

impl MetricsRecord {
    /// Value of one key.
    pub fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::MeanIr => self.mean_ir,
            MetricKey::CvIr => self.cv_ir,
            MetricKey::Lraps => self.lraps,
            MetricKey::Lrl => self.lrl,
            MetricKey::CoverageError => self.cov_err,
            MetricKey::AverageExposure => self.avg_exp,
            MetricKey::AverageBalancedAccuracy => self.avg_balanced_accuracy,
            MetricKey::AveragePrecision => self.avg_precision,
            MetricKey::AverageRecall => self.avg_recall,
            MetricKey::AverageFScore => self.avg_fscore,
            MetricKey::PrecisionCorrelation => self.precision_correlation,
            MetricKey::AsymptoticPrecision => self.asymptotic_precision,
            MetricKey::RecallCorrelation => self.recall_correlation,
            MetricKey::AsymptoticRecall => self.asymptotic_recall,
            MetricKey::FScoreCorrelation => self.fscore_correlation,
            MetricKey::AsymptoticFScore => self.asymptotic_fscore,
        }
    }

    /// `(key, value)` pairs in record order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, f64)> + '_ {
        MetricKey::ALL.iter().map(move |&key| (key, self.get(key)))
    }

    /// The Prediction Bias Coefficient of this fold.
    pub fn prediction_bias_coefficient(&self) -> f64 {
        self.fscore_correlation
    }
}

/// Mean and population standard deviation of one metric across folds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    /// Arithmetic mean
    #[serde(deserialize_with = "nan_from_null")]
    pub mean: f64,
    /// Population standard deviation
    #[serde(deserialize_with = "nan_from_null")]
    pub std: f64,
}

impl MeanStd {
    /// Summarize a set of values; NaN members make both fields NaN.
    pub fn from_values(values: &[f64]) -> Self {
        MeanStd {
            mean: utils::mean(values),
            std: utils::population_std_dev(values),
        }
    }
}

/// Cross-fold summary of every metric key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRecord {
    /// Number of folds summarized
    pub num_folds: usize,
    /// Summary per key
    pub metrics: BTreeMap<MetricKey, MeanStd>,
}

impl GlobalRecord {
    /// Reduce per-fold records. The result does not depend on fold order.
    pub fn from_folds(records: &[MetricsRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(PredictionBiasError::division(
                "cannot build a global record from zero folds",
            ));
        }

        let metrics = MetricKey::ALL
            .iter()
            .map(|&key| {
                let values: Vec<f64> = records.iter().map(|r| r.get(key)).collect();
                (key, MeanStd::from_values(&values))
            })
            .collect();

        Ok(GlobalRecord {
            num_folds: records.len(),
            metrics,
        })
    }

    /// Summary of one key.
    pub fn get(&self, key: MetricKey) -> MeanStd {
        self.metrics.get(&key).copied().unwrap_or(MeanStd {
            mean: f64::NAN,
            std: f64::NAN,
        })
    }
}

/// Correlation analyses of one fold, one per target metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct FoldCorrelations {
    pub precision: CorrelationResult,
    pub recall: CorrelationResult,
    pub fscore: CorrelationResult,
}

/// Everything computed for one fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldReport {
    /// Fold number, 0-based
    pub fold: FoldIndex,
    /// Metric record of the fold
    pub record: MetricsRecord,
    /// Label statistics of the training split
    pub train_statistics: LabelSetStatistics,
    /// Label statistics of the test split
    pub test_statistics: LabelSetStatistics,
    /// Imbalance of the training split
    pub imbalance: ImbalanceIndicators,
    /// Ranking quality on the test split
    pub ranking: RankingSummary,
    /// Frequency correlation analyses
    pub correlations: FoldCorrelations,
    /// Qualifying labels, ascending by training frequency
    pub label_scores: Vec<LabelScore>,
}

#[cfg(feature = "csv")]
#[derive(Serialize)]
struct LabelScoreRow<'a> {
    fold: FoldIndex,
    label: &'a str,
    train_frequency: f64,
    test_frequency: f64,
    support: usize,
    precision: f64,
    recall: f64,
    f1: f64,
    balanced_accuracy: f64,
}

/// Result of a complete cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    /// Creation time, UTC
    pub generated_at: DateTime<Utc>,
    /// Configuration the run used
    pub config: EvaluationConfig,
    /// Per-fold reports, in fold order
    pub folds: Vec<FoldReport>,
    /// Cross-fold summary
    pub global: GlobalRecord,
}

impl CrossValidationReport {
    /// Assemble a report from fold reports sorted in any order.
    pub fn new(config: EvaluationConfig, mut folds: Vec<FoldReport>) -> Result<Self> {
        folds.sort_by_key(|f| f.fold);
        let records: Vec<MetricsRecord> = folds.iter().map(|f| f.record).collect();
        let global = GlobalRecord::from_folds(&records)?;

        Ok(CrossValidationReport {
            generated_at: Utc::now(),
            config,
            folds,
            global,
        })
    }

    /// Mean Prediction Bias Coefficient across folds.
    pub fn prediction_bias_coefficient(&self) -> MeanStd {
        self.global.get(MetricKey::FScoreCorrelation)
    }

    /// Per-fold records, in fold order.
    pub fn records(&self) -> Vec<MetricsRecord> {
        self.folds.iter().map(|f| f.record).collect()
    }

    /// Serialize the whole report as pretty JSON.
    ///
    /// Undefined correlations (NaN) are written as `null`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to a file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Saved cross-validation report to {}", path.as_ref().display());
        Ok(())
    }

    /// Parse a report written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON report from a file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Write one CSV row per fold and qualifying label.
    #[cfg(feature = "csv")]
    pub fn write_label_scores_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for fold in &self.folds {
            for score in &fold.label_scores {
                csv_writer.serialize(LabelScoreRow {
                    fold: fold.fold,
                    label: &score.label,
                    train_frequency: score.train_frequency,
                    test_frequency: score.test_frequency,
                    support: score.support,
                    precision: score.precision,
                    recall: score.recall,
                    f1: score.f1,
                    balanced_accuracy: score.balanced_accuracy,
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the per-label CSV to a file.
    #[cfg(feature = "csv")]
    pub fn save_label_scores_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_label_scores_csv(std::io::BufWriter::new(file))
    }

    /// Human-readable table of the global record.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Cross-validation report ({} folds, generated {})\n",
            self.global.num_folds,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        out.push_str(&format!("{:<24}{:>12}{:>12}\n", "metric", "mean", "std"));
        for key in MetricKey::ALL {
            let value = self.global.get(key);
            out.push_str(&format!(
                "{:<24}{:>12.4}{:>12.4}\n",
                key.as_str(),
                value.mean,
                value.std
            ));
        }
        out
    }
}
