//! Core data types for the prediction bias toolkit.
//!
//! Labels are plain strings and label sets are ordered sets so that every
//! traversal (frequency tables, vocabularies, reports) is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Category identifier carried by a document.
pub type Label = String;

/// Set of labels carried by one document. May be empty.
pub type LabelSet = BTreeSet<Label>;

/// Absolute number of samples carrying each label.
pub type OccurrenceTable = BTreeMap<Label, usize>;

/// Proportion of samples carrying each label, in `[0, 1]`.
pub type FrequencyTable = BTreeMap<Label, f64>;

/// Confidence value produced by a classifier for one label of one sample.
pub type Score = f64;

/// Index of a fold in k-fold cross-validation (0-based).
pub type FoldIndex = usize;

/// Read an `f64` that may have been written as `null`.
///
/// `serde_json` writes NaN as `null`; undefined correlations read back as NaN.
pub(crate) fn nan_from_null<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Immutable labeled document as produced by a corpus loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    text: String,
    labels: LabelSet,
}

impl Sample {
    /// Create a sample from its text and labels.
    pub fn new<T, I, L>(text: T, labels: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        Sample {
            text: text.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Labels carried by the document.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Whether the document carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Copy of this sample with its text replaced, labels untouched.
    pub fn with_text<T: Into<String>>(&self, text: T) -> Self {
        Sample {
            text: text.into(),
            labels: self.labels.clone(),
        }
    }
}

/// Per-label metric the correlation analysis is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetMetric {
    /// Per-label precision
    Precision,
    /// Per-label recall
    Recall,
    /// Per-label F1-score; correlated with frequency this yields the PBC
    FScore,
}

impl TargetMetric {
    /// All metrics correlated per fold, in report order.
    pub const ALL: [TargetMetric; 3] = [
        TargetMetric::Precision,
        TargetMetric::Recall,
        TargetMetric::FScore,
    ];

    /// Axis title used when plotting this metric.
    pub fn axis_title(&self) -> &'static str {
        match self {
            TargetMetric::Precision => "Precision",
            TargetMetric::Recall => "Recall",
            TargetMetric::FScore => "F-score",
        }
    }
}

impl fmt::Display for TargetMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetMetric::Precision => write!(f, "precision"),
            TargetMetric::Recall => write!(f, "recall"),
            TargetMetric::FScore => write!(f, "fscore"),
        }
    }
}
