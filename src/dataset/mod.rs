//! Dataset-side helpers: label frequency tables, vocabulary encodings and
//! k-fold partitioning.

pub mod encoding;
pub mod frequency;
pub mod partition;

pub use encoding::{indicator_matrix, labels_above_threshold, threshold_scores, validate_threshold};
pub use frequency::{
    frequencies, labels_by_frequency, occurrences, sample_frequencies, sample_occurrences,
    LabelSetStatistics,
};
pub use partition::{FoldSplit, KFold};
