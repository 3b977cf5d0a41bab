//! Error handling and error types for the prediction bias toolkit.
//!
//! Every failure in the metrics core is a pure-function failure: nothing is
//! mutated before the error is returned and the same inputs reproduce the
//! same error, so callers propagate with `?` and never retry.

use std::io;
use thiserror::Error;

/// Main error type for the library.
///
/// Variant fields are the values named in each error message.
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum PredictionBiasError {
    /// A ratio whose denominator is structurally zero
    #[error("Division error: {message}")]
    Division { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Not enough data points for the requested computation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Numerical computation errors (singular systems, non-finite values)
    #[error("Numerical error: {message}")]
    Numerical { message: String },

    /// Failure reported by the external classifier
    #[error("Classifier error: {source}")]
    Classifier {
        #[from]
        source: anyhow::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlDe {
        #[from]
        source: toml::de::Error,
    },

    /// TOML serialization errors
    #[error("TOML serialization error: {source}")]
    TomlSer {
        #[from]
        source: toml::ser::Error,
    },

    /// CSV export errors
    #[cfg(feature = "csv")]
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// Fold-level failure, wrapping the error that aborted the run
    #[error("Fold {fold} failed: {source}")]
    Fold {
        fold: usize,
        #[source]
        source: Box<PredictionBiasError>,
    },
}

/// Type alias for Results using PredictionBiasError
pub type Result<T> = std::result::Result<T, PredictionBiasError>;

impl PredictionBiasError {
    /// Create a division error
    pub fn division<S: Into<String>>(message: S) -> Self {
        PredictionBiasError::Division {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        PredictionBiasError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        PredictionBiasError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an insufficient data error
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        PredictionBiasError::InsufficientData { required, actual }
    }

    /// Create a numerical error
    pub fn numerical<S: Into<String>>(message: S) -> Self {
        PredictionBiasError::Numerical {
            message: message.into(),
        }
    }

    /// Create a classifier error from a message
    pub fn classifier<S: Into<String>>(message: S) -> Self {
        PredictionBiasError::Classifier {
            source: anyhow::anyhow!(message.into()),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        PredictionBiasError::Config {
            message: message.into(),
        }
    }

    /// Attach the index of the fold that produced this error
    pub fn in_fold(self, fold: usize) -> Self {
        match self {
            already @ PredictionBiasError::Fold { .. } => already,
            other => PredictionBiasError::Fold {
                fold,
                source: Box::new(other),
            },
        }
    }

    /// Error with any fold wrapper removed
    pub fn root(&self) -> &PredictionBiasError {
        match self {
            PredictionBiasError::Fold { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            PredictionBiasError::Division { .. } => "division",
            PredictionBiasError::InvalidParameter { .. } => "invalid_parameter",
            PredictionBiasError::DimensionMismatch { .. } => "dimension_mismatch",
            PredictionBiasError::InsufficientData { .. } => "insufficient_data",
            PredictionBiasError::Numerical { .. } => "numerical",
            PredictionBiasError::Classifier { .. } => "classifier",
            PredictionBiasError::Config { .. } => "config",
            PredictionBiasError::IO { .. } => "io",
            PredictionBiasError::Json { .. } => "json",
            PredictionBiasError::TomlDe { .. } | PredictionBiasError::TomlSer { .. } => "toml",
            #[cfg(feature = "csv")]
            PredictionBiasError::Csv { .. } => "csv",
            PredictionBiasError::Fold { source, .. } => source.category(),
        }
    }
}

/// Return early with the given error if the condition does not hold.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
