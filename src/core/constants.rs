//! System constants and configuration defaults.

/// Default number of cross-validation folds.
pub const DEFAULT_NUM_FOLDS: usize = 5;

/// Default confidence threshold; a label is predicted iff its score exceeds it.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Default degree of the trend line whose value at zero is reported.
pub const DEFAULT_FIT_DEGREE: usize = 1;

/// Highest supported trend line degree.
pub const MAX_FIT_DEGREE: usize = 3;

/// Default random seed for fold shuffling.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default number of threads (0 = all cores).
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Pivot magnitude, relative to the largest normal matrix entry, below which
/// a least squares system is treated as singular.
pub const SINGULAR_PIVOT_EPSILON: f64 = 1e-12;

/// Variance below which an input is treated as constant in correlation.
pub const CONSTANT_INPUT_EPSILON: f64 = 1e-15;

/// Prefix of the environment variables read by the configuration layer.
pub const ENV_PREFIX: &str = "PBC_";

/// Version information.
pub const PREDICTION_BIAS_VERSION: &str = env!("CARGO_PKG_VERSION");
