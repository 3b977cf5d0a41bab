//! Core configuration structure and builder for evaluation runs.
//!
//! An [`EvaluationConfig`] drives one cross-validated evaluation: how the
//! corpus is split, how scores become label sets and how trend lines are
//! fitted. It can be created programmatically, through the builder, from a
//! `.json` / `.toml` file or from `PBC_*` environment variables.

use crate::config::ConfigFormat;
use crate::core::constants::*;
use crate::core::error::{PredictionBiasError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Names of every configurable parameter, in declaration order.
pub const PARAMETER_NAMES: [&str; 9] = [
    "num_folds",
    "shuffle",
    "random_seed",
    "confidence_threshold",
    "fit_degree",
    "normalize_exposure",
    "parallel_folds",
    "num_threads",
    "plot_correlations",
];

/// Configuration of one cross-validated evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    // Splitting
    /// Number of cross-validation folds
    pub num_folds: usize,
    /// Shuffle samples before splitting
    pub shuffle: bool,
    /// Seed of the shuffling RNG
    pub random_seed: u64,

    // Prediction and analysis
    /// A label is predicted iff its score is strictly greater than this
    pub confidence_threshold: f64,
    /// Degree of the trend line whose value at zero is reported
    pub fit_degree: usize,
    /// Normalize exposure between its worst and best placement
    pub normalize_exposure: bool,

    // Execution
    /// Evaluate folds in parallel
    pub parallel_folds: bool,
    /// Worker threads for parallel folds (0 = all cores)
    pub num_threads: usize,
    /// Send frequency-versus-metric plots to the plotter
    pub plot_correlations: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            num_folds: DEFAULT_NUM_FOLDS,
            shuffle: true,
            random_seed: DEFAULT_RANDOM_SEED,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            fit_degree: DEFAULT_FIT_DEGREE,
            normalize_exposure: true,
            parallel_folds: false,
            num_threads: DEFAULT_NUM_THREADS,
            plot_correlations: false,
        }
    }
}

impl EvaluationConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.num_folds < 2 {
            return Err(PredictionBiasError::invalid_parameter(
                "num_folds",
                self.num_folds.to_string(),
                "must be at least 2",
            ));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PredictionBiasError::invalid_parameter(
                "confidence_threshold",
                self.confidence_threshold.to_string(),
                "must be in range [0.0, 1.0]",
            ));
        }

        if self.fit_degree == 0 || self.fit_degree > MAX_FIT_DEGREE {
            return Err(PredictionBiasError::invalid_parameter(
                "fit_degree",
                self.fit_degree.to_string(),
                format!("must be between 1 and {}", MAX_FIT_DEGREE),
            ));
        }

        Ok(())
    }

    /// Validate against a concrete corpus size
    pub fn validate_for_samples(&self, num_samples: usize) -> Result<()> {
        self.validate()?;
        if self.num_folds > num_samples {
            return Err(PredictionBiasError::invalid_parameter(
                "num_folds",
                self.num_folds.to_string(),
                format!("cannot exceed the number of samples ({})", num_samples),
            ));
        }
        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            PredictionBiasError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: EvaluationConfig = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from `PBC_*` environment variables over the defaults
    pub fn load_from_environment() -> Result<Self> {
        let mut config = EvaluationConfig::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply `PBC_*` environment variable overrides to this configuration
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup such as the process environment.
    ///
    /// Every parameter `name` is looked up as `PBC_<NAME>`; unset variables
    /// leave the current value untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in PARAMETER_NAMES {
            let variable = format!("{}{}", ENV_PREFIX, name.to_uppercase());
            if let Some(value) = lookup(&variable) {
                log::debug!("Overriding {} from {}", name, variable);
                self.set_parameter(name, value.trim())?;
            }
        }
        self.validate()
    }

    /// Set one parameter from its string form
    pub fn set_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "num_folds" => self.num_folds = parse_value(name, value)?,
            "shuffle" => self.shuffle = parse_value(name, value)?,
            "random_seed" => self.random_seed = parse_value(name, value)?,
            "confidence_threshold" => self.confidence_threshold = parse_value(name, value)?,
            "fit_degree" => self.fit_degree = parse_value(name, value)?,
            "normalize_exposure" => self.normalize_exposure = parse_value(name, value)?,
            "parallel_folds" => self.parallel_folds = parse_value(name, value)?,
            "num_threads" => self.num_threads = parse_value(name, value)?,
            "plot_correlations" => self.plot_correlations = parse_value(name, value)?,
            _ => {
                return Err(PredictionBiasError::config(format!(
                    "Unknown configuration parameter: {}",
                    name
                )))
            }
        }
        Ok(())
    }

    /// All parameters as strings, keyed by parameter name
    pub fn as_parameter_map(&self) -> HashMap<String, String> {
        let values = [
            self.num_folds.to_string(),
            self.shuffle.to_string(),
            self.random_seed.to_string(),
            self.confidence_threshold.to_string(),
            self.fit_degree.to_string(),
            self.normalize_exposure.to_string(),
            self.parallel_folds.to_string(),
            self.num_threads.to_string(),
            self.plot_correlations.to_string(),
        ];
        PARAMETER_NAMES
            .iter()
            .map(|name| name.to_string())
            .zip(values)
            .collect()
    }

    /// Get the effective number of threads (0 means use all available cores)
    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| PredictionBiasError::config(format!("Invalid {}: {}", name, value)))
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct EvaluationConfigBuilder {
    config: EvaluationConfig,
    validation_errors: Vec<String>,
}

impl EvaluationConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        EvaluationConfigBuilder {
            config: EvaluationConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the number of folds
    pub fn num_folds(mut self, folds: usize) -> Self {
        if folds < 2 {
            self.validation_errors
                .push("num_folds must be at least 2".to_string());
        }
        self.config.num_folds = folds;
        self
    }

    /// Enable or disable shuffling before splitting
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.config.shuffle = shuffle;
        self
    }

    /// Set the shuffling seed
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Set the confidence threshold
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        if !(0.0..=1.0).contains(&threshold) {
            self.validation_errors
                .push("confidence_threshold must be in range [0.0, 1.0]".to_string());
        }
        self.config.confidence_threshold = threshold;
        self
    }

    /// Set the trend line degree
    pub fn fit_degree(mut self, degree: usize) -> Self {
        if degree == 0 || degree > MAX_FIT_DEGREE {
            self.validation_errors
                .push(format!("fit_degree must be between 1 and {}", MAX_FIT_DEGREE));
        }
        self.config.fit_degree = degree;
        self
    }

    /// Enable or disable exposure normalization
    pub fn normalize_exposure(mut self, normalize: bool) -> Self {
        self.config.normalize_exposure = normalize;
        self
    }

    /// Enable or disable parallel fold evaluation
    pub fn parallel_folds(mut self, parallel: bool) -> Self {
        self.config.parallel_folds = parallel;
        self
    }

    /// Set the number of worker threads
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Enable or disable correlation plots
    pub fn plot_correlations(mut self, plot: bool) -> Self {
        self.config.plot_correlations = plot;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EvaluationConfig> {
        if !self.validation_errors.is_empty() {
            return Err(PredictionBiasError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for EvaluationConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = EvaluationConfig::default();
        assert_eq!(config.num_folds, 5);
        assert!(config.shuffle);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.fit_degree, 1);
        assert!(config.normalize_exposure);
        assert!(!config.parallel_folds);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EvaluationConfig::default();

        config.num_folds = 1;
        assert!(config.validate().is_err());

        config.num_folds = 3;
        config.confidence_threshold = 1.2;
        assert!(config.validate().is_err());

        config.confidence_threshold = 1.0;
        config.fit_degree = 4;
        assert!(matches!(
            config.validate(),
            Err(PredictionBiasError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_for_samples() {
        let config = EvaluationConfig::default();
        assert!(config.validate_for_samples(5).is_ok());
        assert!(matches!(
            config.validate_for_samples(4),
            Err(PredictionBiasError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = EvaluationConfigBuilder::new()
            .num_folds(10)
            .shuffle(false)
            .confidence_threshold(0.3)
            .fit_degree(2)
            .parallel_folds(true)
            .num_threads(4)
            .build()
            .unwrap();

        assert_eq!(config.num_folds, 10);
        assert!(!config.shuffle);
        assert_eq!(config.confidence_threshold, 0.3);
        assert_eq!(config.fit_degree, 2);
        assert_eq!(config.effective_num_threads(), 4);
    }

    #[test]
    fn test_config_builder_collects_errors() {
        let err = EvaluationConfigBuilder::new()
            .num_folds(1)
            .confidence_threshold(-0.1)
            .build()
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("num_folds"));
        assert!(message.contains("confidence_threshold"));
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = EvaluationConfig::default();
        config
            .apply_overrides(lookup(&[
                ("PBC_NUM_FOLDS", "3"),
                ("PBC_SHUFFLE", "false"),
                ("PBC_CONFIDENCE_THRESHOLD", " 0.25 "),
            ]))
            .unwrap();

        assert_eq!(config.num_folds, 3);
        assert!(!config.shuffle);
        assert_eq!(config.confidence_threshold, 0.25);
        assert_eq!(config.fit_degree, DEFAULT_FIT_DEGREE);
    }

    #[test]
    fn test_environment_overrides_reject_bad_values() {
        let mut config = EvaluationConfig::default();
        let result = config.apply_overrides(lookup(&[("PBC_NUM_FOLDS", "many")]));
        assert!(matches!(result, Err(PredictionBiasError::Config { .. })));

        let result = config.apply_overrides(lookup(&[("PBC_FIT_DEGREE", "5")]));
        assert!(matches!(result, Err(PredictionBiasError::InvalidParameter { .. })));
    }

    #[test]
    fn test_parameter_map_round_trips_through_set_parameter() {
        let original = EvaluationConfigBuilder::new()
            .num_folds(7)
            .random_seed(9)
            .plot_correlations(true)
            .build()
            .unwrap();

        let mut rebuilt = EvaluationConfig::default();
        for (name, value) in original.as_parameter_map() {
            rebuilt.set_parameter(&name, &value).unwrap();
        }
        assert_eq!(rebuilt, original);
        assert!(rebuilt.set_parameter("learning_rate", "0.1").is_err());
    }
}
