//! Configuration management for evaluation runs.
//!
//! [`EvaluationConfig`] is the single configuration structure; this module
//! adds file format detection and a small manager that remembers where the
//! active configuration came from.

pub mod core;

pub use self::core::{EvaluationConfig, EvaluationConfigBuilder, PARAMETER_NAMES};

use crate::core::error::{PredictionBiasError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "prediction_bias.toml";

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigFormat {
    /// TOML configuration format
    #[default]
    Toml,
    /// JSON configuration format
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(PredictionBiasError::config(format!(
                "Unsupported config file format for {}. Use .json or .toml",
                path.display()
            ))),
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default configuration values
    Default,
    /// Configuration from file
    File(String),
    /// Configuration from environment variables
    Environment,
    /// Configuration from programmatic API
    Programmatic,
}

/// Configuration plus its provenance
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EvaluationConfig,
    source: ConfigSource,
}

impl ConfigManager {
    /// Manager holding the default configuration
    pub fn new() -> Self {
        ConfigManager {
            config: EvaluationConfig::default(),
            source: ConfigSource::Default,
        }
    }

    /// Load configuration from file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = EvaluationConfig::load_from_file(path)?;
        config.apply_environment_overrides()?;
        Ok(ConfigManager {
            config,
            source: ConfigSource::File(path.to_string_lossy().to_string()),
        })
    }

    /// Load configuration from environment variables
    pub fn from_environment() -> Result<Self> {
        Ok(ConfigManager {
            config: EvaluationConfig::load_from_environment()?,
            source: ConfigSource::Environment,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Get the configuration source
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Replace the configuration; the new one is validated first
    pub fn update(&mut self, new_config: EvaluationConfig) -> Result<()> {
        new_config.validate()?;
        self.config = new_config;
        self.source = ConfigSource::Programmatic;
        Ok(())
    }

    /// Get configuration summary for debugging
    pub fn summary(&self) -> String {
        format!(
            "Configuration Summary:\n\
             Source: {:?}\n\
             Folds: {} (shuffle: {}, seed: {})\n\
             Confidence Threshold: {}\n\
             Fit Degree: {}\n\
             Parallel Folds: {} ({} threads)",
            self.source,
            self.config.num_folds,
            self.config.shuffle,
            self.config.random_seed,
            self.config.confidence_threshold,
            self.config.fit_degree,
            self.config.parallel_folds,
            self.config.effective_num_threads()
        )
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
