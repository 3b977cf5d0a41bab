//! Core infrastructure module.
//!
//! - [`types`]: labels, samples and frequency tables
//! - [`constants`]: configuration defaults and numeric tolerances
//! - [`error`]: error taxonomy and the crate-wide `Result`
//! - [`traits`]: classifier, normalizer and plotter seams

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{PredictionBiasError, Result};
pub use traits::*;
pub use types::*;

use std::sync::Once;

static LOGGING: Once = Once::new();

/// Initialize the logging subsystem.
///
/// `RUST_LOG` defaults to `info` when unset. Safe to call repeatedly and
/// from tests; an already installed logger is left in place.
pub fn initialize_logging() {
    LOGGING.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "info");
        }

        let _ = env_logger::try_init();
        log::debug!("Logging initialized (prediction-bias {})", PREDICTION_BIAS_VERSION);
    });
}

/// Whether [`initialize_logging`] has run.
pub fn is_logging_initialized() -> bool {
    LOGGING.is_completed()
}
