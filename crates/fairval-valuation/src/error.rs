use std::time::Duration;

use fairval_core::{AcquisitionError, ConfigError, ValidationError};
use thiserror::Error;

/// Failure of a valuation request at any stage.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValuationError {
    /// Inputs that can never produce a meaningful valuation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Model parameters outside the model's domain.
    #[error("invalid model parameters: {0}")]
    InvalidParameters(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error("valuation did not finish within {after:?}")]
    Timeout { after: Duration },
}

impl ValuationError {
    /// Stable identifier for the failing stage.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::Validation(_) => "input",
            Self::InvalidParameters(_) | Self::Config(_) => "model",
            Self::Acquisition(_) => "acquisition",
            Self::Timeout { .. } => "timeout",
        }
    }
}
