//! Error types for cost models

use kestrel_core::ModelError;
use thiserror::Error;

/// Cost model errors
#[derive(Debug, Error)]
pub enum CostError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Invalid dimension for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Activation has nr = {got}, but the residual has dimension {expected}")]
    ActivationDimension { expected: usize, got: usize },
    #[error("Unknown frame: {0}")]
    UnknownFrame(String),
    #[error("Cost item '{0}' already exists")]
    AlreadyExists(String),
    #[error("Cost item '{0}' does not exist")]
    NotFound(String),
    #[error("Cost item '{name}' has nu = {got}, but the sum expects {expected}")]
    NuMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("Invalid weight {weight} for cost item '{name}'")]
    InvalidWeight { name: String, weight: f64 },
    #[error("Cost data does not match the model: {0}")]
    DataMismatch(String),
    #[error("Invalid cost configuration: {0}")]
    Config(String),
    #[error("Cost configuration JSON error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for cost operations
pub type CostResult<T> = std::result::Result<T, CostError>;

/// Check that a vector/matrix dimension matches
pub(crate) fn check_dim(what: &'static str, expected: usize, got: usize) -> CostResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(CostError::DimensionMismatch { what, expected, got })
    }
}
