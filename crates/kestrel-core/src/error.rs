//! Error types for model, state and snapshot operations.

use thiserror::Error;

/// Errors raised while building models or evaluating state operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid dimension for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Unknown joint: {0}")]
    UnknownJoint(String),
    #[error("Unknown frame id {0}")]
    UnknownFrame(usize),
    #[error("Name already used in model: {0}")]
    DuplicateName(String),
    #[error("Invalid limits for joint {joint}: [{lower}, {upper}] must be finite and ordered")]
    InvalidLimits { joint: String, lower: f64, upper: f64 },
    #[error("Invalid activation bounds: {0}")]
    InvalidBounds(String),
    #[error("Invalid activation weights: {0}")]
    InvalidWeights(String),
}

impl ModelError {
    /// Shorthand for a dimension mismatch on the named quantity
    pub fn dimension(what: &'static str, expected: usize, got: usize) -> Self {
        ModelError::DimensionMismatch { what, expected, got }
    }
}

/// Result type for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Check that a vector/matrix dimension matches
pub(crate) fn check_dim(what: &'static str, expected: usize, got: usize) -> ModelResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(ModelError::dimension(what, expected, got))
    }
}
