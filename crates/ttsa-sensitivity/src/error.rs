//! Error types for the sensitivity layer

use thiserror::Error;
use ttsa_tensorci::TCIError;
use ttsa_tensortrain::TensorTrainError;

/// Result type for sensitivity operations
pub type Result<T> = std::result::Result<T, SensitivityError>;

/// Errors raised by the sensitivity engines
#[derive(Error, Debug)]
pub enum SensitivityError {
    /// A variable appears twice in one subset
    #[error("Variable {variable} is repeated")]
    DuplicateVariable { variable: usize },

    /// A variable index outside the ground set
    #[error("Variable {variable} is out of range for {n} variables")]
    VariableOutOfRange { variable: usize, n: usize },

    /// A variable is both forced in and forced out of an enumeration
    #[error("Variable {variable} is both included and excluded")]
    OverlappingSelection { variable: usize },

    /// The tensor is not indexed by subsets
    #[error("Expected a set tensor (all modes of size 2), got modes {dims:?}")]
    NotASetTensor { dims: Vec<usize> },

    /// Bad scalar argument
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No model registered under the key
    #[error("Unknown model '{key}'")]
    UnknownModel { key: String },

    /// Ill-formed model description
    #[error("Invalid model: {message}")]
    InvalidModel { message: String },

    /// Configuration the engine does not support
    #[error("Not implemented: {feature}")]
    NotImplemented { feature: String },

    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or report (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tensor train error
    #[error("Tensor train error: {0}")]
    TensorTrain(#[from] TensorTrainError),

    /// Cross approximation error
    #[error("Cross approximation error: {0}")]
    Cross(#[from] TCIError),
}

impl SensitivityError {
    /// Short machine-readable category used in error documents
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateVariable { .. }
            | Self::VariableOutOfRange { .. }
            | Self::OverlappingSelection { .. }
            | Self::NotASetTensor { .. }
            | Self::InvalidArgument { .. } => "validation",
            Self::UnknownModel { .. } | Self::InvalidModel { .. } => "model",
            Self::NotImplemented { .. } => "not_implemented",
            Self::Io(_) | Self::Json(_) => "configuration",
            Self::TensorTrain(_) | Self::Cross(_) => "numerical",
        }
    }
}
