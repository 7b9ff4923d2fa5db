//! Errors of tensor train construction and arithmetic

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TensorTrainError>;

#[derive(Error, Debug)]
pub enum TensorTrainError {
    /// Bond dimensions of neighbouring cores disagree
    #[error("Dimension mismatch: tensor at site {site} has incompatible dimensions")]
    DimensionMismatch { site: usize },

    /// Site dimensions of two trains disagree
    #[error("Site dimension mismatch at site {site}: {left} vs {right}")]
    SiteDimensionMismatch {
        site: usize,
        left: usize,
        right: usize,
    },

    #[error("Index out of bounds: index {index} at site {site} (max: {max})")]
    IndexOutOfBounds { site: usize, index: usize, max: usize },

    /// A multi-index does not have one entry per site
    #[error("Index set length mismatch: expected {expected}, got {got}")]
    IndexLengthMismatch { expected: usize, got: usize },

    #[error("Tensor train is empty")]
    Empty,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Failure in the LU kernel
    #[error(transparent)]
    Matrix(#[from] ttsa_matrixci::MatrixCIError),
}
