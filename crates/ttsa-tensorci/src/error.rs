//! Errors of the cross interpolation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TCIError>;

#[derive(Error, Debug)]
pub enum TCIError {
    /// Grids, pivots or operand trains disagree on the site layout
    #[error("Dimension mismatch: {message}")]
    DimensionMismatch { message: String },

    #[error("Invalid pivot: {message}")]
    InvalidPivot { message: String },

    /// A batch function returned the wrong number of values
    #[error("Batch function returned {got} values for {expected} indices")]
    BatchLengthMismatch { expected: usize, got: usize },

    /// No sites to interpolate over
    #[error("Empty tensor structure")]
    Empty,

    #[error("Matrix CI error: {0}")]
    MatrixCIError(#[from] ttsa_matrixci::MatrixCIError),

    #[error("Tensor train error: {0}")]
    TensorTrainError(#[from] ttsa_tensortrain::TensorTrainError),
}
