//! Error type of the LU kernels

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatrixCIError {
    /// A factor picked up a NaN during elimination
    #[error("NaN values encountered in {matrix}")]
    NaNEncountered { matrix: String },
}

pub type Result<T> = std::result::Result<T, MatrixCIError>;
