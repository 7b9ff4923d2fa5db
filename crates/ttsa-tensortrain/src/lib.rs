//! Tensor train library
//!
//! This crate provides the tensor train representation used by the cross
//! interpolation and sensitivity layers:
//! - `TensorTrain`: the core chain and its evaluation
//! - Arithmetic (add, subtract, scale) and contractions (hadamard, dot, norm)
//! - LU-based compression
//! - Extremum search (`maximize`, `minimize`, `max_abs`)
//!
//! # Example
//!
//! ```
//! use ttsa_tensortrain::{AbstractTensorTrain, TensorTrain};
//!
//! let tt = TensorTrain::<f64>::constant(&[2, 3, 2], 1.0);
//! assert_eq!(tt.evaluate(&[0, 1, 1]).unwrap(), 1.0);
//! assert_eq!(tt.sum(), 12.0);
//! ```

pub mod arithmetic;
pub mod compression;
pub mod contraction;
pub mod error;
pub mod optimize;
pub mod tensortrain;
pub mod traits;
pub mod types;

pub use compression::CompressionOptions;
pub use contraction::{dot, hadamard};
pub use error::{Result, TensorTrainError};
pub use optimize::{max_abs, maximize, minimize, OptimizeOptions};
pub use tensortrain::TensorTrain;
pub use traits::{AbstractTensorTrain, TTScalar};
pub use types::{LocalIndex, MultiIndex, Tensor3};
