//! Matrix cross interpolation for tensor-train construction
//!
//! This crate provides the two matrix kernels used by the two-site tensor
//! cross interpolation:
//! - `RrLU`: Rank-Revealing LU decomposition with full pivoting
//! - `MatrixLUCI`: LU-based Cross Interpolation exposing `C P⁻¹` and `P⁻¹ R`
//!
//! # Example
//!
//! ```
//! use ttsa_matrixci::{from_vec2d, AbstractMatrixCI, MatrixLUCI};
//!
//! let m = from_vec2d(vec![
//!     vec![1.0, 2.0, 3.0],
//!     vec![2.0, 4.0, 6.0],
//!     vec![1.0, 1.0, 1.0],
//! ]);
//!
//! let ci = MatrixLUCI::from_matrix(&m, None).unwrap();
//! assert_eq!(ci.rank(), 2);
//! ```

pub mod error;
pub mod matrixlu;
pub mod matrixluci;
pub mod traits;
pub mod util;

pub use error::{MatrixCIError, Result};
pub use matrixlu::{rrlu, rrlu_inplace, RrLU, RrLUOptions};
pub use matrixluci::MatrixLUCI;
pub use traits::AbstractMatrixCI;
pub use util::{from_vec2d, Matrix, Scalar};
