//! Tensor Cross Interpolation (TCI) library
//!
//! This crate builds tensor trains from black-box samples with the two-site
//! TCI algorithm, evaluating only a small fraction of the full grid.
//!
//! # Main entry points
//!
//! - `crossinterpolate2`: closure API over multi-indices
//! - `cross_grid`: a function of real coordinates on a product grid
//! - `cross_elementwise`: an elementwise map of existing tensor trains
//!
//! # Example
//!
//! ```
//! use ttsa_tensorci::{cross_grid, CrossOptions};
//! use ttsa_tensortrain::AbstractTensorTrain;
//!
//! let grid: Vec<f64> = (0..8).map(|i| i as f64).collect();
//! let grids = vec![grid.clone(), grid];
//! let f = |rows: &[Vec<f64>]| rows.iter().map(|x| x[0] + x[1] + 1.0).collect::<Vec<f64>>();
//!
//! let result = cross_grid(f, &grids, &CrossOptions::default()).unwrap();
//! assert!((result.tensor_train.evaluate(&[3, 4]).unwrap() - 8.0).abs() < 1e-8);
//! ```

pub mod cached_function;
pub mod cross;
pub mod error;
pub mod indexset;
pub mod source;
pub mod tensorci2;

pub use cached_function::CachedFunction;
pub use cross::{cross_elementwise, cross_grid, CrossResult};
pub use error::{Result, TCIError};
pub use indexset::{IndexSet, LocalIndex, MultiIndex};
pub use source::{CrossSource, ElementwiseSource, FunctionSource};
pub use tensorci2::{crossinterpolate2, run_tci2, CrossOptions, TensorCI2};
