//! Global sensitivity analysis on tensor-train surrogates
//!
//! A model is sampled once into a tensor-train surrogate; every index is
//! then derived from that surrogate without touching the full grid:
//! - [`SensitivityIndices`]: variance components and the superset, closed
//!   and total Sobol indices of all `2^N` variable subsets
//! - [`DirectionalCovariance`]: signed, normalized covariance between the
//!   output and joint increases of the variables of a subset
//! - [`games`]: cooperative-game metrics (Shapley, Banzhaf, Harsanyi) and
//!   property checks on set tensors
//! - [`subspace`]: axis-aligned subspaces of highest or lowest variance
//! - [`report`]: the JSON combination and index listings
//!
//! # Example
//!
//! ```no_run
//! use ttsa_sensitivity::{build_surrogate, EngineConfig, ModelRegistry, SensitivityIndices};
//!
//! let registry = ModelRegistry::with_builtins();
//! let config = EngineConfig::default();
//! let surrogate = build_surrogate(&registry.resolve("linear").unwrap(), &config).unwrap();
//! let indices = SensitivityIndices::new(&surrogate.tensor, &config).unwrap();
//! println!("first-order index of x_1: {}", indices.variance_component(&[0]).unwrap());
//! ```

pub mod augment;
pub mod config;
pub mod dircov;
pub mod enumeration;
pub mod error;
pub mod games;
pub mod indices;
pub mod model;
pub mod registry;
pub mod report;
pub mod sets;
pub mod subspace;

pub use augment::augment_and_square;
pub use config::EngineConfig;
pub use dircov::DirectionalCovariance;
pub use enumeration::{combinations, order_query, power_set, PowerSet};
pub use error::{Result, SensitivityError};
pub use games::Verdict;
pub use indices::{SensitivityIndices, VARIANCE_FLOOR};
pub use model::{build_surrogate, Axis, BatchFunction, Domain, ModelSource, Surrogate};
pub use registry::ModelRegistry;
pub use report::{combination_listing, index_listing, ErrorDocument, IndexListing};
pub use sets::{
    cardinality_deviation, complement, from_lower, from_superset, from_upper, hamming_eq_mask,
    hamming_weight, largest_k_tuple, mean_dimension_tensor, none_indicator, set_choose, set_dump,
    to_lower, to_superset, to_upper,
};
pub use subspace::{best_subspace, subspace_variances, Subspace, SubspaceTarget};
pub use ttsa_tensortrain::{maximize, minimize, TensorTrain};
