//! High-level cross approximation entry points
//!
//! [`cross_grid`] fits a function sampled on a Cartesian product of 1-D
//! grids; [`cross_elementwise`] fits an elementwise map of existing tensor
//! trains.

use crate::error::{Result, TCIError};
use crate::indexset::MultiIndex;
use crate::source::{CrossSource, ElementwiseSource, FunctionSource};
use crate::tensorci2::{run_tci2, CrossOptions};
use ttsa_tensortrain::{TTScalar, TensorTrain};

/// Outcome of a cross approximation
#[derive(Debug, Clone)]
pub struct CrossResult<T: TTScalar> {
    /// Fitted tensor train
    pub tensor_train: TensorTrain<T>,
    /// Maximum bond dimension after each half-sweep
    pub ranks: Vec<usize>,
    /// Normalized bond error after each half-sweep
    pub errors: Vec<f64>,
    /// Distinct entries computed
    pub n_evals: usize,
    /// Whether the tolerance was met within the sweep budget
    pub converged: bool,
}

fn run_source<T: TTScalar, S: CrossSource<T>>(
    source: &mut S,
    options: &CrossOptions,
) -> Result<CrossResult<T>> {
    let (tci, ranks, errors) = run_tci2(source, Vec::new(), options)?;
    Ok(CrossResult {
        tensor_train: tci.to_tensor_train()?,
        ranks,
        errors,
        n_evals: source.num_evals(),
        converged: tci.is_converged(),
    })
}

/// Cross-approximate `f` on the grid `grids[0] × grids[1] × ...`
///
/// `f` receives a batch of coordinate rows (one value per grid) and returns
/// one value per row.
pub fn cross_grid<F>(f: F, grids: &[Vec<f64>], options: &CrossOptions) -> Result<CrossResult<f64>>
where
    F: Fn(&[Vec<f64>]) -> Vec<f64>,
{
    if grids.is_empty() {
        return Err(TCIError::Empty);
    }
    if let Some(p) = grids.iter().position(|g| g.is_empty()) {
        return Err(TCIError::DimensionMismatch {
            message: format!("grid {p} has no points"),
        });
    }
    let local_dims: Vec<usize> = grids.iter().map(|g| g.len()).collect();
    let batched = |indices: &[MultiIndex]| {
        let rows: Vec<Vec<f64>> = indices
            .iter()
            .map(|idx| idx.iter().zip(grids).map(|(&i, g)| g[i]).collect())
            .collect();
        f(&rows)
    };
    let mut source = FunctionSource::new(local_dims, batched);
    let result = run_source(&mut source, options)?;
    tracing::debug!(
        n_evals = result.n_evals,
        rank = result.ranks.last().copied().unwrap_or(1),
        converged = result.converged,
        "grid cross approximation finished"
    );
    Ok(result)
}

/// Cross-approximate `f(t_1[i], ..., t_k[i])` for trains of equal shape
pub fn cross_elementwise<T, F>(
    tensors: &[&TensorTrain<T>],
    f: F,
    options: &CrossOptions,
) -> Result<CrossResult<T>>
where
    T: TTScalar,
    F: Fn(&[T]) -> T,
{
    let mut source = ElementwiseSource::new(tensors, f)?;
    run_source(&mut source, options)
}
