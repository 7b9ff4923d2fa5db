//! Directional covariance
//!
//! The directional covariance of a subset `S` is the covariance between the
//! model and the direction `g_S(x) = Σ_{n ∈ S} u_n(x_n)`, divided by the
//! standard deviation of `g_S`, where `u_n` maps grid position `k` of axis
//! `n` to `k / (I_n - 1)`. Its sign tells whether the output grows or shrinks
//! when the variables of `S` increase together. All `2^N` values are held in
//! one set tensor, scaled so that the largest magnitude is 1.
//!
//! Every mode is doubled: positions `0..I` stand for "variable not in `S`"
//! (direction contributes nothing), `I..2I` for "variable in `S`". Averaging
//! each half then yields a set tensor.

use crate::augment::{block_means, repeat_modes};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::sets::{close_chain, indicator, none_indicator, validate_subset};
use ttsa_tensorci::cross_elementwise;
use ttsa_tensortrain::{hadamard, max_abs, AbstractTensorTrain, Tensor3, TensorTrain};

/// Normalized directional covariances of one surrogate
#[derive(Debug, Clone)]
pub struct DirectionalCovariance {
    n: usize,
    result: TensorTrain<f64>,
}

/// `Σ_n u_n(s_n)` on the doubled modes, as a rank-2 train
fn directions(site_dims: &[usize]) -> Result<TensorTrain<f64>> {
    // state 1: nothing added yet, state 0: one term added
    let cores = site_dims
        .iter()
        .map(|&i| {
            let mut core = Tensor3::zeros(2, 2 * i, 2);
            for s in 0..2 * i {
                core.set(0, s, 0, 1.0);
                core.set(1, s, 1, 1.0);
            }
            for s in 0..i {
                let u = if i > 1 { s as f64 / (i - 1) as f64 } else { 0.0 };
                core.set(1, i + s, 0, u);
            }
            core
        })
        .collect();
    Ok(TensorTrain::new(close_chain(cores, 1, 0))?)
}

impl DirectionalCovariance {
    /// Build the covariance tensor of surrogate `t`
    pub fn new(t: &TensorTrain<f64>, config: &EngineConfig) -> Result<Self> {
        let n = t.len();
        let dims = t.site_dims();
        let options = config.cross_options();
        let halves = |site: usize| {
            let i = dims[site];
            vec![0..i, i..2 * i]
        };

        let centered = t.add_constant(-t.mean())?;

        // Center every direction within each selection state
        let vecs = directions(&dims)?;
        let vec_means = vecs.map_site_tensors(|site, core| {
            let i = dims[site];
            let lower = core.mean_over_sites(0..i);
            let upper = core.mean_over_sites(i..2 * i);
            let mut slices = vec![lower; i];
            slices.extend(std::iter::repeat(upper).take(i));
            Tensor3::from_slices(&slices, core.left_dim(), core.right_dim())
        })?;
        let vecs = vecs.sub(&vec_means)?;

        let variance = block_means(&hadamard(&vecs, &vecs)?, halves)?;
        // ∅ has no direction; keep the quotient finite there
        let variance = variance.add(&none_indicator(n)?)?;

        let doubled = repeat_modes(&centered, 2)?;
        let products = cross_elementwise(&[&doubled, &vecs], |x: &[f64]| x[0] * x[1], &options)?;
        let covariance = block_means(&products.tensor_train, halves)?;

        let mut result = cross_elementwise(
            &[&covariance, &variance],
            |x: &[f64]| if x[1] > 0.0 { x[0] / x[1].sqrt() } else { 0.0 },
            &options,
        )?
        .tensor_train;

        let (peak, _) = max_abs(&result, &config.optimize_options())?;
        if peak != 0.0 {
            result.scale(1.0 / peak.abs());
        }
        tracing::info!(variables = n, rank = result.rank(), "directional covariance ready");
        Ok(Self { n, result })
    }

    /// Normalized covariance of `subset`; 0 for the empty subset
    pub fn index(&self, subset: &[usize]) -> Result<f64> {
        validate_subset(subset, self.n)?;
        if subset.is_empty() {
            return Ok(0.0);
        }
        Ok(self.result.evaluate(&indicator(subset, self.n))?)
    }

    /// The underlying set tensor
    pub fn tensor(&self) -> &TensorTrain<f64> {
        &self.result
    }
}
