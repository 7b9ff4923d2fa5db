//! Sobol indices of a tensor-train surrogate
//!
//! From one surrogate `t` over `N` variables the engine derives four set
//! tensors:
//! - `st(S)`: variance component, the share of variance due to exactly `S`
//! - `sst(S)`: superset index, `Σ_{T ⊇ S} st(T)`
//! - `cst(S)`: closed index, `Σ_{T ⊆ S} st(T)`
//! - `tst(S)`: total index, `Σ_{T ∩ S ≠ ∅} st(T)`
//!
//! The raw variance tensor comes from cross-approximating the square of the
//! mean-augmented surrogate: with index 0 meaning "averaged out", the entry
//! at a 0/1 pattern is `E[(E[f | x_S])²]`, and the per-core difference of
//! the two states performs the inclusion-exclusion.

use crate::augment::{augment_and_square, collapse_selected};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::sets::{
    hamming_weight, indicator, mean_dimension_tensor, none_indicator, set_choose, to_lower,
    to_superset, to_upper, validate_subset,
};
use ttsa_tensortrain::{AbstractTensorTrain, TensorTrain};

/// Variances at or below this fraction of the second moment count as zero
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// The four Sobol index families of one surrogate
#[derive(Debug, Clone)]
pub struct SensitivityIndices {
    n: usize,
    variance: f64,
    st: TensorTrain<f64>,
    sst: TensorTrain<f64>,
    cst: TensorTrain<f64>,
    tst: TensorTrain<f64>,
}

impl SensitivityIndices {
    /// Build all index tensors of `t`
    pub fn new(t: &TensorTrain<f64>, config: &EngineConfig) -> Result<Self> {
        let n = t.len();
        let squared = augment_and_square(t, 1, &config.cross_options())?;
        let raw = collapse_selected(&squared, 1)?;

        let empty = indicator(&[], n);
        let second_moment = raw.sum();
        let variance = second_moment - raw.evaluate(&empty)?;
        let dims = vec![2; n];

        if variance.is_nan() || variance <= VARIANCE_FLOOR * second_moment.abs() {
            tracing::info!(variance, "surrogate is constant, all indices are zero");
            let zeros = TensorTrain::zeros(&dims);
            return Ok(Self {
                n,
                variance: 0.0,
                st: zeros.clone(),
                sst: zeros.clone(),
                cst: zeros.clone(),
                tst: zeros,
            });
        }

        let mut st = raw.scaled(1.0 / variance);
        st.compress(&config.compression_options())?;
        let at_empty = st.evaluate(&empty)?;
        let st = st.sub(&none_indicator(n)?.scaled(at_empty))?;

        let sst = to_superset(&st)?;
        let cst = to_lower(&st)?;
        let tst = to_upper(&st)?;
        tracing::info!(
            variables = n,
            variance,
            rank = st.rank(),
            "sensitivity indices ready"
        );
        Ok(Self {
            n,
            variance,
            st,
            sst,
            cst,
            tst,
        })
    }

    /// Number of variables
    pub fn num_variables(&self) -> usize {
        self.n
    }

    /// Output variance of the surrogate over its grid
    pub fn total_variance(&self) -> f64 {
        self.variance
    }

    /// Variance component tensor `st`
    pub fn variance_components(&self) -> &TensorTrain<f64> {
        &self.st
    }

    /// Superset index tensor `sst`
    pub fn superset_indices(&self) -> &TensorTrain<f64> {
        &self.sst
    }

    /// Closed index tensor `cst`
    pub fn closed_indices(&self) -> &TensorTrain<f64> {
        &self.cst
    }

    /// Total index tensor `tst`
    pub fn total_indices(&self) -> &TensorTrain<f64> {
        &self.tst
    }

    fn lookup(&self, t: &TensorTrain<f64>, subset: &[usize]) -> Result<f64> {
        validate_subset(subset, self.n)?;
        if subset.is_empty() {
            return Ok(0.0);
        }
        set_choose(t, subset)
    }

    /// Share of variance due to exactly the interaction of `subset`
    pub fn variance_component(&self, subset: &[usize]) -> Result<f64> {
        self.lookup(&self.st, subset)
    }

    /// Share of variance of all interactions containing `subset`
    pub fn superset_index(&self, subset: &[usize]) -> Result<f64> {
        self.lookup(&self.sst, subset)
    }

    /// Share of variance explained by the variables of `subset` alone
    pub fn closed_index(&self, subset: &[usize]) -> Result<f64> {
        self.lookup(&self.cst, subset)
    }

    /// Share of variance of all interactions touching `subset`
    pub fn total_index(&self, subset: &[usize]) -> Result<f64> {
        self.lookup(&self.tst, subset)
    }

    /// Mean dimension `Σ_S |S| st(S)`
    pub fn mean_dimension(&self) -> Result<f64> {
        Ok(self.st.dot(&hamming_weight(self.n)?)?)
    }

    /// Mean dimension of the interactions containing each subset
    pub fn mean_dimension_tensor(&self, config: &EngineConfig) -> Result<TensorTrain<f64>> {
        mean_dimension_tensor(&self.st, &config.cross_options())
    }

    /// Share of the variance touching `denominator` that also touches
    /// `variables`, clamped to `[0, 1]`
    pub fn relative_importance(&self, variables: &[usize], denominator: &[usize]) -> Result<f64> {
        validate_subset(variables, self.n)?;
        validate_subset(denominator, self.n)?;
        let tot_d = self.total_index(denominator)?;
        if tot_d <= VARIANCE_FLOOR {
            return Ok(0.0);
        }
        let mut union: Vec<usize> = variables.iter().chain(denominator).copied().collect();
        union.sort_unstable();
        union.dedup();
        let both = self.total_index(variables)? + tot_d - self.total_index(&union)?;
        Ok((both / tot_d).clamp(0.0, 1.0))
    }
}
