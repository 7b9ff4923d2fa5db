//! Axis-aligned subspaces of extreme variance
//!
//! Fixing some variables at grid values and letting the rest vary leaves a
//! subspace whose output variance tells how much uncertainty the free
//! variables still carry. Every such subspace is one entry of a tensor whose
//! modes have one extra "free" index in front.

use crate::augment::{augment_and_square, mean_augment};
use crate::config::EngineConfig;
use crate::error::{Result, SensitivityError};
use crate::sets::hamming_eq_mask;
use ttsa_tensorci::{cross_elementwise, CrossOptions};
use ttsa_tensortrain::{hadamard, maximize, minimize, AbstractTensorTrain, TensorTrain};

/// Which end of the variance range to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubspaceTarget {
    Highest,
    Lowest,
}

/// A subspace and its variance
#[derive(Debug, Clone, PartialEq)]
pub struct Subspace {
    /// Grid index of every fixed variable, `None` for the free ones
    pub point: Vec<Option<usize>>,
    pub variance: f64,
}

impl Subspace {
    /// 0-based free variables
    pub fn free_variables(&self) -> Vec<usize> {
        self.point
            .iter()
            .enumerate()
            .filter_map(|(v, p)| p.is_none().then_some(v))
            .collect()
    }
}

/// Variance of `t` over every axis-aligned subspace
///
/// Mode `n` grows from `I` to `I + 1`: index 0 leaves the variable free and
/// index `1 + s` fixes it at grid value `s`. The entry is
/// `E[t²] - E[t]²` over the free variables.
pub fn subspace_variances(
    t: &TensorTrain<f64>,
    options: &CrossOptions,
) -> Result<TensorTrain<f64>> {
    let squared = cross_elementwise(&[t], |x: &[f64]| x[0] * x[0], options)?;
    let second_moment = mean_augment(&squared.tensor_train, 1)?;
    let squared_mean = augment_and_square(t, 1, options)?;
    Ok(second_moment.sub(&squared_mean)?)
}

/// Subspace with `ndim` free variables whose variance is highest or lowest
pub fn best_subspace(
    t: &TensorTrain<f64>,
    ndim: usize,
    target: SubspaceTarget,
    config: &EngineConfig,
) -> Result<Subspace> {
    let n = t.len();
    if n == 0 || ndim > n {
        return Err(SensitivityError::InvalidArgument {
            message: format!("subspace dimension must lie in 0..={n}, got {ndim}"),
        });
    }
    let mut variances = subspace_variances(t, &config.cross_options())?;
    variances.compress(&config.compression_options())?;

    // 1 where exactly n - ndim variables are fixed
    let dims = t.site_dims();
    let mask = hamming_eq_mask(n, n - ndim)?.map_site_tensors(|site, core| {
        let states: Vec<usize> = std::iter::once(0)
            .chain(std::iter::repeat(1).take(dims[site]))
            .collect();
        core.select_sites(&states)
    })?;

    let penalty = 2.0 * variances.norm() + 1.0;
    let outside = mask.sub(&TensorTrain::ones(&variances.site_dims()))?;
    let masked = hadamard(&variances, &mask)?;
    let options = config.optimize_options();
    let (_, index) = match target {
        SubspaceTarget::Highest => maximize(&masked.add(&outside.scaled(penalty))?, &options)?,
        SubspaceTarget::Lowest => minimize(&masked.sub(&outside.scaled(penalty))?, &options)?,
    };
    let variance = variances.evaluate(&index)?;
    let point = index.iter().map(|&i| i.checked_sub(1)).collect();
    tracing::debug!(ndim, ?target, variance, "best subspace");
    Ok(Subspace { point, variance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ttsa_tensorci::cross_grid;

    /// f(i, j, k) = i j + k on {0, 1, 2}^3
    fn product_plus_offset() -> TensorTrain<f64> {
        let grids = vec![vec![0.0, 1.0, 2.0]; 3];
        let f = |rows: &[Vec<f64>]| rows.iter().map(|x| x[0] * x[1] + x[2]).collect::<Vec<f64>>();
        cross_grid(f, &grids, &CrossOptions::default())
            .unwrap()
            .tensor_train
    }

    fn f(x: &[usize]) -> f64 {
        (x[0] * x[1] + x[2]) as f64
    }

    /// Variance over the free variables of `point`
    fn brute_variance(point: &[Option<usize>]) -> f64 {
        let mut values = Vec::new();
        for a in 0..3 {
            for b in 0..3 {
                for c in 0..3 {
                    let x = [a, b, c];
                    if point.iter().zip(&x).all(|(p, &v)| p.map_or(true, |p| p == v)) {
                        values.push(f(&x));
                    }
                }
            }
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_subspace_variances_match_brute_force() {
        let v = subspace_variances(&product_plus_offset(), &CrossOptions::default()).unwrap();
        assert_eq!(v.site_dims(), vec![4, 4, 4]);
        let cases: [[Option<usize>; 3]; 4] = [
            [None, None, None],
            [Some(2), None, Some(0)],
            [None, Some(0), Some(1)],
            [Some(1), Some(2), Some(2)],
        ];
        for point in cases {
            let index: Vec<usize> = point.iter().map(|p| p.map_or(0, |s| s + 1)).collect();
            assert_abs_diff_eq!(v.evaluate(&index).unwrap(), brute_variance(&point), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_best_subspace_of_one_free_variable() {
        let t = product_plus_offset();
        let config = EngineConfig::default();

        let high = best_subspace(&t, 1, SubspaceTarget::Highest, &config).unwrap();
        assert_eq!(high.free_variables().len(), 1);
        // i free with j = 2 (or the mirror case): Var(2 i) = 8 / 3
        assert_abs_diff_eq!(high.variance, 8.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(high.variance, brute_variance(&high.point), epsilon = 1e-6);

        let low = best_subspace(&t, 1, SubspaceTarget::Lowest, &config).unwrap();
        assert_eq!(low.free_variables().len(), 1);
        assert_abs_diff_eq!(low.variance, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(brute_variance(&low.point), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_best_subspace_rejects_oversized_dimension() {
        let t = product_plus_offset();
        assert!(matches!(
            best_subspace(&t, 4, SubspaceTarget::Highest, &EngineConfig::default()),
            Err(SensitivityError::InvalidArgument { .. })
        ));
        let full = best_subspace(&t, 3, SubspaceTarget::Lowest, &EngineConfig::default()).unwrap();
        assert_eq!(full.free_variables(), vec![0, 1, 2]);
        assert_abs_diff_eq!(full.variance, brute_variance(&[None, None, None]), epsilon = 1e-6);
    }
}
