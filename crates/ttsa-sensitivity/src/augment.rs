//! Core-wise augmentation helpers
//!
//! The variance, covariance and game engines share one pattern: widen every
//! core with extra slices that stand for "variable not selected", apply an
//! elementwise map by cross approximation, and fold the widened modes back
//! into the two states of a set tensor.

use crate::error::Result;
use ttsa_tensorci::{cross_elementwise, CrossOptions};
use ttsa_tensortrain::{AbstractTensorTrain, Tensor3, TensorTrain};

/// Prepend `prepend` copies of the mean slice to every core
///
/// A core of mode size `I` becomes one of size `prepend + I`; indices below
/// `prepend` average the variable out.
pub fn mean_augment(t: &TensorTrain<f64>, prepend: usize) -> Result<TensorTrain<f64>> {
    Ok(t.map_site_tensors(|_, core| {
        let (l, i, r) = (core.left_dim(), core.site_dim(), core.right_dim());
        let mean = core.mean_over_sites(0..i);
        let mut slices = vec![mean; prepend];
        slices.extend((0..i).map(|s| core.slice_site(s)));
        Tensor3::from_slices(&slices, l, r)
    })?)
}

/// Mean-augment `t` and cross-approximate the elementwise square
pub fn augment_and_square(
    t: &TensorTrain<f64>,
    prepend: usize,
    options: &CrossOptions,
) -> Result<TensorTrain<f64>> {
    let augmented = mean_augment(t, prepend)?;
    let squared = cross_elementwise(&[&augmented], |x: &[f64]| x[0] * x[0], options)?;
    tracing::debug!(
        rank = squared.tensor_train.rank(),
        n_evals = squared.n_evals,
        "augmented square"
    );
    Ok(squared.tensor_train)
}

/// Fold an augmented tensor into a set tensor: slice 0 is the first
/// "not selected" slice, slice 1 the mean over the original mode minus it
pub fn collapse_selected(t: &TensorTrain<f64>, prepend: usize) -> Result<TensorTrain<f64>> {
    Ok(t.map_site_tensors(|_, core| {
        let (l, i, r) = (core.left_dim(), core.site_dim(), core.right_dim());
        let unselected = core.slice_site(0);
        let selected: Vec<f64> = core
            .mean_over_sites(prepend..i)
            .iter()
            .zip(&unselected)
            .map(|(m, u)| m - u)
            .collect();
        Tensor3::from_slices(&[unselected, selected], l, r)
    })?)
}

/// Tile every mode `times` times: `t'[.., s + k I, ..] = t[.., s, ..]`
pub fn repeat_modes(t: &TensorTrain<f64>, times: usize) -> Result<TensorTrain<f64>> {
    Ok(t.map_site_tensors(|_, core| {
        let i = core.site_dim();
        let indices: Vec<usize> = (0..times * i).map(|s| s % i).collect();
        core.select_sites(&indices)
    })?)
}

/// Reindex every core by the same slice map, e.g. `[0, 1, 1]`
pub fn expand_states(t: &TensorTrain<f64>, states: &[usize]) -> Result<TensorTrain<f64>> {
    Ok(t.map_site_tensors(|_, core| core.select_sites(states))?)
}

/// Replace every core by the means of its contiguous slice blocks
///
/// `blocks = [0..I, I..2I]` turns a mode-doubled tensor into a set tensor.
pub fn block_means(
    t: &TensorTrain<f64>,
    blocks: impl Fn(usize) -> Vec<std::ops::Range<usize>>,
) -> Result<TensorTrain<f64>> {
    Ok(t.map_site_tensors(|site, core| {
        let slices: Vec<Vec<f64>> = blocks(site)
            .into_iter()
            .map(|range| core.mean_over_sites(range))
            .collect();
        Tensor3::from_slices(&slices, core.left_dim(), core.right_dim())
    })?)
}

/// Replace every core by the sums of the given slice groups
pub fn sum_states(t: &TensorTrain<f64>, groups: &[&[usize]]) -> Result<TensorTrain<f64>> {
    Ok(t.map_site_tensors(|_, core| {
        let slices: Vec<Vec<f64>> = groups
            .iter()
            .map(|group| {
                let mut acc = vec![0.0; core.left_dim() * core.right_dim()];
                for &s in group.iter() {
                    for (a, v) in acc.iter_mut().zip(core.slice_site(s)) {
                        *a += v;
                    }
                }
                acc
            })
            .collect();
        Tensor3::from_slices(&slices, core.left_dim(), core.right_dim())
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// `t[i_0, ..., i_{n-1}] = 1 + Σ i_k`
    fn ramp(dims: &[usize]) -> TensorTrain<f64> {
        let n = dims.len();
        let cores = dims
            .iter()
            .enumerate()
            .map(|(k, &d)| {
                let (first, last) = (k == 0, k + 1 == n);
                let mut core = Tensor3::zeros(if first { 1 } else { 2 }, d, if last { 1 } else { 2 });
                for s in 0..d {
                    let x = s as f64 + if first { 1.0 } else { 0.0 };
                    match (first, last) {
                        (true, true) => core.set(0, s, 0, x),
                        (true, false) => {
                            core.set(0, s, 0, 1.0);
                            core.set(0, s, 1, x);
                        }
                        (false, true) => {
                            core.set(0, s, 0, x);
                            core.set(1, s, 0, 1.0);
                        }
                        (false, false) => {
                            core.set(0, s, 0, 1.0);
                            core.set(0, s, 1, x);
                            core.set(1, s, 1, 1.0);
                        }
                    }
                }
                core
            })
            .collect();
        TensorTrain::new(cores).unwrap()
    }

    #[test]
    fn test_mean_augment_slices() {
        let t = TensorTrain::new(vec![Tensor3::from_data(vec![1.0, 2.0, 6.0], 1, 3, 1)]).unwrap();
        let a = mean_augment(&t, 2).unwrap();
        assert_eq!(a.site_dims(), vec![5]);
        assert_eq!(a.fulltensor(), vec![3.0, 3.0, 1.0, 2.0, 6.0]);
    }

    #[test]
    fn test_augment_and_square_collapse_gives_conditional_moments() {
        // f(i, j) = 1 + i + j on a 3 x 3 grid
        let t = ramp(&[3, 3]);
        assert_abs_diff_eq!(t.evaluate(&[2, 1]).unwrap(), 4.0, epsilon = 1e-12);

        let sq = augment_and_square(&t, 1, &CrossOptions::default()).unwrap();
        let raw = collapse_selected(&sq, 1).unwrap();
        // raw(∅) = mean² = 9, raw({0}) = Var(i) = 2/3
        assert_abs_diff_eq!(raw.evaluate(&[0, 0]).unwrap(), 9.0, epsilon = 1e-8);
        assert_abs_diff_eq!(raw.evaluate(&[1, 0]).unwrap(), 2.0 / 3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(raw.evaluate(&[1, 1]).unwrap(), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_repeat_and_block_means() {
        let t = ramp(&[2, 3]);
        let doubled = repeat_modes(&t, 2).unwrap();
        assert_eq!(doubled.site_dims(), vec![4, 6]);
        assert_abs_diff_eq!(
            doubled.evaluate(&[3, 4]).unwrap(),
            t.evaluate(&[1, 1]).unwrap(),
            epsilon = 1e-12
        );
        let halves = block_means(&doubled, |site| {
            let i = t.site_dims()[site];
            vec![0..i, i..2 * i]
        })
        .unwrap();
        assert_abs_diff_eq!(halves.evaluate(&[0, 1]).unwrap(), t.mean(), epsilon = 1e-12);
    }

    #[test]
    fn test_expand_and_sum_states() {
        let t = TensorTrain::new(vec![Tensor3::from_data(vec![2.0, 5.0], 1, 2, 1)]).unwrap();
        let three = expand_states(&t, &[0, 1, 1]).unwrap();
        assert_eq!(three.fulltensor(), vec![2.0, 5.0, 5.0]);
        let folded = sum_states(&three, &[&[0, 1], &[2]]).unwrap();
        assert_eq!(folded.fulltensor(), vec![7.0, 5.0]);
    }
}
