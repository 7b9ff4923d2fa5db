//! Set tensors
//!
//! A set tensor is a tensor train whose modes all have size 2; entry
//! `t[i_0, ..., i_{N-1}]` is the value of the subset `{n : i_n = 1}`. The
//! transforms below act core by core on the pair of slices of every core, so
//! they never leave the compressed format.

use crate::augment::{expand_states, sum_states};
use crate::enumeration::power_set;
use crate::error::{Result, SensitivityError};
use crate::indices::VARIANCE_FLOOR;
use std::collections::HashSet;
use ttsa_tensorci::{cross_elementwise, CrossOptions};
use ttsa_tensortrain::{
    hadamard, maximize, AbstractTensorTrain, CompressionOptions, OptimizeOptions, Tensor3,
    TensorTrain,
};

/// True if every mode of `t` has size 2
pub fn is_set(t: &TensorTrain<f64>) -> bool {
    !t.is_empty() && t.site_dims().iter().all(|&d| d == 2)
}

pub(crate) fn ensure_set(t: &TensorTrain<f64>) -> Result<()> {
    if is_set(t) {
        Ok(())
    } else {
        Err(SensitivityError::NotASetTensor { dims: t.site_dims() })
    }
}

/// Check that `subset` has distinct members below `n`
pub fn validate_subset(subset: &[usize], n: usize) -> Result<()> {
    let mut seen = HashSet::with_capacity(subset.len());
    for &v in subset {
        if v >= n {
            return Err(SensitivityError::VariableOutOfRange { variable: v, n });
        }
        if !seen.insert(v) {
            return Err(SensitivityError::DuplicateVariable { variable: v });
        }
    }
    Ok(())
}

/// 0/1 multi-index of `subset`; the subset must already be validated
pub(crate) fn indicator(subset: &[usize], n: usize) -> Vec<usize> {
    let mut index = vec![0; n];
    for &v in subset {
        index[v] = 1;
    }
    index
}

/// Apply `f(slice0, slice1) -> (slice0', slice1')` entrywise to every core
fn transform_slices<F>(t: &TensorTrain<f64>, f: F) -> Result<TensorTrain<f64>>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    ensure_set(t)?;
    let result = t.map_site_tensors(|_, core| {
        let mut out = core.clone();
        for l in 0..core.left_dim() {
            for r in 0..core.right_dim() {
                let (a, b) = f(*core.get(l, 0, r), *core.get(l, 1, r));
                out.set(l, 0, r, a);
                out.set(l, 1, r, b);
            }
        }
        out
    })?;
    Ok(result)
}

/// `t'(S) = t(complement of S)`
pub fn complement(t: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    transform_slices(t, |a, b| (b, a))
}

/// `t'(S) = Σ_{T ⊇ S} t(T)`
pub fn to_superset(t: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    transform_slices(t, |a, b| (a + b, b))
}

/// Inverse of [`to_superset`]
pub fn from_superset(t: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    transform_slices(t, |a, b| (a - b, b))
}

/// `t'(S) = Σ_{T ⊆ S} t(T)`
pub fn to_lower(t: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    transform_slices(t, |a, b| (a, a + b))
}

/// Inverse of [`to_lower`] (Möbius inversion)
pub fn from_lower(t: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    transform_slices(t, |a, b| (a, b - a))
}

/// `t'(S) = 1 - Σ_{T ⊆ complement of S} t(T)`
pub fn to_upper(t: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    let lower_of_complement = transform_slices(t, |a, b| (a + b, a))?;
    Ok(TensorTrain::ones(&t.site_dims()).sub(&lower_of_complement)?)
}

/// Inverse of [`to_upper`]: undo the complement-lower sum of `1 - t`
pub fn from_upper(t: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    ensure_set(t)?;
    let lower_of_complement = TensorTrain::ones(&t.site_dims()).sub(t)?;
    transform_slices(&lower_of_complement, |a, b| (b, a - b))
}

/// Value of the subset `subset` (0-based members)
pub fn set_choose(t: &TensorTrain<f64>, subset: &[usize]) -> Result<f64> {
    ensure_set(t)?;
    validate_subset(subset, t.len())?;
    Ok(t.evaluate(&indicator(subset, t.len()))?)
}

fn set_tensor(cores: Vec<Tensor3<f64>>) -> Result<TensorTrain<f64>> {
    Ok(TensorTrain::new(cores)?)
}

/// Counter automaton over `states` states: slice 0 keeps the state, slice 1
/// advances it by one (falling off the end)
fn counter_cores(n: usize, states: usize, start: usize, accept: usize) -> Vec<Tensor3<f64>> {
    (0..n)
        .map(|site| {
            let rows: Vec<usize> = if site == 0 { vec![start] } else { (0..states).collect() };
            let cols: Vec<usize> = if site + 1 == n { vec![accept] } else { (0..states).collect() };
            let mut core = Tensor3::zeros(rows.len(), 2, cols.len());
            for (l, &from) in rows.iter().enumerate() {
                for (r, &to) in cols.iter().enumerate() {
                    if to == from {
                        core.set(l, 0, r, 1.0);
                    }
                    if to == from + 1 {
                        core.set(l, 1, r, 1.0);
                    }
                }
            }
            core
        })
        .collect()
}

/// 1 at the empty set, 0 elsewhere
pub fn none_indicator(n: usize) -> Result<TensorTrain<f64>> {
    set_tensor(
        (0..n)
            .map(|_| Tensor3::from_data(vec![1.0, 0.0], 1, 2, 1))
            .collect(),
    )
}

/// `|S|`
pub fn hamming_weight(n: usize) -> Result<TensorTrain<f64>> {
    // state 0: nobody counted yet, state 1: one member counted
    let cores = (0..n)
        .map(|_| {
            let mut core = Tensor3::zeros(2, 2, 2);
            for s in 0..2 {
                core.set(0, s, 0, 1.0);
                core.set(1, s, 1, 1.0);
                core.set(0, s, 1, s as f64);
            }
            core
        })
        .collect();
    set_tensor(close_chain(cores, 0, 1))
}

/// Restrict the first core to row `start` and the last core to column
/// `accept`, turning a chain of square transfer cores into a train
pub(crate) fn close_chain(
    mut cores: Vec<Tensor3<f64>>,
    start: usize,
    accept: usize,
) -> Vec<Tensor3<f64>> {
    if let Some(first) = cores.first_mut() {
        *first = row(first, start);
    }
    if let Some(last) = cores.last_mut() {
        *last = column(last, accept);
    }
    cores
}

fn row(core: &Tensor3<f64>, l: usize) -> Tensor3<f64> {
    let mut out = Tensor3::zeros(1, core.site_dim(), core.right_dim());
    for s in 0..core.site_dim() {
        for r in 0..core.right_dim() {
            out.set(0, s, r, *core.get(l, s, r));
        }
    }
    out
}

fn column(core: &Tensor3<f64>, r: usize) -> Tensor3<f64> {
    let mut out = Tensor3::zeros(core.left_dim(), core.site_dim(), 1);
    for l in 0..core.left_dim() {
        for s in 0..core.site_dim() {
            out.set(l, s, 0, *core.get(l, s, r));
        }
    }
    out
}

/// 1 iff `|S| = k`
pub fn hamming_eq_mask(n: usize, k: usize) -> Result<TensorTrain<f64>> {
    if k > n {
        return Ok(TensorTrain::zeros(&vec![2; n]));
    }
    set_tensor(counter_cores(n, k + 1, 0, k))
}

/// Largest value among the subsets of size `k`, with its members
pub fn largest_k_tuple(
    t: &TensorTrain<f64>,
    k: usize,
    options: &OptimizeOptions,
) -> Result<(Vec<usize>, f64)> {
    ensure_set(t)?;
    let n = t.len();
    if k == 0 || k > n {
        return Err(SensitivityError::InvalidArgument {
            message: format!("tuple order must lie in 1..={n}, got {k}"),
        });
    }
    let mask = hamming_eq_mask(n, k)?;
    // Push every other order below the smallest possible entry
    let penalty = 2.0 * t.norm() + 1.0;
    let outside = mask.sub(&TensorTrain::ones(&t.site_dims()))?.scaled(penalty);
    let weighted = hadamard(t, &mask)?.add(&outside)?;
    let (value, point) = maximize(&weighted, options)?;
    let members = point
        .iter()
        .enumerate()
        .filter_map(|(i, &s)| (s == 1).then_some(i))
        .collect();
    Ok((members, value))
}

/// Departure of every subset's share from independent membership
///
/// With `p_n = t({n}) / Σ t`, entry `S` is
/// `t(S) / Σ t - Π_{n ∈ S} p_n Π_{n ∉ S} (1 - p_n)`.
pub fn cardinality_deviation(t: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    ensure_set(t)?;
    let total = t.sum();
    if !total.is_finite() || total == 0.0 {
        return Err(SensitivityError::InvalidArgument {
            message: format!("set tensor must have a finite non-zero sum, got {total}"),
        });
    }
    let cores = (0..t.len())
        .map(|v| {
            let p = set_choose(t, &[v])? / total;
            Ok(Tensor3::from_data(vec![1.0 - p, p], 1, 2, 1))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(t.scaled(1.0 / total).sub(&set_tensor(cores)?)?)
}

/// Mean dimension of `t` restricted to the supersets of every subset:
/// `Σ_{T ⊇ S} |T| t(T) / Σ_{T ⊇ S} t(T)`
///
/// Subsets whose superset sum is at most [`VARIANCE_FLOOR`] map to 0. For a
/// variance component tensor the entry at `∅` is the mean dimension.
pub fn mean_dimension_tensor(
    t: &TensorTrain<f64>,
    options: &CrossOptions,
) -> Result<TensorTrain<f64>> {
    ensure_set(t)?;
    // states per variable: 0 outside T, 1 in T but not in S, 2 in S
    let values = expand_states(t, &[0, 1, 1])?;
    let sizes = expand_states(&hamming_weight(t.len())?, &[0, 1, 1])?;
    let supersets = expand_states(&to_superset(t)?, &[0, 0, 1])?;
    let weighted = cross_elementwise(
        &[&values, &sizes, &supersets],
        |x: &[f64]| {
            if x[2].abs() > VARIANCE_FLOOR {
                x[0] * x[1] / x[2]
            } else {
                0.0
            }
        },
        options,
    )?;
    let mut result = sum_states(&weighted.tensor_train, &[&[0, 1], &[2]])?;
    result.compress(&CompressionOptions::default().with_tolerance(options.tolerance))?;
    Ok(result)
}

/// Text listing of all subsets with `min_order <= |S| <= max_order`, one
/// `[members]: value` line each, in depth-first lexicographic order
pub fn set_dump(t: &TensorTrain<f64>, min_order: usize, max_order: usize) -> Result<String> {
    ensure_set(t)?;
    let n = t.len();
    if min_order > max_order || max_order > n {
        return Err(SensitivityError::InvalidArgument {
            message: format!("need min_order <= max_order <= {n}, got {min_order}..={max_order}"),
        });
    }
    let mut subsets: Vec<Vec<usize>> = power_set(n, min_order, max_order, &[], &[])?.collect();
    subsets.sort();
    let lines = subsets
        .iter()
        .map(|s| Ok(format!("{s:?}: {}", set_choose(t, s)?)))
        .collect::<Result<Vec<String>>>()?;
    Ok(lines.join("\n"))
}
