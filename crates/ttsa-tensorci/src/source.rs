//! Sample sources for the cross interpolation
//!
//! A [`CrossSource`] hands out tensor entries by multi-index. The sweep only
//! ever asks for whole two-site blocks `(I_b × s_b) × (s_{b+1} × J_{b+1})`,
//! which lets sources that are themselves tensor trains contract shared
//! prefixes and suffixes once per block instead of once per entry.

use crate::cached_function::CachedFunction;
use crate::error::{Result, TCIError};
use crate::indexset::MultiIndex;
use ttsa_tensortrain::{AbstractTensorTrain, TTScalar, Tensor3, TensorTrain};

/// Something the cross interpolation can sample
pub trait CrossSource<T: TTScalar> {
    /// Mode sizes of the sampled tensor
    fn local_dims(&self) -> Vec<usize>;

    /// Entries at arbitrary multi-indices
    fn evaluate_batch(&mut self, indices: &[MultiIndex]) -> Result<Vec<T>>;

    /// Two-site block at bond `b`, row-major with
    /// `row = i * d_b + s` and `col = s' * |J| + j`
    fn evaluate_block(
        &mut self,
        b: usize,
        i_set: &[MultiIndex],
        j_set: &[MultiIndex],
    ) -> Result<Vec<T>> {
        let dims = self.local_dims();
        let (db, db1) = (dims[b], dims[b + 1]);
        let mut indices = Vec::with_capacity(i_set.len() * db * db1 * j_set.len());
        for i in i_set {
            for s in 0..db {
                for s1 in 0..db1 {
                    for j in j_set {
                        let mut idx = Vec::with_capacity(dims.len());
                        idx.extend_from_slice(i);
                        idx.push(s);
                        idx.push(s1);
                        idx.extend_from_slice(j);
                        indices.push(idx);
                    }
                }
            }
        }
        self.evaluate_batch(&indices)
    }

    /// Number of entries computed so far
    fn num_evals(&self) -> usize;
}

/// A batched function over a fixed grid of mode sizes, evaluated through a
/// cache
pub struct FunctionSource<T, F>
where
    T: TTScalar,
    F: Fn(&[MultiIndex]) -> Vec<T>,
{
    local_dims: Vec<usize>,
    func: CachedFunction<T, F>,
}

impl<T, F> FunctionSource<T, F>
where
    T: TTScalar,
    F: Fn(&[MultiIndex]) -> Vec<T>,
{
    /// Wrap `batched` for a tensor of the given mode sizes
    pub fn new(local_dims: Vec<usize>, batched: F) -> Self {
        Self {
            local_dims,
            func: CachedFunction::new(batched),
        }
    }
}

impl<T, F> CrossSource<T> for FunctionSource<T, F>
where
    T: TTScalar,
    F: Fn(&[MultiIndex]) -> Vec<T>,
{
    fn local_dims(&self) -> Vec<usize> {
        self.local_dims.clone()
    }

    fn evaluate_batch(&mut self, indices: &[MultiIndex]) -> Result<Vec<T>> {
        self.func.eval_batch(indices)
    }

    fn num_evals(&self) -> usize {
        self.func.num_evals()
    }
}

/// `f(t_1[i], ..., t_k[i])` for tensor trains of identical shape
pub struct ElementwiseSource<'a, T, F>
where
    T: TTScalar,
    F: Fn(&[T]) -> T,
{
    tensors: &'a [&'a TensorTrain<T>],
    func: F,
    num_evals: usize,
}

impl<'a, T, F> ElementwiseSource<'a, T, F>
where
    T: TTScalar,
    F: Fn(&[T]) -> T,
{
    /// Check that all trains share one shape and wrap them
    pub fn new(tensors: &'a [&'a TensorTrain<T>], func: F) -> Result<Self> {
        let first = tensors.first().ok_or(TCIError::Empty)?;
        if first.is_empty() {
            return Err(TCIError::Empty);
        }
        let dims = first.site_dims();
        for (k, t) in tensors.iter().enumerate().skip(1) {
            if t.site_dims() != dims {
                return Err(TCIError::DimensionMismatch {
                    message: format!(
                        "tensor {k} has site dims {:?}, expected {dims:?}",
                        t.site_dims()
                    ),
                });
            }
        }
        Ok(Self {
            tensors,
            func,
            num_evals: 0,
        })
    }
}

fn left_env<T: TTScalar>(cores: &[Tensor3<T>], prefix: &[usize]) -> Vec<T> {
    let mut env = vec![T::one()];
    for (core, &s) in cores.iter().zip(prefix) {
        env = row_times_slice(&env, core, s);
    }
    env
}

fn right_env<T: TTScalar>(cores: &[Tensor3<T>], suffix: &[usize]) -> Vec<T> {
    let mut env = vec![T::one()];
    for (core, &s) in cores.iter().zip(suffix).rev() {
        env = slice_times_col(core, s, &env);
    }
    env
}

/// `v · core[:, s, :]`
fn row_times_slice<T: TTScalar>(v: &[T], core: &Tensor3<T>, s: usize) -> Vec<T> {
    let mut out = vec![T::zero(); core.right_dim()];
    for (l, &vl) in v.iter().enumerate() {
        for (r, o) in out.iter_mut().enumerate() {
            *o = *o + vl * *core.get(l, s, r);
        }
    }
    out
}

/// `core[:, s, :] · v`
fn slice_times_col<T: TTScalar>(core: &Tensor3<T>, s: usize, v: &[T]) -> Vec<T> {
    (0..core.left_dim())
        .map(|l| {
            v.iter()
                .enumerate()
                .fold(T::zero(), |acc, (r, &vr)| acc + *core.get(l, s, r) * vr)
        })
        .collect()
}

fn dot<T: TTScalar>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

impl<T, F> CrossSource<T> for ElementwiseSource<'_, T, F>
where
    T: TTScalar,
    F: Fn(&[T]) -> T,
{
    fn local_dims(&self) -> Vec<usize> {
        self.tensors[0].site_dims()
    }

    fn evaluate_batch(&mut self, indices: &[MultiIndex]) -> Result<Vec<T>> {
        let mut args = vec![T::zero(); self.tensors.len()];
        let mut out = Vec::with_capacity(indices.len());
        for idx in indices {
            for (a, t) in args.iter_mut().zip(self.tensors) {
                *a = t.evaluate(idx)?;
            }
            out.push((self.func)(&args));
        }
        self.num_evals += indices.len();
        Ok(out)
    }

    fn evaluate_block(
        &mut self,
        b: usize,
        i_set: &[MultiIndex],
        j_set: &[MultiIndex],
    ) -> Result<Vec<T>> {
        let dims = self.local_dims();
        let (db, db1) = (dims[b], dims[b + 1]);
        let ncols = db1 * j_set.len();
        let nrows = i_set.len() * db;

        // per tensor: u[(i, s)] = L_i A_b[:, s, :], w[(s', j)] = A_{b+1}[:, s', :] R_j
        let mut halves: Vec<(Vec<Vec<T>>, Vec<Vec<T>>)> = Vec::with_capacity(self.tensors.len());
        for t in self.tensors {
            let cores = t.site_tensors();
            let mut u = Vec::with_capacity(nrows);
            for i in i_set {
                let env = left_env(&cores[..b], i);
                for s in 0..db {
                    u.push(row_times_slice(&env, &cores[b], s));
                }
            }
            let mut w = Vec::with_capacity(ncols);
            let rights: Vec<Vec<T>> = j_set
                .iter()
                .map(|j| right_env(&cores[b + 2..], j))
                .collect();
            for s1 in 0..db1 {
                for env in &rights {
                    w.push(slice_times_col(&cores[b + 1], s1, env));
                }
            }
            halves.push((u, w));
        }

        let mut args = vec![T::zero(); self.tensors.len()];
        let mut out = Vec::with_capacity(nrows * ncols);
        for row in 0..nrows {
            for col in 0..ncols {
                for (a, (u, w)) in args.iter_mut().zip(&halves) {
                    *a = dot(&u[row], &w[col]);
                }
                out.push((self.func)(&args));
            }
        }
        self.num_evals += nrows * ncols;
        Ok(out)
    }

    fn num_evals(&self) -> usize {
        self.num_evals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp3() -> TensorTrain<f64> {
        // t[i, j, k] = i + 2 j + 3 k
        let first = Tensor3::from_data(vec![1.0, 0.0, 1.0, 1.0, 1.0, 2.0], 1, 3, 2);
        let mut mid = Tensor3::zeros(2, 3, 2);
        let mut last = Tensor3::zeros(2, 3, 1);
        for s in 0..3 {
            mid.set(0, s, 0, 1.0);
            mid.set(0, s, 1, 2.0 * s as f64);
            mid.set(1, s, 1, 1.0);
            last.set(0, s, 0, 3.0 * s as f64);
            last.set(1, s, 0, 1.0);
        }
        TensorTrain::new(vec![first, mid, last]).unwrap()
    }

    #[test]
    fn test_block_matches_pointwise() {
        let t = ramp3();
        let tensors = [&t];
        let mut fast = ElementwiseSource::new(&tensors, |x: &[f64]| x[0] * x[0]).unwrap();
        let i_set = vec![vec![0], vec![2]];
        let j_set = vec![vec![1], vec![0]];

        // bond 0 of a 3-site train: J_1 holds suffixes of length 1
        let block = fast.evaluate_block(0, &[vec![]], &j_set).unwrap();
        let mut k = 0;
        for s in 0..3 {
            for s1 in 0..3 {
                for j in &j_set {
                    let v = t.evaluate(&[s, s1, j[0]]).unwrap();
                    assert!((block[k] - v * v).abs() < 1e-12);
                    k += 1;
                }
            }
        }

        // bond 1: I_1 holds prefixes of length 1
        let block = fast.evaluate_block(1, &i_set, &[vec![]]).unwrap();
        let mut k = 0;
        for i in &i_set {
            for s in 0..3 {
                for s1 in 0..3 {
                    let v = t.evaluate(&[i[0], s, s1]).unwrap();
                    assert!((block[k] - v * v).abs() < 1e-12);
                    k += 1;
                }
            }
        }
    }

    #[test]
    fn test_default_block_uses_batch() {
        let mut src = FunctionSource::new(vec![2, 2, 2], |xs: &[MultiIndex]| {
            xs.iter()
                .map(|x| (x[0] * 4 + x[1] * 2 + x[2]) as f64)
                .collect()
        });
        let block = src.evaluate_block(1, &[vec![1]], &[vec![]]).unwrap();
        assert_eq!(block, vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(src.num_evals(), 4);
        src.evaluate_batch(&[vec![1, 0, 0]]).unwrap();
        assert_eq!(src.num_evals(), 4);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let a = TensorTrain::<f64>::ones(&[2, 2]);
        let b = TensorTrain::<f64>::ones(&[2, 3]);
        let tensors = [&a, &b];
        assert!(ElementwiseSource::new(&tensors, |x: &[f64]| x[0] + x[1]).is_err());
    }
}
