//! Scalar and read-only traits of tensor trains

use crate::error::{Result, TensorTrainError};
use crate::types::{LocalIndex, Tensor3};
use ttsa_matrixci::Scalar;

/// Scalar trait for tensor train elements
///
/// Extends the matrix kernel scalar so site tensors can be handed straight
/// to the rank-revealing LU.
pub trait TTScalar: Scalar + Default {
    /// Conjugate
    fn conj(self) -> Self;

    /// Lift a real number into the scalar type
    fn from_f64(value: f64) -> Self;
}

impl TTScalar for f64 {
    fn conj(self) -> Self {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

/// Vector-matrix product `v · M` with `M` stored row-major as `(v.len(), cols)`
pub(crate) fn vec_mat<T: TTScalar>(v: &[T], m: &[T], cols: usize) -> Vec<T> {
    let mut out = vec![T::zero(); cols];
    for (l, &vl) in v.iter().enumerate() {
        if vl.abs_sq() == 0.0 {
            continue;
        }
        let row = &m[l * cols..(l + 1) * cols];
        for (o, &x) in out.iter_mut().zip(row) {
            *o = *o + vl * x;
        }
    }
    out
}

/// Read access to a chain of cores `T[i1, ..., iL] = A1[i1] ... AL[iL]`
pub trait AbstractTensorTrain<T: TTScalar>: Sized {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn site_tensor(&self, i: usize) -> &Tensor3<T>;

    fn site_tensors(&self) -> &[Tensor3<T>];

    /// The `L - 1` inner bond dimensions
    fn link_dims(&self) -> Vec<usize> {
        (1..self.len())
            .map(|i| self.site_tensor(i).left_dim())
            .collect()
    }

    /// Mode size of every site
    fn site_dims(&self) -> Vec<usize> {
        self.site_tensors().iter().map(|t| t.site_dim()).collect()
    }

    /// Largest bond dimension, 1 for a single site
    fn rank(&self) -> usize {
        self.link_dims().into_iter().max().unwrap_or(1)
    }

    /// Total number of entries, saturating at `usize::MAX`
    fn numel(&self) -> usize {
        self.site_dims()
            .iter()
            .fold(1usize, |acc, &d| acc.saturating_mul(d))
    }

    /// Entry at one multi-index; every index is bounds-checked
    fn evaluate(&self, indices: &[LocalIndex]) -> Result<T> {
        if self.is_empty() {
            return Err(TensorTrainError::Empty);
        }
        if indices.len() != self.len() {
            return Err(TensorTrainError::IndexLengthMismatch {
                expected: self.len(),
                got: indices.len(),
            });
        }

        let mut current = vec![T::one()];
        for (site, &idx) in indices.iter().enumerate() {
            let tensor = self.site_tensor(site);
            if idx >= tensor.site_dim() {
                return Err(TensorTrainError::IndexOutOfBounds {
                    site,
                    index: idx,
                    max: tensor.site_dim(),
                });
            }
            current = vec_mat(&current, &tensor.slice_site(idx), tensor.right_dim());
        }

        match current.as_slice() {
            [value] => Ok(*value),
            other => Err(TensorTrainError::InvalidOperation {
                message: format!(
                    "final contraction left {} elements, expected 1",
                    other.len()
                ),
            }),
        }
    }

    /// [`evaluate`](Self::evaluate) over a list of multi-indices
    fn evaluate_batch(&self, indices: &[Vec<LocalIndex>]) -> Result<Vec<T>> {
        indices.iter().map(|idx| self.evaluate(idx)).collect()
    }

    /// Sum of all entries, contracted site by site
    fn sum(&self) -> T {
        if self.is_empty() {
            return T::zero();
        }
        let mut current = vec![T::one()];
        for tensor in self.site_tensors() {
            let site_sum = tensor.sum_slices(0..tensor.site_dim());
            current = vec_mat(&current, &site_sum, tensor.right_dim());
        }
        current.first().copied().unwrap_or_else(T::zero)
    }

    /// Arithmetic mean of all entries
    fn mean(&self) -> T {
        let count: f64 = self.site_dims().iter().map(|&d| d as f64).product();
        if count == 0.0 {
            return T::zero();
        }
        self.sum() / T::from_f64(count)
    }

    /// Dense row-major (last index fastest) copy of the whole tensor
    ///
    /// Only meant for small trains: the result has `numel()` entries.
    fn fulltensor(&self) -> Vec<T> {
        let mut rows: Vec<Vec<T>> = vec![vec![T::one()]];
        for tensor in self.site_tensors() {
            let mut next = Vec::with_capacity(rows.len() * tensor.site_dim());
            for row in &rows {
                for s in 0..tensor.site_dim() {
                    next.push(vec_mat(row, &tensor.slice_site(s), tensor.right_dim()));
                }
            }
            rows = next;
        }
        rows.into_iter()
            .map(|v| v.first().copied().unwrap_or_else(T::zero))
            .collect()
    }
}
