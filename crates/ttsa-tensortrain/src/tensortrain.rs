//! Owned tensor train

use crate::error::{Result, TensorTrainError};
use crate::traits::{AbstractTensorTrain, TTScalar};
use crate::types::Tensor3;

/// Chain of cores `A_k` of shape `(r_{k-1}, d_k, r_k)` with `r_0 = r_L = 1`
///
/// Entry `(i_1, ..., i_L)` is the matrix product `A_1[i_1] ... A_L[i_L]`.
#[derive(Debug, Clone)]
pub struct TensorTrain<T: TTScalar> {
    tensors: Vec<Tensor3<T>>,
}

impl<T: TTScalar> TensorTrain<T> {
    /// Validate the bonds of `tensors` and take ownership
    ///
    /// Neighbouring bonds must agree and both boundary bonds must be 1.
    pub fn new(tensors: Vec<Tensor3<T>>) -> Result<Self> {
        if let Some(site) = tensors
            .windows(2)
            .position(|pair| pair[0].right_dim() != pair[1].left_dim())
        {
            return Err(TensorTrainError::DimensionMismatch { site });
        }
        let open_left = tensors.first().is_some_and(|t| t.left_dim() != 1);
        let open_right = tensors.last().is_some_and(|t| t.right_dim() != 1);
        if open_left || open_right {
            return Err(TensorTrainError::InvalidOperation {
                message: "boundary bonds of a tensor train must be 1".to_string(),
            });
        }
        Ok(Self { tensors })
    }

    /// Bonds are already known to match
    pub(crate) fn from_tensors_unchecked(tensors: Vec<Tensor3<T>>) -> Self {
        Self { tensors }
    }

    /// Rank-1 train of zeros
    pub fn zeros(site_dims: &[usize]) -> Self {
        let tensors = site_dims.iter().map(|&d| Tensor3::zeros(1, d, 1)).collect();
        Self { tensors }
    }

    /// Rank-1 train equal to `value` everywhere
    pub fn constant(site_dims: &[usize], value: T) -> Self {
        let n = site_dims.len();
        let tensors = site_dims
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let v = if i + 1 == n { value } else { T::one() };
                Tensor3::from_data(vec![v; d], 1, d, 1)
            })
            .collect();
        Self { tensors }
    }

    /// The all-ones tensor train
    pub fn ones(site_dims: &[usize]) -> Self {
        Self::constant(site_dims, T::one())
    }

    pub(crate) fn site_tensors_mut(&mut self) -> &mut [Tensor3<T>] {
        &mut self.tensors
    }

    /// Build a new train by transforming every core
    ///
    /// `f` receives the site position and the current core. The result is
    /// validated like [`TensorTrain::new`].
    pub fn map_site_tensors<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, &Tensor3<T>) -> Tensor3<T>,
    {
        let tensors = self
            .tensors
            .iter()
            .enumerate()
            .map(|(i, t)| f(i, t))
            .collect();
        Self::new(tensors)
    }

    /// Keep only the slices `indices` of core `site`, in that order
    pub fn select_site(&self, site: usize, indices: &[usize]) -> Result<Self> {
        let tensor = self.tensors.get(site).ok_or(TensorTrainError::IndexOutOfBounds {
            site,
            index: site,
            max: self.tensors.len(),
        })?;
        if let Some(&bad) = indices.iter().find(|&&s| s >= tensor.site_dim()) {
            return Err(TensorTrainError::IndexOutOfBounds {
                site,
                index: bad,
                max: tensor.site_dim(),
            });
        }
        let mut tensors = self.tensors.clone();
        tensors[site] = tensor.select_sites(indices);
        Ok(Self { tensors })
    }

    /// Replace core `site`; the new core must keep both bond dimensions but
    /// may change the mode size
    pub fn replace_site(&self, site: usize, tensor: Tensor3<T>) -> Result<Self> {
        let old = self.tensors.get(site).ok_or(TensorTrainError::IndexOutOfBounds {
            site,
            index: site,
            max: self.tensors.len(),
        })?;
        if old.left_dim() != tensor.left_dim() || old.right_dim() != tensor.right_dim() {
            return Err(TensorTrainError::DimensionMismatch { site });
        }
        let mut tensors = self.tensors.clone();
        tensors[site] = tensor;
        Ok(Self { tensors })
    }

    /// Multiply every entry by `factor`; only the last core changes
    pub fn scale(&mut self, factor: T) {
        if let Some(last) = self.tensors.last_mut() {
            *last = last.map(|&v| v * factor);
        }
    }

    pub fn scaled(&self, factor: T) -> Self {
        let mut out = self.clone();
        out.scale(factor);
        out
    }
}

impl<T: TTScalar> AbstractTensorTrain<T> for TensorTrain<T> {
    fn len(&self) -> usize {
        self.tensors.len()
    }

    fn site_tensor(&self, i: usize) -> &Tensor3<T> {
        &self.tensors[i]
    }

    fn site_tensors(&self) -> &[Tensor3<T>] {
        &self.tensors
    }
}
