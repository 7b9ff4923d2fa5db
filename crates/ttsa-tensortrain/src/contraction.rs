//! Contraction operations for tensor trains
//!
//! - `hadamard`: element-wise product, bond dimensions multiply
//! - `dot`: bilinear inner product `Σ a[i] b[i]`
//! - `norm`: Frobenius norm

use crate::arithmetic::check_compatible;
use crate::error::Result;
use crate::tensortrain::TensorTrain;
use crate::traits::{AbstractTensorTrain, TTScalar};
use crate::types::Tensor3;

fn kron_core<T: TTScalar>(a: &Tensor3<T>, b: &Tensor3<T>) -> Tensor3<T> {
    let (bl, br) = (b.left_dim(), b.right_dim());
    let mut out = Tensor3::zeros(a.left_dim() * bl, a.site_dim(), a.right_dim() * br);
    for la in 0..a.left_dim() {
        for s in 0..a.site_dim() {
            for ra in 0..a.right_dim() {
                let va = *a.get(la, s, ra);
                if va.abs_sq() == 0.0 {
                    continue;
                }
                for lb in 0..bl {
                    for rb in 0..br {
                        out.set(la * bl + lb, s, ra * br + rb, va * *b.get(lb, s, rb));
                    }
                }
            }
        }
    }
    out
}

impl<T: TTScalar> TensorTrain<T> {
    /// Element-wise (Hadamard) product
    ///
    /// `result[i] = self[i] * other[i]`. Bond dimensions multiply, so the
    /// result is usually compressed right after.
    pub fn hadamard(&self, other: &Self) -> Result<Self> {
        check_compatible(self, other)?;
        let tensors = self
            .site_tensors()
            .iter()
            .zip(other.site_tensors())
            .map(|(a, b)| kron_core(a, b))
            .collect();
        Ok(TensorTrain::from_tensors_unchecked(tensors))
    }

    /// Inner product `Σ_i self[i] * other[i]` (no conjugation)
    pub fn dot(&self, other: &Self) -> Result<T> {
        check_compatible(self, other)?;
        if self.is_empty() {
            return Ok(T::zero());
        }

        // env[la, lb] carried left to right
        let mut env = vec![T::one()];
        let mut env_cols = 1;
        for (a, b) in self.site_tensors().iter().zip(other.site_tensors()) {
            let (ar, br) = (a.right_dim(), b.right_dim());
            let mut next = vec![T::zero(); ar * br];
            for la in 0..a.left_dim() {
                for lb in 0..b.left_dim() {
                    let e = env[la * env_cols + lb];
                    if e.abs_sq() == 0.0 {
                        continue;
                    }
                    for s in 0..a.site_dim() {
                        for ra in 0..ar {
                            let ea = e * *a.get(la, s, ra);
                            for rb in 0..br {
                                next[ra * br + rb] = next[ra * br + rb] + ea * *b.get(lb, s, rb);
                            }
                        }
                    }
                }
            }
            env = next;
            env_cols = br;
        }
        Ok(env.first().copied().unwrap_or_else(T::zero))
    }

    /// Frobenius norm `sqrt(|Σ conj(t[i]) t[i]|)`
    pub fn norm(&self) -> f64 {
        let conj = self
            .map_site_tensors(|_, t| t.map(|&v| v.conj()))
            .unwrap_or_else(|_| self.clone());
        conj.dot(self)
            .map(|v| v.abs_sq().sqrt().sqrt())
            .unwrap_or(0.0)
    }
}

/// Free-function form of [`TensorTrain::hadamard`]
pub fn hadamard<T: TTScalar>(a: &TensorTrain<T>, b: &TensorTrain<T>) -> Result<TensorTrain<T>> {
    a.hadamard(b)
}

/// Free-function form of [`TensorTrain::dot`]
pub fn dot<T: TTScalar>(a: &TensorTrain<T>, b: &TensorTrain<T>) -> Result<T> {
    a.dot(b)
}
