//! Entry-wise sums and scalar multiples
//!
//! Sums are exact: bond dimensions add up. Call
//! [`TensorTrain::compressed`](crate::TensorTrain::compressed) afterwards to
//! bring them back down.

use crate::error::{Result, TensorTrainError};
use crate::tensortrain::TensorTrain;
use crate::traits::{AbstractTensorTrain, TTScalar};
use crate::types::Tensor3;

/// Check that two trains have the same length and site dimensions
pub(crate) fn check_compatible<T: TTScalar>(a: &TensorTrain<T>, b: &TensorTrain<T>) -> Result<()> {
    if a.len() != b.len() {
        return Err(TensorTrainError::InvalidOperation {
            message: format!(
                "tensor trains have different lengths: {} vs {}",
                a.len(),
                b.len()
            ),
        });
    }
    for (site, (x, y)) in a.site_tensors().iter().zip(b.site_tensors()).enumerate() {
        if x.site_dim() != y.site_dim() {
            return Err(TensorTrainError::SiteDimensionMismatch {
                site,
                left: x.site_dim(),
                right: y.site_dim(),
            });
        }
    }
    Ok(())
}

/// Block-diagonal embedding of two cores
///
/// Boundary cores keep their unit bond: the first core concatenates along
/// the right bond, the last along the left bond, and a single-site train
/// just adds the entries.
fn direct_sum_core<T: TTScalar>(a: &Tensor3<T>, b: &Tensor3<T>, first: bool, last: bool) -> Tensor3<T> {
    let site_dim = a.site_dim();
    if first && last {
        let data = a
            .as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(&x, &y)| x + y)
            .collect();
        return Tensor3::from_data(data, 1, site_dim, 1);
    }

    let (l_off, left_dim) = if first {
        (0, 1)
    } else {
        (a.left_dim(), a.left_dim() + b.left_dim())
    };
    let (r_off, right_dim) = if last {
        (0, 1)
    } else {
        (a.right_dim(), a.right_dim() + b.right_dim())
    };

    let mut out = Tensor3::zeros(left_dim, site_dim, right_dim);
    for s in 0..site_dim {
        for l in 0..a.left_dim() {
            for r in 0..a.right_dim() {
                out.set(l, s, r, *a.get(l, s, r));
            }
        }
        for l in 0..b.left_dim() {
            for r in 0..b.right_dim() {
                out.set(l_off + l, s, r_off + r, *b.get(l, s, r));
            }
        }
    }
    out
}

impl<T: TTScalar> TensorTrain<T> {
    /// Entry-wise sum; bond dimensions add up
    pub fn add(&self, other: &Self) -> Result<Self> {
        check_compatible(self, other)?;
        if self.is_empty() {
            return Ok(other.clone());
        }

        let n = self.len();
        let tensors = self
            .site_tensors()
            .iter()
            .zip(other.site_tensors())
            .enumerate()
            .map(|(i, (a, b))| direct_sum_core(a, b, i == 0, i + 1 == n))
            .collect();
        Ok(TensorTrain::from_tensors_unchecked(tensors))
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.add(&other.negate())
    }

    pub fn negate(&self) -> Self {
        self.scaled(-T::one())
    }

    /// `self + value` at every entry
    pub fn add_constant(&self, value: T) -> Result<Self> {
        self.add(&Self::constant(&self.site_dims(), value))
    }
}

impl<T: TTScalar> std::ops::Add for &TensorTrain<T> {
    type Output = Result<TensorTrain<T>>;

    fn add(self, other: Self) -> Self::Output {
        TensorTrain::add(self, other)
    }
}

impl<T: TTScalar> std::ops::Sub for &TensorTrain<T> {
    type Output = Result<TensorTrain<T>>;

    fn sub(self, other: Self) -> Self::Output {
        TensorTrain::sub(self, other)
    }
}

impl<T: TTScalar> std::ops::Neg for &TensorTrain<T> {
    type Output = TensorTrain<T>;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl<T: TTScalar> std::ops::Mul<T> for &TensorTrain<T> {
    type Output = TensorTrain<T>;

    fn mul(self, scalar: T) -> Self::Output {
        self.scaled(scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train(a: [f64; 2], b: [f64; 2]) -> TensorTrain<f64> {
        TensorTrain::new(vec![
            Tensor3::from_data(a.to_vec(), 1, 2, 1),
            Tensor3::from_data(b.to_vec(), 1, 2, 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_add_doubles_the_bond() {
        let ones = TensorTrain::<f64>::ones(&[2, 3]);
        let twos = TensorTrain::<f64>::constant(&[2, 3], 2.0);
        let sum = ones.add(&twos).unwrap();
        assert_eq!(sum.link_dims(), vec![2]);
        assert!(sum.fulltensor().iter().all(|&v| (v - 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_sub_and_operators() {
        let five = TensorTrain::<f64>::constant(&[2, 3], 5.0);
        let two = TensorTrain::<f64>::constant(&[2, 3], 2.0);
        assert!(((&five - &two).unwrap().sum() - 18.0).abs() < 1e-10);
        assert!(((&five + &two).unwrap().sum() - 42.0).abs() < 1e-10);
        assert!(((-&five).sum() + five.sum()).abs() < 1e-10);
        assert!(((&five * 2.0).sum() - 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_add_preserves_evaluation() {
        let a = train([1.0, 2.0], [3.0, 4.0]);
        let b = train([0.5, 1.5], [2.5, 3.5]);
        let sum = a.add(&b).unwrap();
        for idx in [[0, 0], [0, 1], [1, 0], [1, 1]] {
            let expected = a.evaluate(&idx).unwrap() + b.evaluate(&idx).unwrap();
            assert!((sum.evaluate(&idx).unwrap() - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_add_single_site() {
        let a = TensorTrain::new(vec![Tensor3::from_data(vec![1.0, 2.0, 3.0], 1, 3, 1)]).unwrap();
        let b = TensorTrain::new(vec![Tensor3::from_data(vec![10.0, 20.0, 30.0], 1, 3, 1)]).unwrap();
        let c = a.add(&b).unwrap();
        assert_eq!(c.fulltensor(), vec![11.0, 22.0, 33.0]);
    }

    #[test]
    fn test_add_constant_and_mismatch() {
        let a = train([1.0, 2.0], [3.0, 4.0]);
        let shifted = a.add_constant(-1.0).unwrap();
        assert!((shifted.evaluate(&[1, 1]).unwrap() - 7.0).abs() < 1e-12);

        let other = TensorTrain::<f64>::ones(&[2, 3]);
        assert!(matches!(
            a.add(&other),
            Err(TensorTrainError::SiteDimensionMismatch { site: 1, .. })
        ));
    }
}
