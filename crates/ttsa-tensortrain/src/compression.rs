//! Bond-dimension reduction for tensor trains
//!
//! Two LU sweeps: left to right without truncation to move all weight into
//! the last core, then right to left with truncation.

use crate::error::Result;
use crate::tensortrain::TensorTrain;
use crate::traits::{AbstractTensorTrain, TTScalar};
use crate::types::Tensor3;
use ttsa_matrixci::util::{mat_mul, zeros};
use ttsa_matrixci::{rrlu, Matrix, RrLUOptions};

/// Options for compression
#[derive(Debug, Clone)]
pub struct CompressionOptions {
    /// Relative pivot tolerance of the truncating sweep
    pub tolerance: f64,
    /// Maximum bond dimension
    pub max_bond_dim: usize,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_bond_dim: usize::MAX,
        }
    }
}

impl CompressionOptions {
    /// Set the relative tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the maximum bond dimension
    pub fn with_max_bond_dim(mut self, max_bond_dim: usize) -> Self {
        self.max_bond_dim = max_bond_dim;
        self
    }
}

/// `matrix ≈ left · right` through rrLU. A rank-0 result is widened to a
/// zero bond of size 1 so the train stays well formed.
fn factorize<T: TTScalar>(
    matrix: &Matrix<T>,
    tolerance: f64,
    max_bond_dim: usize,
    left_orthogonal: bool,
) -> Result<(Matrix<T>, Matrix<T>, usize)> {
    let options = RrLUOptions::default()
        .with_max_rank(max_bond_dim.max(1))
        .with_rel_tol(if tolerance > 0.0 { tolerance } else { 1e-14 })
        .with_left_orthogonal(left_orthogonal);
    let lu = rrlu(matrix, Some(options))?;
    if lu.npivots() == 0 {
        return Ok((zeros(matrix.nrows(), 1), zeros(1, matrix.ncols()), 1));
    }
    Ok((lu.left(true), lu.right(true), lu.npivots()))
}

impl<T: TTScalar> TensorTrain<T> {
    /// Compress the tensor train in place
    pub fn compress(&mut self, options: &CompressionOptions) -> Result<()> {
        let n = self.len();
        if n <= 1 {
            return Ok(());
        }
        let tensors = self.site_tensors_mut();

        for ell in 0..n - 1 {
            let (l, s) = (tensors[ell].left_dim(), tensors[ell].site_dim());
            let (data, rows, cols) = tensors[ell].as_left_matrix();
            let (left, right, k) =
                factorize(&Matrix::from_row_major(data, rows, cols), 0.0, usize::MAX, true)?;
            tensors[ell] = Tensor3::from_data(left.into_vec(), l, s, k);

            let next = &tensors[ell + 1];
            let (ns, nr) = (next.site_dim(), next.right_dim());
            let (data, rows, cols) = next.as_right_matrix();
            let contracted = mat_mul(&right, &Matrix::from_row_major(data, rows, cols));
            tensors[ell + 1] = Tensor3::from_data(contracted.into_vec(), k, ns, nr);
        }

        for ell in (1..n).rev() {
            let (s, r) = (tensors[ell].site_dim(), tensors[ell].right_dim());
            let (data, rows, cols) = tensors[ell].as_right_matrix();
            let (left, right, k) = factorize(
                &Matrix::from_row_major(data, rows, cols),
                options.tolerance,
                options.max_bond_dim,
                false,
            )?;
            tensors[ell] = Tensor3::from_data(right.into_vec(), k, s, r);

            let prev = &tensors[ell - 1];
            let (pl, ps) = (prev.left_dim(), prev.site_dim());
            let (data, rows, cols) = prev.as_left_matrix();
            let contracted = mat_mul(&Matrix::from_row_major(data, rows, cols), &left);
            tensors[ell - 1] = Tensor3::from_data(contracted.into_vec(), pl, ps, k);
        }

        Ok(())
    }

    /// Compressed copy
    pub fn compressed(&self, options: &CompressionOptions) -> Result<Self> {
        let mut result = self.clone();
        result.compress(options)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn all_indices(dims: &[usize]) -> Vec<Vec<usize>> {
        let mut out = vec![vec![]];
        for &d in dims {
            out = out
                .into_iter()
                .flat_map(|p| {
                    (0..d).map(move |s| {
                        let mut q = p.clone();
                        q.push(s);
                        q
                    })
                })
                .collect();
        }
        out
    }

    #[test]
    fn test_compress_redundant_sum() {
        // ones + ones + ones has bond dimension 3 but rank 1
        let ones = TensorTrain::<f64>::ones(&[2, 3, 2]);
        let tt = ones.add(&ones).unwrap().add(&ones).unwrap();
        assert_eq!(tt.rank(), 3);

        let c = tt.compressed(&CompressionOptions::default()).unwrap();
        assert_eq!(c.link_dims(), vec![1, 1]);
        for idx in all_indices(&[2, 3, 2]) {
            assert_abs_diff_eq!(c.evaluate(&idx).unwrap(), 3.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_compress_preserves_values() {
        let a = TensorTrain::new(vec![
            Tensor3::from_data(vec![1.0, 2.0, 3.0], 1, 3, 1),
            Tensor3::from_data(vec![0.5, -1.0, 4.0], 1, 3, 1),
            Tensor3::from_data(vec![2.0, 1.0], 1, 2, 1),
        ])
        .unwrap();
        let b = TensorTrain::<f64>::constant(&[3, 3, 2], 0.25);
        let tt = a.hadamard(&a).unwrap().add(&b).unwrap().add(&a).unwrap();
        let c = tt.compressed(&CompressionOptions::default()).unwrap();
        assert!(c.rank() <= tt.rank());
        for idx in all_indices(&[3, 3, 2]) {
            assert_abs_diff_eq!(
                c.evaluate(&idx).unwrap(),
                tt.evaluate(&idx).unwrap(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_compress_zero_train() {
        let z = TensorTrain::<f64>::zeros(&[2, 2]);
        let tt = z.add(&z).unwrap();
        let c = tt.compressed(&CompressionOptions::default()).unwrap();
        assert_eq!(c.link_dims(), vec![1]);
        assert_eq!(c.sum(), 0.0);
    }

    #[test]
    fn test_max_bond_dim_truncates() {
        let a = TensorTrain::new(vec![
            Tensor3::from_data(vec![1.0, 2.0, 3.0], 1, 3, 1),
            Tensor3::from_data(vec![1.0, -1.0, 2.0], 1, 3, 1),
        ])
        .unwrap();
        let b = TensorTrain::new(vec![
            Tensor3::from_data(vec![1.0, 0.0, 1.0], 1, 3, 1),
            Tensor3::from_data(vec![0.0, 1.0, 5.0], 1, 3, 1),
        ])
        .unwrap();
        let tt = a.add(&b).unwrap();
        let c = tt
            .compressed(&CompressionOptions::default().with_max_bond_dim(1))
            .unwrap();
        assert_eq!(c.link_dims(), vec![1]);
    }
}
