//! Cross interpolation read off a rank-revealing LU
//!
//! The pivots of `P_r A P_c ≈ L U` give the row set `I` and column set `J`.
//! Writing `C = A[:, J]`, `R = A[I, :]` and `P = A[I, J]`, the interpolant is
//! `C P⁻¹ R`, and both half-products come from triangular solves against the
//! leading pivot block `L11` or `U11`:
//!
//! - `C P⁻¹ = L L11⁻¹`
//! - `P⁻¹ R = U11⁻¹ U`

use crate::error::Result;
use crate::matrixlu::{rrlu, RrLU, RrLUOptions};
use crate::traits::AbstractMatrixCI;
use crate::util::{mat_mul, ncols, nrows, zeros, Matrix, Scalar};

/// LU-based matrix cross interpolation
#[derive(Debug, Clone)]
pub struct MatrixLUCI<T: Scalar> {
    lu: RrLU<T>,
    row_indices: Vec<usize>,
    col_indices: Vec<usize>,
}

/// `num / den`, or zero when `den` is numerically singular
fn safe_div<T: Scalar>(num: T, den: T) -> T {
    if den.abs_sq() < T::epsilon() {
        T::zero()
    } else {
        num / den
    }
}

impl<T: Scalar> MatrixLUCI<T> {
    pub fn from_matrix(a: &Matrix<T>, options: Option<RrLUOptions>) -> Result<Self> {
        Ok(Self::from_rrlu(rrlu(a, options)?))
    }

    pub fn from_rrlu(lu: RrLU<T>) -> Self {
        let row_indices = lu.row_indices();
        let col_indices = lu.col_indices();
        Self {
            lu,
            row_indices,
            col_indices,
        }
    }

    pub fn lu(&self) -> &RrLU<T> {
        &self.lu
    }

    /// See [`RrLU::pivot_errors`]
    pub fn pivot_errors(&self) -> Vec<f64> {
        self.lu.pivot_errors()
    }

    pub fn last_pivot_error(&self) -> f64 {
        self.lu.last_pivot_error()
    }

    fn unpermute_rows(&self, permuted: Matrix<T>) -> Matrix<T> {
        let perm = self.lu.row_permutation();
        let mut inverse = vec![0; perm.len()];
        for (k, &orig) in perm.iter().enumerate() {
            inverse[orig] = k;
        }
        let cols: Vec<usize> = (0..ncols(&permuted)).collect();
        permuted.select(&inverse, &cols)
    }

    fn unpermute_cols(&self, permuted: Matrix<T>) -> Matrix<T> {
        let perm = self.lu.col_permutation();
        let mut inverse = vec![0; perm.len()];
        for (k, &orig) in perm.iter().enumerate() {
            inverse[orig] = k;
        }
        let rows: Vec<usize> = (0..nrows(&permuted)).collect();
        permuted.select(&rows, &inverse)
    }

    /// `C = A[:, J]`, `nrows × rank`
    pub fn col_matrix(&self) -> Matrix<T> {
        let n = self.rank();
        let l = self.lu.l_factor();
        let u = self.lu.u_factor();
        let mut c = zeros(nrows(l), n);
        for i in 0..nrows(l) {
            for j in 0..n {
                let mut sum = T::zero();
                for k in 0..=j {
                    sum = sum + l[[i, k]] * u[[k, j]];
                }
                c[[i, j]] = sum;
            }
        }
        self.unpermute_rows(c)
    }

    /// `R = A[I, :]`, `rank × ncols`
    pub fn row_matrix(&self) -> Matrix<T> {
        let n = self.rank();
        let l = self.lu.l_factor();
        let u = self.lu.u_factor();
        let mut r = zeros(n, ncols(u));
        for i in 0..n {
            for j in 0..ncols(u) {
                let mut sum = T::zero();
                for k in 0..=i {
                    sum = sum + l[[i, k]] * u[[k, j]];
                }
                r[[i, j]] = sum;
            }
        }
        self.unpermute_cols(r)
    }

    /// `C P⁻¹`: solves `X L11 = L` row by row. Pivot rows map to unit vectors.
    pub fn cols_times_pivot_inv(&self) -> Matrix<T> {
        let n = self.rank();
        let l = self.lu.l_factor();
        let nr = nrows(l);
        let mut x = zeros(nr, n);
        for i in 0..nr {
            for j in (0..n).rev() {
                let mut s = l[[i, j]];
                for m in (j + 1)..n {
                    s = s - x[[i, m]] * l[[m, j]];
                }
                x[[i, j]] = safe_div(s, l[[j, j]]);
            }
        }
        self.unpermute_rows(x)
    }

    /// `P⁻¹ R`: solves `U11 Y = U` column by column. Pivot columns map to unit vectors.
    pub fn pivot_inv_times_rows(&self) -> Matrix<T> {
        let n = self.rank();
        let u = self.lu.u_factor();
        let nc = ncols(u);
        let mut y = zeros(n, nc);
        for c in 0..nc {
            for i in (0..n).rev() {
                let mut s = u[[i, c]];
                for m in (i + 1)..n {
                    s = s - u[[i, m]] * y[[m, c]];
                }
                y[[i, c]] = safe_div(s, u[[i, i]]);
            }
        }
        self.unpermute_cols(y)
    }

    /// Left factor of `A ≈ left · right`; carries `P⁻¹` when the LU is
    /// left-orthogonal
    pub fn left(&self) -> Matrix<T> {
        if self.lu.is_left_orthogonal() {
            self.cols_times_pivot_inv()
        } else {
            self.col_matrix()
        }
    }

    /// Right factor of `A ≈ left · right`
    pub fn right(&self) -> Matrix<T> {
        if self.lu.is_left_orthogonal() {
            self.row_matrix()
        } else {
            self.pivot_inv_times_rows()
        }
    }
}

impl<T: Scalar> AbstractMatrixCI<T> for MatrixLUCI<T> {
    fn nrows(&self) -> usize {
        self.lu.nrows()
    }

    fn ncols(&self) -> usize {
        self.lu.ncols()
    }

    fn rank(&self) -> usize {
        self.lu.npivots()
    }

    fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    fn block(&self, rows: &[usize], cols: &[usize]) -> Matrix<T> {
        let all_pivots: Vec<usize> = (0..self.rank()).collect();
        let left = self.left().select(rows, &all_pivots);
        let right = self.right().select(&all_pivots, cols);
        mat_mul(&left, &right)
    }
}
