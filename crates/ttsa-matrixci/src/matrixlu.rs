//! Rank-revealing LU with full pivoting
//!
//! Each step moves the largest remaining entry onto the diagonal and
//! eliminates. Elimination stops once the next pivot would fall below the
//! relative or absolute threshold, or the rank cap is hit.

use crate::error::{MatrixCIError, Result};
use crate::util::{ncols, nrows, trailing_argmax, zeros, Matrix, Scalar};

/// Truncated factorization `P_r A P_c ≈ L U`
///
/// `L` keeps the leading `npivots` columns and `U` the leading `npivots`
/// rows; both are stored in permuted order.
#[derive(Debug, Clone)]
pub struct RrLU<T: Scalar> {
    /// Position k of the permuted rows holds original row `row_permutation[k]`
    row_permutation: Vec<usize>,
    col_permutation: Vec<usize>,
    l: Matrix<T>,
    u: Matrix<T>,
    /// Unit diagonal sits on `L` when set, on `U` otherwise
    left_orthogonal: bool,
    n_pivot: usize,
    /// Magnitude of the first rejected pivot (0 when full rank)
    error: f64,
}

impl<T: Scalar> RrLU<T> {
    /// Identity permutations and no pivots
    pub fn new(nr: usize, nc: usize, left_orthogonal: bool) -> Self {
        Self {
            row_permutation: (0..nr).collect(),
            col_permutation: (0..nc).collect(),
            l: zeros(nr, 0),
            u: zeros(0, nc),
            left_orthogonal,
            n_pivot: 0,
            error: 0.0,
        }
    }

    pub fn nrows(&self) -> usize {
        nrows(&self.l)
    }

    pub fn ncols(&self) -> usize {
        ncols(&self.u)
    }

    /// Rank reached by the elimination
    pub fn npivots(&self) -> usize {
        self.n_pivot
    }

    pub fn row_permutation(&self) -> &[usize] {
        &self.row_permutation
    }

    pub fn col_permutation(&self) -> &[usize] {
        &self.col_permutation
    }

    /// Original indices of the pivot rows, first pivot first
    pub fn row_indices(&self) -> Vec<usize> {
        self.row_permutation[..self.n_pivot].to_vec()
    }

    /// Original indices of the pivot columns, first pivot first
    pub fn col_indices(&self) -> Vec<usize> {
        self.col_permutation[..self.n_pivot].to_vec()
    }

    pub fn l_factor(&self) -> &Matrix<T> {
        &self.l
    }

    pub fn u_factor(&self) -> &Matrix<T> {
        &self.u
    }

    /// `L`, with rows put back in the original order when `permute` is set
    pub fn left(&self, permute: bool) -> Matrix<T> {
        if !permute {
            return self.l.clone();
        }
        let (rows, cols) = (nrows(&self.l), ncols(&self.l));
        let mut out = zeros(rows, cols);
        for (k, &orig) in self.row_permutation.iter().enumerate() {
            for j in 0..cols {
                out[[orig, j]] = self.l[[k, j]];
            }
        }
        out
    }

    /// `U`, with columns put back in the original order when `permute` is set
    pub fn right(&self, permute: bool) -> Matrix<T> {
        if !permute {
            return self.u.clone();
        }
        let (rows, cols) = (nrows(&self.u), ncols(&self.u));
        let mut out = zeros(rows, cols);
        for i in 0..rows {
            for (k, &orig) in self.col_permutation.iter().enumerate() {
                out[[i, orig]] = self.u[[i, k]];
            }
        }
        out
    }

    /// Accepted pivot magnitudes, then the first rejected one
    pub fn pivot_errors(&self) -> Vec<f64> {
        let pivots = if self.left_orthogonal { &self.u } else { &self.l };
        (0..self.n_pivot)
            .map(|i| pivots[[i, i]].abs_sq().sqrt())
            .chain(std::iter::once(self.error))
            .collect()
    }

    /// First rejected pivot magnitude, 0 for an exact factorization
    pub fn last_pivot_error(&self) -> f64 {
        self.error
    }

    pub fn is_left_orthogonal(&self) -> bool {
        self.left_orthogonal
    }
}

/// Stopping rules of [`rrlu`]
#[derive(Debug, Clone)]
pub struct RrLUOptions {
    pub max_rank: usize,
    /// Reject a pivot smaller than `rel_tol` times the first one
    pub rel_tol: f64,
    /// Reject a pivot smaller than this
    pub abs_tol: f64,
    pub left_orthogonal: bool,
}

impl Default for RrLUOptions {
    fn default() -> Self {
        Self {
            max_rank: usize::MAX,
            rel_tol: 1e-14,
            abs_tol: 0.0,
            left_orthogonal: true,
        }
    }
}

impl RrLUOptions {
    pub fn with_max_rank(mut self, max_rank: usize) -> Self {
        self.max_rank = max_rank;
        self
    }

    pub fn with_rel_tol(mut self, rel_tol: f64) -> Self {
        self.rel_tol = rel_tol;
        self
    }

    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    pub fn with_left_orthogonal(mut self, left_orthogonal: bool) -> Self {
        self.left_orthogonal = left_orthogonal;
        self
    }
}

/// Factorize `a` in place, leaving it partially eliminated
///
/// A matrix of zeros has no pivots.
pub fn rrlu_inplace<T: Scalar>(a: &mut Matrix<T>, options: Option<RrLUOptions>) -> Result<RrLU<T>> {
    let opts = options.unwrap_or_default();
    let nr = nrows(a);
    let nc = ncols(a);

    let mut lu = RrLU::new(nr, nc, opts.left_orthogonal);
    let max_rank = opts.max_rank.min(nr).min(nc);
    let mut first_pivot = 0.0f64;

    while lu.n_pivot < max_rank {
        let k = lu.n_pivot;
        let Some((pivot_row, pivot_col, pivot_abs)) = trailing_argmax(a, k) else {
            break;
        };

        if pivot_abs == 0.0 {
            break;
        }
        if k > 0 && (pivot_abs < opts.rel_tol * first_pivot || pivot_abs < opts.abs_tol) {
            break;
        }
        if k == 0 {
            first_pivot = pivot_abs;
        }

        a.swap_rows(k, pivot_row);
        lu.row_permutation.swap(k, pivot_row);
        a.swap_cols(k, pivot_col);
        lu.col_permutation.swap(k, pivot_col);

        let pivot = a[[k, k]];
        if opts.left_orthogonal {
            for i in (k + 1)..nr {
                a[[i, k]] = a[[i, k]] / pivot;
            }
        } else {
            for j in (k + 1)..nc {
                a[[k, j]] = a[[k, j]] / pivot;
            }
        }

        // Schur complement: A[k+1:, k+1:] -= A[k+1:, k] * A[k, k+1:]
        for i in (k + 1)..nr {
            let x = a[[i, k]];
            if x.abs_sq() == 0.0 {
                continue;
            }
            for j in (k + 1)..nc {
                a[[i, j]] = a[[i, j]] - x * a[[k, j]];
            }
        }

        lu.n_pivot += 1;
    }

    let n = lu.n_pivot;
    lu.error = trailing_argmax(a, n).map_or(0.0, |(_, _, v)| v);

    let unit_l = opts.left_orthogonal;
    let mut l = zeros(nr, n);
    let mut u = zeros(n, nc);
    for i in 0..nr {
        for j in 0..nc {
            let v = a[[i, j]];
            if j < n && j < i {
                l[[i, j]] = v;
            } else if i < n && j == i {
                l[[i, i]] = if unit_l { T::one() } else { v };
                u[[i, i]] = if unit_l { v } else { T::one() };
            } else if i < n && j > i {
                u[[i, j]] = v;
            }
        }
    }

    for (name, factor) in [("L", &l), ("U", &u)] {
        if factor.as_slice().iter().any(|v| v.is_nan()) {
            return Err(MatrixCIError::NaNEncountered {
                matrix: name.to_string(),
            });
        }
    }

    lu.l = l;
    lu.u = u;

    Ok(lu)
}

/// [`rrlu_inplace`] on a copy of `a`
pub fn rrlu<T: Scalar>(a: &Matrix<T>, options: Option<RrLUOptions>) -> Result<RrLU<T>> {
    let mut a_copy = a.clone();
    rrlu_inplace(&mut a_copy, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{from_vec2d, mat_mul};

    fn assert_reconstructs<T: Scalar>(m: &Matrix<T>, lu: &RrLU<T>, tol: f64) {
        let reconstructed = mat_mul(&lu.left(true), &lu.right(true));
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                let diff = (m[[i, j]] - reconstructed[[i, j]]).abs_sq().sqrt();
                assert!(diff < tol, "Reconstruction error at ({}, {}): {}", i, j, diff);
            }
        }
    }

    #[test]
    fn test_rrlu_identity() {
        let m = from_vec2d(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]);
        let lu = rrlu(&m, None).unwrap();

        assert_eq!(lu.npivots(), 3);
        assert_eq!(lu.last_pivot_error(), 0.0);
    }

    #[test]
    fn test_rrlu_rank_deficient() {
        let m = from_vec2d(vec![
            vec![1.0, 2.0, 3.0],
            vec![2.0, 4.0, 6.0],
            vec![3.0, 6.0, 9.0],
        ]);

        let lu = rrlu(&m, None).unwrap();

        assert_eq!(lu.npivots(), 1);
        // The first pivot is the largest entry
        assert_eq!(lu.row_indices(), vec![2]);
        assert_eq!(lu.col_indices(), vec![2]);
        assert_reconstructs(&m, &lu, 1e-12);
    }

    #[test]
    fn test_rrlu_full_rank() {
        let m = from_vec2d(vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 10.0],
        ]);

        let lu = rrlu(&m, None).unwrap();

        assert_eq!(lu.npivots(), 3);
        assert_reconstructs(&m, &lu, 1e-12);
    }

    #[test]
    fn test_rrlu_right_orthogonal_reconstruct() {
        let m = from_vec2d(vec![vec![1.0, 2.0, 0.5], vec![3.0, 4.0, -1.0]]);
        let opts = RrLUOptions::default().with_left_orthogonal(false);

        let lu = rrlu(&m, Some(opts)).unwrap();
        assert!(!lu.is_left_orthogonal());
        assert_eq!(lu.npivots(), 2);
        assert_reconstructs(&m, &lu, 1e-12);
    }

    #[test]
    fn test_rrlu_max_rank_reports_next_pivot() {
        let m = from_vec2d(vec![
            vec![10.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.1],
        ]);
        let lu = rrlu(&m, Some(RrLUOptions::default().with_max_rank(2))).unwrap();

        assert_eq!(lu.npivots(), 2);
        assert!((lu.last_pivot_error() - 0.1).abs() < 1e-14);
        let errors = lu.pivot_errors();
        assert_eq!(errors.len(), 3);
        assert!((errors[0] - 10.0).abs() < 1e-14);
    }

    #[test]
    fn test_rrlu_abs_tol() {
        let m = from_vec2d(vec![vec![1.0, 0.0], vec![0.0, 1e-9]]);
        let lu = rrlu(&m, Some(RrLUOptions::default().with_abs_tol(1e-6))).unwrap();
        assert_eq!(lu.npivots(), 1);
        assert!((lu.last_pivot_error() - 1e-9).abs() < 1e-20);
    }

    #[test]
    fn test_rrlu_zero_matrix_has_no_pivots() {
        let m: Matrix<f64> = zeros(3, 2);
        let lu = rrlu(&m, None).unwrap();
        assert_eq!(lu.npivots(), 0);
        assert_eq!(lu.last_pivot_error(), 0.0);
    }

    #[test]
    fn test_rrlu_nan_is_an_error() {
        let m = from_vec2d(vec![vec![1.0, f64::NAN], vec![2.0, 3.0]]);
        // NaN never wins the magnitude comparison, so it ends up in the factors
        assert!(rrlu(&m, None).is_err());
    }
}
