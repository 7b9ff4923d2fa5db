//! Read-only view shared by matrix cross interpolations

use crate::util::{Matrix, Scalar};

/// A rank-`r` approximation `A ≈ A[:, J] A[I, J]⁻¹ A[I, :]`
pub trait AbstractMatrixCI<T: Scalar>: Sized {
    fn nrows(&self) -> usize;

    fn ncols(&self) -> usize;

    /// Number of pivots, `|I| == |J|`
    fn rank(&self) -> usize;

    /// Pivot rows `I`
    fn row_indices(&self) -> &[usize];

    /// Pivot columns `J`
    fn col_indices(&self) -> &[usize];

    fn is_empty(&self) -> bool {
        self.rank() == 0
    }

    /// Approximated entries at `rows × cols`
    fn block(&self, rows: &[usize], cols: &[usize]) -> Matrix<T>;

    /// Whole approximated matrix
    fn to_matrix(&self) -> Matrix<T> {
        let rows: Vec<usize> = (0..self.nrows()).collect();
        let cols: Vec<usize> = (0..self.ncols()).collect();
        self.block(&rows, &cols)
    }
}
