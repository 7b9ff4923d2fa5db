//! Dense row-major matrix and the scalar trait shared by the LU routines

use num_traits::{Float, One, Zero};
use std::ops::{Index, IndexMut};

/// Simple 2D matrix backed by a row-major Vec
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T: Clone> Matrix<T> {
    /// Wrap row-major data. Panics if the length does not match the shape.
    pub fn from_row_major(data: Vec<T>, nrows: usize, ncols: usize) -> Self {
        assert_eq!(data.len(), nrows * ncols, "data length must be nrows * ncols");
        Self { data, nrows, ncols }
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Row-major view of the entries
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume the matrix and return its row-major entries
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    /// Swap rows `a` and `b` in place
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.ncols {
            self.data.swap(a * self.ncols + j, b * self.ncols + j);
        }
    }

    /// Swap columns `a` and `b` in place
    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for i in 0..self.nrows {
            self.data.swap(i * self.ncols + a, i * self.ncols + b);
        }
    }
}

impl<T: Clone + Zero> Matrix<T> {
    /// `nrows × ncols` block of zeros
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::from_row_major(vec![T::zero(); nrows * ncols], nrows, ncols)
    }

    /// Gather the entries at `rows × cols` into a new matrix
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Self {
        let data = rows
            .iter()
            .flat_map(|&r| cols.iter().map(move |&c| self[[r, c]].clone()))
            .collect();
        Self::from_row_major(data, rows.len(), cols.len())
    }
}

impl<T> Index<[usize; 2]> for Matrix<T> {
    type Output = T;

    fn index(&self, idx: [usize; 2]) -> &Self::Output {
        &self.data[idx[0] * self.ncols + idx[1]]
    }
}

impl<T> IndexMut<[usize; 2]> for Matrix<T> {
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut Self::Output {
        &mut self.data[idx[0] * self.ncols + idx[1]]
    }
}

/// Shorthand for [`Matrix::zeros`]
pub fn zeros<T: Clone + Zero>(nrows: usize, ncols: usize) -> Matrix<T> {
    Matrix::zeros(nrows, ncols)
}

/// Build a matrix from nested rows; every row must have the same length.
pub fn from_vec2d<T: Clone + Zero>(data: Vec<Vec<T>>) -> Matrix<T> {
    let nrows = data.len();
    let ncols = data.first().map_or(0, Vec::len);
    Matrix::from_row_major(data.into_iter().flatten().collect(), nrows, ncols)
}

pub fn nrows<T>(m: &Matrix<T>) -> usize {
    m.nrows
}

pub fn ncols<T>(m: &Matrix<T>) -> usize {
    m.ncols
}

/// Element type accepted by the LU kernels
pub trait Scalar:
    Clone
    + Copy
    + Zero
    + One
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + std::ops::Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Modulus, as a value of the same type
    fn abs(self) -> Self;

    /// `|x|^2` as a real number
    fn abs_sq(self) -> f64;

    fn is_nan(self) -> bool;

    /// Squared magnitude below which a diagonal entry counts as singular
    fn epsilon() -> f64 {
        1e-300
    }
}

impl Scalar for f64 {
    fn abs(self) -> Self {
        Float::abs(self)
    }

    fn abs_sq(self) -> f64 {
        self * self
    }

    fn is_nan(self) -> bool {
        Float::is_nan(self)
    }
}

/// Position and value of the largest-magnitude entry in the trailing block
/// `a[k.., k..]`. Returns `None` when the block is empty.
pub fn trailing_argmax<T: Scalar>(a: &Matrix<T>, k: usize) -> Option<(usize, usize, f64)> {
    if k >= a.nrows || k >= a.ncols {
        return None;
    }
    let mut best = (k, k, a[[k, k]].abs_sq());
    for i in k..a.nrows {
        for (offset, v) in a.row(i)[k..].iter().enumerate() {
            let val = v.abs_sq();
            if val > best.2 {
                best = (i, k + offset, val);
            }
        }
    }
    Some((best.0, best.1, best.2.sqrt()))
}

/// Unconjugated inner product; the slices must have equal length
pub fn dot<T: Scalar>(a: &[T], b: &[T]) -> T {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Dense product `a · b`, skipping zero entries of `a`
pub fn mat_mul<T: Scalar>(a: &Matrix<T>, b: &Matrix<T>) -> Matrix<T> {
    assert_eq!(a.ncols, b.nrows, "inner dimensions must agree");
    let mut out = zeros(a.nrows, b.ncols);
    for i in 0..a.nrows {
        for (l, &x) in a.row(i).iter().enumerate() {
            if x.abs_sq() == 0.0 {
                continue;
            }
            for (o, &y) in out.data[i * b.ncols..(i + 1) * b.ncols].iter_mut().zip(b.row(l)) {
                *o = *o + x * y;
            }
        }
    }
    out
}
