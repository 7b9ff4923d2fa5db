//! Site tensors and index aliases

use std::ops::Range;

/// Position inside one site
pub type LocalIndex = usize;

/// One position per site
pub type MultiIndex = Vec<LocalIndex>;

/// Three-way core of shape `(left, site, right)`, stored flat with the right
/// bond running fastest
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3<T> {
    data: Vec<T>,
    left_dim: usize,
    site_dim: usize,
    right_dim: usize,
}

impl<T: Clone + Default> Tensor3<T> {
    pub fn zeros(left_dim: usize, site_dim: usize, right_dim: usize) -> Self {
        Self::from_data(
            vec![T::default(); left_dim * site_dim * right_dim],
            left_dim,
            site_dim,
            right_dim,
        )
    }

    /// Wrap flat data. Panics if the length does not match the shape.
    pub fn from_data(data: Vec<T>, left_dim: usize, site_dim: usize, right_dim: usize) -> Self {
        assert_eq!(
            data.len(),
            left_dim * site_dim * right_dim,
            "core data does not match its shape"
        );
        Self {
            data,
            left_dim,
            site_dim,
            right_dim,
        }
    }

    /// Stack `(left_dim, right_dim)` matrices along the site axis
    pub fn from_slices(slices: &[Vec<T>], left_dim: usize, right_dim: usize) -> Self {
        let mut data = Vec::with_capacity(left_dim * slices.len() * right_dim);
        for l in 0..left_dim {
            for slice in slices {
                assert_eq!(slice.len(), left_dim * right_dim);
                data.extend_from_slice(&slice[l * right_dim..(l + 1) * right_dim]);
            }
        }
        Self::from_data(data, left_dim, slices.len(), right_dim)
    }

    pub fn left_dim(&self) -> usize {
        self.left_dim
    }

    pub fn site_dim(&self) -> usize {
        self.site_dim
    }

    pub fn right_dim(&self) -> usize {
        self.right_dim
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn offset(&self, l: usize, s: usize, r: usize) -> usize {
        (l * self.site_dim + s) * self.right_dim + r
    }

    pub fn get(&self, l: usize, s: usize, r: usize) -> &T {
        &self.data[self.offset(l, s, r)]
    }

    pub fn set(&mut self, l: usize, s: usize, r: usize, value: T) {
        let k = self.offset(l, s, r);
        self.data[k] = value;
    }

    /// Matrix `A[:, s, :]`, row-major `(left_dim, right_dim)`
    pub fn slice_site(&self, s: usize) -> Vec<T> {
        (0..self.left_dim)
            .flat_map(|l| {
                let start = self.offset(l, s, 0);
                self.data[start..start + self.right_dim].iter().cloned()
            })
            .collect()
    }

    /// New core whose k-th slice is slice `indices[k]` of this one.
    ///
    /// Indices may repeat, e.g. `[0, 1, 1]` turns a two-slice set core into
    /// the three-state encoding used by the game checks.
    pub fn select_sites(&self, indices: &[usize]) -> Self {
        let slices: Vec<Vec<T>> = indices.iter().map(|&s| self.slice_site(s)).collect();
        Self::from_slices(&slices, self.left_dim, self.right_dim)
    }

    /// `(left * site, right)` view used by left-to-right sweeps
    pub fn as_left_matrix(&self) -> (Vec<T>, usize, usize) {
        (self.data.clone(), self.left_dim * self.site_dim, self.right_dim)
    }

    /// `(left, site * right)` view; same flat layout as the core
    pub fn as_right_matrix(&self) -> (Vec<T>, usize, usize) {
        (self.data.clone(), self.left_dim, self.site_dim * self.right_dim)
    }

    pub fn map<U: Clone + Default>(&self, f: impl Fn(&T) -> U) -> Tensor3<U> {
        Tensor3 {
            data: self.data.iter().map(f).collect(),
            left_dim: self.left_dim,
            site_dim: self.site_dim,
            right_dim: self.right_dim,
        }
    }
}

impl<T> Tensor3<T>
where
    T: Clone + Default + std::ops::Add<Output = T> + std::ops::Mul<Output = T> + num_traits::Zero,
{
    /// Sum of the slices in `range` as a `(left_dim, right_dim)` matrix
    pub fn sum_slices(&self, range: Range<usize>) -> Vec<T> {
        let mut acc = vec![T::zero(); self.left_dim * self.right_dim];
        for s in range {
            for (a, v) in acc.iter_mut().zip(self.slice_site(s)) {
                *a = a.clone() + v;
            }
        }
        acc
    }
}

impl<T: crate::traits::TTScalar> Tensor3<T> {
    /// Mean of the slices in `range`; a zero matrix for an empty range
    pub fn mean_over_sites(&self, range: Range<usize>) -> Vec<T> {
        let count = range.len();
        let sum = self.sum_slices(range);
        if count == 0 {
            return sum;
        }
        let scale = T::from_f64(1.0 / count as f64);
        sum.into_iter().map(|v| v * scale).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tensor3<f64> {
        // (1, 3, 2) core with value 10*s + r
        let mut t = Tensor3::zeros(1, 3, 2);
        for s in 0..3 {
            for r in 0..2 {
                t.set(0, s, r, (10 * s + r) as f64);
            }
        }
        t
    }

    #[test]
    fn test_select_sites_repeats_slices() {
        let t = sample();
        let sel = t.select_sites(&[0, 2, 2]);
        assert_eq!(sel.site_dim(), 3);
        assert_eq!(sel.slice_site(0), vec![0.0, 1.0]);
        assert_eq!(sel.slice_site(1), vec![20.0, 21.0]);
        assert_eq!(sel.slice_site(2), vec![20.0, 21.0]);
    }

    #[test]
    fn test_sum_slices() {
        let t = sample();
        assert_eq!(t.sum_slices(1..3), vec![30.0, 32.0]);
        assert_eq!(t.sum_slices(0..0), vec![0.0, 0.0]);
        assert_eq!(t.mean_over_sites(1..3), vec![15.0, 16.0]);
        assert_eq!(t.mean_over_sites(0..0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_from_slices_layout_matches_get() {
        let t = Tensor3::from_slices(&[vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]], 2, 2);
        assert_eq!(*t.get(1, 0, 0), 3.0);
        assert_eq!(*t.get(0, 1, 1), 6.0);
        assert_eq!(t.slice_site(1), vec![5.0, 6.0, 7.0, 8.0]);
        let (data, rows, cols) = t.as_left_matrix();
        assert_eq!((rows, cols), (4, 2));
        assert_eq!(data[2 * 2 + 1], *t.get(1, 0, 1));
    }
}
