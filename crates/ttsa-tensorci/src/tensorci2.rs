//! Two-site tensor cross interpolation
//!
//! Pivot prefixes `I_b` and suffixes `J_b` are refined by alternating
//! half-sweeps. At bond `b` the block `Π = f((I_b × s_b) × (s_{b+1} × J_{b+1}))`
//! is factorized with a rank-revealing LU; its pivot rows and columns become
//! the new `I_{b+1}` and `J_b`, and the cores at `b`, `b + 1` are read off the
//! cross interpolation of `Π`. After each half-sweep a seeded random search
//! adds the worst-approximated points as global pivots.

use crate::error::{Result, TCIError};
use crate::indexset::{IndexSet, MultiIndex};
use crate::source::{CrossSource, FunctionSource};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ttsa_matrixci::{AbstractMatrixCI, Matrix, MatrixLUCI, RrLUOptions};
use ttsa_tensortrain::{AbstractTensorTrain, TTScalar, Tensor3, TensorTrain};

/// Options for the cross interpolation
#[derive(Debug, Clone)]
pub struct CrossOptions {
    /// Tolerance for convergence (relative to the largest sample when
    /// `normalize_error` is set)
    pub tolerance: f64,
    /// Maximum number of half-sweeps
    pub max_iter: usize,
    pub max_bond_dim: usize,
    /// Random points drawn for the initial pivot and each global search
    pub nsearch: usize,
    /// Global pivots added per half-sweep at most
    pub max_nglobal_pivot: usize,
    /// Seed of the random searches
    pub seed: u64,
    /// Measure errors relative to the largest sample magnitude
    pub normalize_error: bool,
}

impl Default for CrossOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iter: 20,
            max_bond_dim: 64,
            nsearch: 100,
            max_nglobal_pivot: 5,
            seed: 0,
            normalize_error: true,
        }
    }
}

impl CrossOptions {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the half-sweep cap
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the bond dimension cap
    pub fn with_max_bond_dim(mut self, max_bond_dim: usize) -> Self {
        self.max_bond_dim = max_bond_dim;
        self
    }

    /// Set the number of random search points
    pub fn with_nsearch(mut self, nsearch: usize) -> Self {
        self.nsearch = nsearch;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// State of a two-site cross interpolation
#[derive(Debug, Clone)]
pub struct TensorCI2<T: TTScalar> {
    /// `i_set[p]`: prefixes of length `p`
    i_set: Vec<IndexSet<MultiIndex>>,
    /// `j_set[p]`: suffixes of length `n - p - 1`
    j_set: Vec<IndexSet<MultiIndex>>,
    local_dims: Vec<usize>,
    site_tensors: Vec<Tensor3<T>>,
    /// Last rejected pivot per bond
    bond_errors: Vec<f64>,
    max_sample_value: f64,
    converged: bool,
}

fn magnitude<T: TTScalar>(v: T) -> f64 {
    v.abs_sq().sqrt()
}

impl<T: TTScalar> TensorCI2<T> {
    /// Create an empty state; site tensors start as rank-1 zeros
    pub fn new(local_dims: Vec<usize>) -> Result<Self> {
        if local_dims.is_empty() {
            return Err(TCIError::Empty);
        }
        if let Some(p) = local_dims.iter().position(|&d| d == 0) {
            return Err(TCIError::DimensionMismatch {
                message: format!("site {p} has local dimension 0"),
            });
        }
        let n = local_dims.len();
        Ok(Self {
            i_set: (0..n).map(|_| IndexSet::new()).collect(),
            j_set: (0..n).map(|_| IndexSet::new()).collect(),
            site_tensors: local_dims.iter().map(|&d| Tensor3::zeros(1, d, 1)).collect(),
            local_dims,
            bond_errors: vec![0.0; n.saturating_sub(1)],
            max_sample_value: 0.0,
            converged: false,
        })
    }

    pub fn len(&self) -> usize {
        self.local_dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_dims.is_empty()
    }

    pub fn local_dims(&self) -> &[usize] {
        &self.local_dims
    }

    /// Bond dimensions of the current site tensors
    pub fn link_dims(&self) -> Vec<usize> {
        self.site_tensors.iter().skip(1).map(|t| t.left_dim()).collect()
    }

    /// Largest current bond dimension
    pub fn rank(&self) -> usize {
        self.link_dims().into_iter().max().unwrap_or(1)
    }

    /// Largest sample magnitude seen so far
    pub fn max_sample_value(&self) -> f64 {
        self.max_sample_value
    }

    /// Largest bond error of the last half-sweep
    pub fn max_bond_error(&self) -> f64 {
        self.bond_errors.iter().copied().fold(0.0, f64::max)
    }

    /// Whether the last run met the convergence criterion
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    pub fn site_tensor(&self, p: usize) -> &Tensor3<T> {
        &self.site_tensors[p]
    }

    /// Snapshot of the current cores
    pub fn to_tensor_train(&self) -> Result<TensorTrain<T>> {
        Ok(TensorTrain::new(self.site_tensors.clone())?)
    }

    /// Insert every prefix and suffix of each pivot into `I` and `J`
    pub fn add_global_pivots(&mut self, pivots: &[MultiIndex]) -> Result<()> {
        for pivot in pivots {
            if pivot.len() != self.len() {
                return Err(TCIError::DimensionMismatch {
                    message: format!(
                        "pivot {pivot:?} has {} indices for {} sites",
                        pivot.len(),
                        self.len()
                    ),
                });
            }
            if let Some(p) = (0..self.len()).find(|&p| pivot[p] >= self.local_dims[p]) {
                return Err(TCIError::InvalidPivot {
                    message: format!("pivot {pivot:?} out of range at site {p}"),
                });
            }
            for p in 0..self.len() {
                self.i_set[p].insert(pivot[..p].to_vec());
                self.j_set[p].insert(pivot[p + 1..].to_vec());
            }
        }
        Ok(())
    }

    fn observe(&mut self, values: &[T]) {
        for &v in values {
            self.max_sample_value = self.max_sample_value.max(magnitude(v));
        }
    }

    fn abs_tol(&self, options: &CrossOptions) -> f64 {
        if options.normalize_error {
            options.tolerance * self.max_sample_value
        } else {
            options.tolerance
        }
    }

    fn normalized(&self, error: f64, options: &CrossOptions) -> f64 {
        if options.normalize_error && self.max_sample_value > 0.0 {
            error / self.max_sample_value
        } else {
            error
        }
    }

    /// Two-site update at bond `b`
    fn update_pivots<S: CrossSource<T>>(
        &mut self,
        source: &mut S,
        b: usize,
        left_orthogonal: bool,
        options: &CrossOptions,
    ) -> Result<()> {
        let i_prev: Vec<MultiIndex> = self.i_set[b].values().to_vec();
        let j_next: Vec<MultiIndex> = self.j_set[b + 1].values().to_vec();
        let (db, db1) = (self.local_dims[b], self.local_dims[b + 1]);
        let nrows = i_prev.len() * db;
        let ncols = db1 * j_next.len();

        let values = source.evaluate_block(b, &i_prev, &j_next)?;
        self.observe(&values);
        let pi = Matrix::from_row_major(values, nrows, ncols);

        let lu_options = RrLUOptions::default()
            .with_max_rank(options.max_bond_dim.max(1))
            .with_rel_tol(0.0)
            .with_abs_tol(self.abs_tol(options))
            .with_left_orthogonal(left_orthogonal);
        let luci = MatrixLUCI::from_matrix(&pi, Some(lu_options))?;
        self.bond_errors[b] = luci.last_pivot_error();

        let row_of = |r: usize| {
            let mut idx = i_prev[r / db].clone();
            idx.push(r % db);
            idx
        };
        let col_of = |c: usize| {
            let mut idx = vec![c / j_next.len()];
            idx.extend_from_slice(&j_next[c % j_next.len()]);
            idx
        };

        let (left, right, rows, cols): (Vec<T>, Vec<T>, Vec<MultiIndex>, Vec<MultiIndex>) =
            if luci.rank() == 0 {
                // identically zero block: keep one pivot so the sets stay non-empty
                (
                    vec![T::zero(); nrows],
                    vec![T::zero(); ncols],
                    vec![row_of(0)],
                    vec![col_of(0)],
                )
            } else {
                (
                    luci.left().into_vec(),
                    luci.right().into_vec(),
                    luci.row_indices().iter().map(|&r| row_of(r)).collect(),
                    luci.col_indices().iter().map(|&c| col_of(c)).collect(),
                )
            };
        let rank = rows.len();

        self.i_set[b + 1] = IndexSet::from_vec(rows);
        self.j_set[b] = IndexSet::from_vec(cols);
        self.site_tensors[b] = Tensor3::from_data(left, i_prev.len(), db, rank);
        self.site_tensors[b + 1] = Tensor3::from_data(right, rank, db1, j_next.len());
        Ok(())
    }

    /// Compare the current train with the source at random points and add
    /// the worst offenders as global pivots. Returns how many were added.
    fn search_global_pivots<S: CrossSource<T>>(
        &mut self,
        source: &mut S,
        rng: &mut ChaCha8Rng,
        options: &CrossOptions,
    ) -> Result<usize> {
        if options.nsearch == 0 || options.max_nglobal_pivot == 0 {
            return Ok(0);
        }
        let candidates: Vec<MultiIndex> = (0..options.nsearch)
            .map(|_| random_index(&self.local_dims, rng))
            .collect();
        let exact = source.evaluate_batch(&candidates)?;
        self.observe(&exact);
        let tt = self.to_tensor_train()?;
        let approx = tt.evaluate_batch(&candidates)?;

        let threshold = self.abs_tol(options);
        let mut offenders: Vec<(f64, &MultiIndex)> = candidates
            .iter()
            .zip(exact.iter().zip(&approx))
            .map(|(idx, (&e, &a))| (magnitude(e - a), idx))
            .filter(|(err, _)| *err > threshold)
            .collect();
        offenders.sort_by(|a, b| b.0.total_cmp(&a.0));
        offenders.truncate(options.max_nglobal_pivot);

        let pivots: Vec<MultiIndex> = offenders.into_iter().map(|(_, idx)| idx.clone()).collect();
        self.add_global_pivots(&pivots)?;
        Ok(pivots.len())
    }
}

fn random_index(local_dims: &[usize], rng: &mut ChaCha8Rng) -> MultiIndex {
    local_dims.iter().map(|&d| rng.random_range(0..d)).collect()
}

/// Run the two-site sweeps against any sample source
///
/// Returns the final state together with the rank and normalized error
/// after every half-sweep.
pub fn run_tci2<T, S>(
    source: &mut S,
    initial_pivots: Vec<MultiIndex>,
    options: &CrossOptions,
) -> Result<(TensorCI2<T>, Vec<usize>, Vec<f64>)>
where
    T: TTScalar,
    S: CrossSource<T>,
{
    let local_dims = source.local_dims();
    let mut tci = TensorCI2::new(local_dims.clone())?;
    let n = tci.len();

    if n == 1 {
        let all: Vec<MultiIndex> = (0..local_dims[0]).map(|s| vec![s]).collect();
        let values = source.evaluate_batch(&all)?;
        tci.observe(&values);
        tci.site_tensors[0] = Tensor3::from_data(values, 1, local_dims[0], 1);
        tci.converged = true;
        return Ok((tci, vec![1], vec![0.0]));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let mut pivots = initial_pivots;
    let samples: Vec<MultiIndex> = (0..options.nsearch.max(1))
        .map(|_| random_index(&local_dims, &mut rng))
        .collect();
    let sample_values = source.evaluate_batch(&samples)?;
    tci.observe(&sample_values);
    let pivot_values = source.evaluate_batch(&pivots)?;
    tci.observe(&pivot_values);

    if tci.max_sample_value == 0.0 {
        tracing::debug!("all samples vanish, returning the zero tensor train");
        tci.converged = true;
        return Ok((tci, vec![1], vec![0.0]));
    }

    if let Some((best, _)) = samples
        .iter()
        .zip(&sample_values)
        .max_by(|a, b| magnitude(*a.1).total_cmp(&magnitude(*b.1)))
    {
        pivots.push(best.clone());
    }
    tci.add_global_pivots(&pivots)?;

    let (mut ranks, mut errors) = (Vec::new(), Vec::new());
    let mut previous_dims: Option<Vec<usize>> = None;

    for sweep in 0..options.max_iter {
        let forward = sweep % 2 == 0;
        let bonds: Vec<usize> = if forward {
            (0..n - 1).collect()
        } else {
            (0..n - 1).rev().collect()
        };
        for b in bonds {
            tci.update_pivots(source, b, forward, options)?;
        }

        let dims = tci.link_dims();
        let error = tci.normalized(tci.max_bond_error(), options);
        let n_global = tci.search_global_pivots(source, &mut rng, options)?;
        ranks.push(tci.rank());
        errors.push(error);

        tracing::debug!(
            sweep = sweep + 1,
            rank = tci.rank(),
            error,
            n_global,
            "tci2 half-sweep"
        );

        if sweep >= 1
            && previous_dims.as_ref() == Some(&dims)
            && error < options.tolerance
            && n_global == 0
        {
            tci.converged = true;
            break;
        }
        previous_dims = Some(dims);
    }

    if !tci.converged {
        tracing::warn!(
            max_iter = options.max_iter,
            rank = tci.rank(),
            error = errors.last().copied().unwrap_or(f64::NAN),
            "cross interpolation did not converge"
        );
    }

    Ok((tci, ranks, errors))
}

/// Interpolate an element function `f(multi-index)` over `local_dims`
///
/// `batched_f`, when given, receives every block of indices in one call and
/// `f` is never used. `initial_pivots` may be empty. Returns the state with
/// the per-half-sweep ranks and normalized errors, as [`run_tci2`] does.
pub fn crossinterpolate2<T, F, B>(
    f: F,
    batched_f: Option<B>,
    local_dims: Vec<usize>,
    initial_pivots: Vec<MultiIndex>,
    options: CrossOptions,
) -> Result<(TensorCI2<T>, Vec<usize>, Vec<f64>)>
where
    T: TTScalar,
    F: Fn(&MultiIndex) -> T,
    B: Fn(&[MultiIndex]) -> Vec<T>,
{
    let batch = |indices: &[MultiIndex]| match &batched_f {
        Some(bf) => bf(indices),
        None => indices.iter().map(&f).collect(),
    };
    let mut source = FunctionSource::new(local_dims, batch);
    run_tci2(&mut source, initial_pivots, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    type NoBatch = fn(&[MultiIndex]) -> Vec<f64>;

    fn all_indices(dims: &[usize]) -> Vec<MultiIndex> {
        let mut out = vec![vec![]];
        for &d in dims {
            out = out
                .into_iter()
                .flat_map(|p: MultiIndex| {
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
    fn test_tensorci2_new() {
        let tci = TensorCI2::<f64>::new(vec![2, 3, 2]).unwrap();
        assert_eq!(tci.len(), 3);
        assert_eq!(tci.local_dims(), &[2, 3, 2]);
        assert!(TensorCI2::<f64>::new(vec![]).is_err());
        assert!(TensorCI2::<f64>::new(vec![2, 0]).is_err());
    }

    #[test]
    fn test_crossinterpolate2_constant() {
        let (tci, ranks, _) = crossinterpolate2::<f64, _, NoBatch>(
            |_| 1.0,
            None,
            vec![2, 2],
            vec![vec![0, 0]],
            CrossOptions::default(),
        )
        .unwrap();
        assert!(tci.is_converged());
        assert_eq!(ranks.last(), Some(&1));
        let tt = tci.to_tensor_train().unwrap();
        assert_abs_diff_eq!(tt.sum(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_crossinterpolate2_rank2_function() {
        let f = |idx: &MultiIndex| (idx[0] + idx[1] + idx[2]) as f64 + 1.0;
        let batched = |xs: &[MultiIndex]| xs.iter().map(f).collect::<Vec<f64>>();
        let (tci, _, errors) = crossinterpolate2(
            f,
            Some(batched),
            vec![4, 5, 3],
            vec![],
            CrossOptions::default().with_tolerance(1e-12),
        )
        .unwrap();

        assert!(tci.is_converged());
        assert_eq!(tci.rank(), 2);
        assert!(errors.last().copied().unwrap_or(1.0) < 1e-12);
        let tt = tci.to_tensor_train().unwrap();
        for idx in all_indices(&[4, 5, 3]) {
            assert_abs_diff_eq!(tt.evaluate(&idx).unwrap(), f(&idx), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_localized_feature_found_by_global_search() {
        // a single spike that the first pivot cannot see
        let f = |idx: &MultiIndex| {
            let base = 1.0 + 0.1 * idx[0] as f64;
            if idx == &vec![5, 6, 7, 1] {
                base + 10.0
            } else {
                base
            }
        };
        let dims = vec![8, 8, 8, 2];
        let (tci, _, _) = crossinterpolate2::<f64, _, NoBatch>(
            f,
            None,
            dims.clone(),
            vec![vec![5, 6, 7, 1]],
            CrossOptions::default().with_tolerance(1e-10),
        )
        .unwrap();
        let tt = tci.to_tensor_train().unwrap();
        assert_abs_diff_eq!(tt.evaluate(&[5, 6, 7, 1]).unwrap(), 11.5, epsilon = 1e-8);
        assert_abs_diff_eq!(tt.evaluate(&[0, 0, 0, 0]).unwrap(), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(tt.evaluate(&[7, 1, 2, 1]).unwrap(), 1.7, epsilon = 1e-8);
    }

    #[test]
    fn test_zero_function() {
        let (tci, _, _) = crossinterpolate2::<f64, _, NoBatch>(
            |_| 0.0,
            None,
            vec![3, 3, 3],
            vec![],
            CrossOptions::default(),
        )
        .unwrap();
        let tt = tci.to_tensor_train().unwrap();
        assert_eq!(tt.sum(), 0.0);
        assert_eq!(tt.rank(), 1);
    }

    #[test]
    fn test_single_site_is_exhaustive() {
        let (tci, _, _) = crossinterpolate2::<f64, _, NoBatch>(
            |idx| (idx[0] * idx[0]) as f64,
            None,
            vec![5],
            vec![],
            CrossOptions::default(),
        )
        .unwrap();
        assert_eq!(
            tci.to_tensor_train().unwrap().fulltensor(),
            vec![0.0, 1.0, 4.0, 9.0, 16.0]
        );
    }

    #[test]
    fn test_max_iter_zero_reports_not_converged() {
        let (tci, ranks, _) = crossinterpolate2::<f64, _, NoBatch>(
            |idx| (idx[0] + idx[1]) as f64 + 1.0,
            None,
            vec![3, 3],
            vec![],
            CrossOptions::default().with_max_iter(0),
        )
        .unwrap();
        assert!(!tci.is_converged());
        assert!(ranks.is_empty());
    }

    #[test]
    fn test_bad_pivot_rejected() {
        let result = crossinterpolate2::<f64, _, NoBatch>(
            |_| 1.0,
            None,
            vec![2, 2],
            vec![vec![0, 2]],
            CrossOptions::default(),
        );
        assert!(result.is_err());
    }
}
