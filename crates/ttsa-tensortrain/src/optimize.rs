//! Extremum search over the entries of a real tensor train
//!
//! Small trains are searched exhaustively with a depth-first walk that
//! caches the contracted prefix at every level. Larger trains fall back to
//! seeded random restarts refined by greedy coordinate ascent, which finds
//! the global optimum for low-rank trains in practice but does not prove it.

use crate::error::{Result, TensorTrainError};
use crate::tensortrain::TensorTrain;
use crate::traits::{vec_mat, AbstractTensorTrain};
use crate::types::MultiIndex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Options for [`maximize`], [`minimize`] and [`max_abs`]
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// Largest `numel` searched exhaustively
    pub exhaustive_limit: usize,
    /// Random starting points of the heuristic search
    pub n_restarts: usize,
    /// Coordinate-ascent passes per start
    pub max_passes: usize,
    /// Seed of the starting points
    pub seed: u64,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            exhaustive_limit: 1 << 20,
            n_restarts: 32,
            max_passes: 64,
            seed: 0,
        }
    }
}

impl OptimizeOptions {
    /// Set the exhaustive search limit
    pub fn with_exhaustive_limit(mut self, limit: usize) -> Self {
        self.exhaustive_limit = limit;
        self
    }

    /// Set the number of restarts
    pub fn with_n_restarts(mut self, n_restarts: usize) -> Self {
        self.n_restarts = n_restarts;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

struct Search<'a, F: Fn(f64) -> f64> {
    slices: Vec<Vec<Vec<f64>>>,
    right_dims: Vec<usize>,
    score: &'a F,
    best: Option<(f64, f64, MultiIndex)>,
}

impl<F: Fn(f64) -> f64> Search<'_, F> {
    fn offer(&mut self, value: f64, index: &[usize]) {
        let s = (self.score)(value);
        if self.best.as_ref().map_or(true, |(b, _, _)| s > *b) {
            self.best = Some((s, value, index.to_vec()));
        }
    }

    fn dfs(&mut self, env: &[f64], prefix: &mut MultiIndex) {
        let depth = prefix.len();
        if depth == self.slices.len() {
            let value = env.first().copied().unwrap_or(0.0);
            self.offer(value, prefix);
            return;
        }
        for s in 0..self.slices[depth].len() {
            let next = vec_mat(env, &self.slices[depth][s], self.right_dims[depth]);
            prefix.push(s);
            self.dfs(&next, prefix);
            prefix.pop();
        }
    }

    fn value_at(&self, index: &[usize]) -> f64 {
        let mut env = vec![1.0];
        for (site, &s) in index.iter().enumerate() {
            env = vec_mat(&env, &self.slices[site][s], self.right_dims[site]);
        }
        env.first().copied().unwrap_or(0.0)
    }

    fn ascend(&mut self, mut index: MultiIndex, max_passes: usize) {
        let mut current = (self.score)(self.value_at(&index));
        for _ in 0..max_passes {
            let mut improved = false;
            for site in 0..index.len() {
                let keep = index[site];
                let mut best_s = keep;
                for s in 0..self.slices[site].len() {
                    if s == keep {
                        continue;
                    }
                    index[site] = s;
                    let candidate = (self.score)(self.value_at(&index));
                    if candidate > current {
                        current = candidate;
                        best_s = s;
                        improved = true;
                    }
                }
                index[site] = best_s;
            }
            if !improved {
                break;
            }
        }
        let value = self.value_at(&index);
        self.offer(value, &index);
    }
}

/// Entry maximizing `score(value)`; returns the raw value and its index
fn optimize_by<F: Fn(f64) -> f64>(
    tt: &TensorTrain<f64>,
    score: &F,
    options: &OptimizeOptions,
) -> Result<(f64, MultiIndex)> {
    if tt.is_empty() {
        return Err(TensorTrainError::Empty);
    }
    let dims = tt.site_dims();
    if let Some(site) = dims.iter().position(|&d| d == 0) {
        return Err(TensorTrainError::InvalidOperation {
            message: format!("site {site} has dimension 0"),
        });
    }

    let mut search = Search {
        slices: tt
            .site_tensors()
            .iter()
            .map(|t| (0..t.site_dim()).map(|s| t.slice_site(s)).collect())
            .collect(),
        right_dims: tt.site_tensors().iter().map(|t| t.right_dim()).collect(),
        score,
        best: None,
    };

    if tt.numel() <= options.exhaustive_limit {
        search.dfs(&[1.0], &mut Vec::with_capacity(dims.len()));
    } else {
        tracing::debug!(
            numel = tt.numel(),
            restarts = options.n_restarts,
            "heuristic extremum search"
        );
        let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
        // all-zero corner first, then random corners
        search.ascend(vec![0; dims.len()], options.max_passes);
        for _ in 0..options.n_restarts {
            let start = dims.iter().map(|&d| rng.random_range(0..d)).collect();
            search.ascend(start, options.max_passes);
        }
    }

    search
        .best
        .map(|(_, value, index)| (value, index))
        .ok_or(TensorTrainError::Empty)
}

/// Largest entry and its multi-index
pub fn maximize(tt: &TensorTrain<f64>, options: &OptimizeOptions) -> Result<(f64, MultiIndex)> {
    optimize_by(tt, &|v| v, options)
}

/// Smallest entry and its multi-index
pub fn minimize(tt: &TensorTrain<f64>, options: &OptimizeOptions) -> Result<(f64, MultiIndex)> {
    optimize_by(tt, &|v| -v, options)
}

/// Entry of largest magnitude; the returned value keeps its sign
pub fn max_abs(tt: &TensorTrain<f64>, options: &OptimizeOptions) -> Result<(f64, MultiIndex)> {
    optimize_by(tt, &|v: f64| v.abs(), options)
}
