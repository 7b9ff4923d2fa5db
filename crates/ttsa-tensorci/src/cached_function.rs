//! Memoizing wrapper around a batched function of multi-indices

use crate::error::{Result, TCIError};
use crate::indexset::MultiIndex;
use std::collections::{HashMap, HashSet};

/// Caches the values of an expensive batched function
///
/// Every call to [`CachedFunction::eval_batch`] forwards only the indices
/// that have never been seen, deduplicated, in a single batch. A point is
/// therefore evaluated at most once.
pub struct CachedFunction<T, F>
where
    T: Copy,
    F: Fn(&[MultiIndex]) -> Vec<T>,
{
    func: F,
    cache: HashMap<MultiIndex, T>,
    num_evals: usize,
    num_cache_hits: usize,
}

impl<T, F> CachedFunction<T, F>
where
    T: Copy,
    F: Fn(&[MultiIndex]) -> Vec<T>,
{
    /// Create a new cached function wrapper
    pub fn new(func: F) -> Self {
        Self {
            func,
            cache: HashMap::new(),
            num_evals: 0,
            num_cache_hits: 0,
        }
    }

    /// Values at `keys`, calling the wrapped function once for the misses
    pub fn eval_batch(&mut self, keys: &[MultiIndex]) -> Result<Vec<T>> {
        let mut misses: Vec<MultiIndex> = Vec::new();
        let mut pending: HashSet<&MultiIndex> = HashSet::new();
        for key in keys {
            if self.cache.contains_key(key) {
                self.num_cache_hits += 1;
            } else if pending.insert(key) {
                misses.push(key.clone());
            }
        }

        if !misses.is_empty() {
            let values = (self.func)(&misses);
            if values.len() != misses.len() {
                return Err(TCIError::BatchLengthMismatch {
                    expected: misses.len(),
                    got: values.len(),
                });
            }
            self.num_evals += misses.len();
            for (key, value) in misses.into_iter().zip(values) {
                self.cache.insert(key, value);
            }
        }

        keys.iter()
            .map(|k| {
                self.cache.get(k).copied().ok_or_else(|| TCIError::InvalidPivot {
                    message: format!("no value cached for {k:?}"),
                })
            })
            .collect()
    }

    /// Value at a single key
    pub fn eval(&mut self, key: &MultiIndex) -> Result<T> {
        let values = self.eval_batch(std::slice::from_ref(key))?;
        values.into_iter().next().ok_or(TCIError::Empty)
    }

    /// Number of distinct points passed to the wrapped function
    pub fn num_evals(&self) -> usize {
        self.num_evals
    }

    /// Number of lookups answered from the cache
    pub fn num_cache_hits(&self) -> usize {
        self.num_cache_hits
    }

    /// Number of cached entries
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
