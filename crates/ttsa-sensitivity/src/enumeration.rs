//! Enumeration of variable subsets

use crate::error::{Result, SensitivityError};
use crate::sets::{set_choose, validate_subset};
use std::collections::HashSet;
use ttsa_tensortrain::{AbstractTensorTrain, TensorTrain};

/// Step `positions` (strictly increasing, below `n`) to the next
/// combination in lexicographic order; false once exhausted
fn advance(positions: &mut [usize], n: usize) -> bool {
    let k = positions.len();
    for i in (0..k).rev() {
        if positions[i] < n - k + i {
            positions[i] += 1;
            for j in i + 1..k {
                positions[j] = positions[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

/// All `k`-element combinations of `items`, keeping their order
pub fn combinations<T: Copy>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k > items.len() {
        return Vec::new();
    }
    let mut positions: Vec<usize> = (0..k).collect();
    let mut out = Vec::new();
    loop {
        out.push(positions.iter().map(|&p| items[p]).collect());
        if !advance(&mut positions, items.len()) {
            return out;
        }
    }
}

/// Lazy iterator over subsets of `0..n`, by ascending size and then
/// lexicographically
///
/// Created by [`power_set`]. Every subset is yielded sorted.
#[derive(Debug, Clone)]
pub struct PowerSet {
    candidates: Vec<usize>,
    include: Vec<usize>,
    order: usize,
    max_order: usize,
    positions: Option<Vec<usize>>,
}

impl PowerSet {
    fn current(&self) -> Vec<usize> {
        let mut subset = self.include.clone();
        if let Some(positions) = &self.positions {
            subset.extend(positions.iter().map(|&p| self.candidates[p]));
        }
        subset.sort_unstable();
        subset
    }
}

impl Iterator for PowerSet {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.order > self.max_order || self.order > self.candidates.len() {
                return None;
            }
            let stepped = match self.positions.as_mut() {
                None => {
                    self.positions = Some((0..self.order).collect());
                    true
                }
                Some(positions) => advance(positions, self.candidates.len()),
            };
            if stepped {
                return Some(self.current());
            }
            self.order += 1;
            self.positions = None;
        }
    }
}

impl std::iter::FusedIterator for PowerSet {}

/// Subsets `S` of `0..n` with `min_order <= |S| <= max_order` that contain
/// every member of `include` and none of `exclude`
///
/// `min_order > max_order` gives an empty iterator.
pub fn power_set(
    n: usize,
    min_order: usize,
    max_order: usize,
    include: &[usize],
    exclude: &[usize],
) -> Result<PowerSet> {
    validate_subset(include, n)?;
    validate_subset(exclude, n)?;
    let included: HashSet<usize> = include.iter().copied().collect();
    if let Some(&variable) = exclude.iter().find(|v| included.contains(v)) {
        return Err(SensitivityError::OverlappingSelection { variable });
    }

    let candidates = (0..n)
        .filter(|v| !included.contains(v) && !exclude.contains(v))
        .collect();
    let mut include = include.to_vec();
    include.sort_unstable();

    let (order, max_order) = if min_order > max_order || max_order < include.len() {
        (1, 0)
    } else {
        (min_order.saturating_sub(include.len()), max_order - include.len())
    };
    Ok(PowerSet {
        candidates,
        include,
        order,
        max_order,
        positions: None,
    })
}

/// `(subset, value)` pairs of a set tensor over the subsets selected as in
/// [`power_set`]
///
/// Values below `threshold` are dropped. With `top_k`, only the `k` largest
/// remain, in ascending order of value; otherwise the enumeration order is
/// kept.
pub fn order_query(
    t: &TensorTrain<f64>,
    min_order: usize,
    max_order: usize,
    include: &[usize],
    exclude: &[usize],
    top_k: Option<usize>,
    threshold: Option<f64>,
) -> Result<Vec<(Vec<usize>, f64)>> {
    let mut pairs = power_set(t.len(), min_order, max_order, include, exclude)?
        .map(|s| {
            let v = set_choose(t, &s)?;
            Ok((s, v))
        })
        .collect::<Result<Vec<_>>>()?;
    if let Some(threshold) = threshold {
        pairs.retain(|(_, v)| *v >= threshold);
    }
    if let Some(k) = top_k {
        if pairs.len() > k {
            pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
            pairs.drain(..pairs.len() - k);
        }
    }
    Ok(pairs)
}
