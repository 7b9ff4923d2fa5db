//! Pivot sets of the cross interpolation

use std::collections::HashSet;
use std::hash::Hash;

pub use ttsa_tensortrain::{LocalIndex, MultiIndex};

/// Insertion-ordered set of pivots
///
/// Holds the prefix sets `I` and suffix sets `J`. The order of the values
/// is the order of the rows or columns of the blocks built from them, so it
/// must survive deduplication.
#[derive(Debug, Clone)]
pub struct IndexSet<T: Clone + Eq + Hash> {
    seen: HashSet<T>,
    ordered: Vec<T>,
}

impl<T: Clone + Eq + Hash> Default for IndexSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> IndexSet<T> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    /// Keeps the first occurrence of every value
    pub fn from_vec(values: Vec<T>) -> Self {
        let mut set = Self::new();
        values.into_iter().for_each(|v| {
            set.insert(v);
        });
        set
    }

    /// Append `value` unless present; returns whether it was added
    pub fn insert(&mut self, value: T) -> bool {
        if !self.seen.insert(value.clone()) {
            return false;
        }
        self.ordered.push(value);
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Values in insertion order
    pub fn values(&self) -> &[T] {
        &self.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_refuses_duplicates() {
        let mut set: IndexSet<MultiIndex> = IndexSet::new();
        assert!(set.is_empty());
        assert!(set.insert(vec![1, 2, 3]));
        assert!(set.insert(vec![]));
        assert!(!set.insert(vec![1, 2, 3]));

        assert_eq!(set.len(), 2);
        assert_eq!(set.values(), &[vec![1, 2, 3], vec![]]);
        assert!(set.contains(&vec![]));
        assert!(!set.contains(&vec![7]));
    }

    #[test]
    fn test_from_vec_keeps_first_occurrence_order() {
        let set = IndexSet::from_vec(vec![vec![2], vec![1], vec![2], vec![3]]);
        assert_eq!(set.values(), &[vec![2], vec![1], vec![3]]);
    }
}
