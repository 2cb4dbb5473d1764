//! The join-semilattice capability shared by every state type.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::merge_utils::{merge_maps_into, merge_sets_into};

/// A state with an associative, commutative, idempotent merge.
///
/// Composite types (maps of registers, maps of counters) merge their
/// components through this trait, so the laws only need to be checked once
/// per value type.
pub trait Lattice: Clone {
    /// Merges `other` into `self`, leaving the least upper bound of both.
    fn merge(&mut self, other: &Self);

    /// Returns the merge of `self` and `other` without modifying either.
    #[must_use]
    fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }
}

impl Lattice for u64 {
    fn merge(&mut self, other: &Self) {
        *self = (*self).max(*other);
    }
}

impl<T> Lattice for HashSet<T>
where
    T: Eq + Hash + Clone,
{
    fn merge(&mut self, other: &Self) {
        merge_sets_into(self, other);
    }
}

impl<T> Lattice for BTreeSet<T>
where
    T: Ord + Clone,
{
    fn merge(&mut self, other: &Self) {
        self.extend(other.iter().cloned());
    }
}

impl<K, V> Lattice for HashMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Lattice,
{
    fn merge(&mut self, other: &Self) {
        merge_maps_into(self, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_merge_takes_max() {
        assert_eq!(3u64.merged(&7), 7);
        assert_eq!(7u64.merged(&3), 7);
        assert_eq!(5u64.merged(&5), 5);
    }

    #[test]
    fn btree_set_merge_is_union() {
        let a: BTreeSet<u8> = [1, 2].into_iter().collect();
        let b: BTreeSet<u8> = [2, 3].into_iter().collect();
        assert_eq!(a.merged(&b), [1, 2, 3].into_iter().collect());
    }

    #[test]
    fn nested_map_merge_is_pointwise() {
        let mut a: HashMap<&str, u64> = HashMap::new();
        a.insert("x", 4);
        a.insert("y", 1);
        let mut b: HashMap<&str, u64> = HashMap::new();
        b.insert("y", 9);
        b.insert("z", 2);

        let merged = a.merged(&b);
        assert_eq!(merged.get("x"), Some(&4));
        assert_eq!(merged.get("y"), Some(&9));
        assert_eq!(merged.get("z"), Some(&2));
        assert_eq!(merged, b.merged(&a));
    }
}
