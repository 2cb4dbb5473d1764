//! Generic merge combinators.
//!
//! Maps merge key by key through the value type's [`Lattice`] impl; keys
//! present on only one side pass through unchanged. Sets merge by union.
//! A composite built from these inherits commutativity, associativity and
//! idempotence from its value type.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::Lattice;

/// Merges `incoming` into `target` key by key.
pub fn merge_maps_into<K, V>(target: &mut HashMap<K, V>, incoming: &HashMap<K, V>)
where
    K: Eq + Hash + Clone,
    V: Lattice,
{
    for (key, value) in incoming {
        match target.get_mut(key) {
            Some(existing) => existing.merge(value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Returns the key-by-key merge of two maps.
#[must_use]
pub fn merge_maps<K, V>(a: &HashMap<K, V>, b: &HashMap<K, V>) -> HashMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Lattice,
{
    let mut result = a.clone();
    merge_maps_into(&mut result, b);
    result
}

/// Adds every element of `incoming` to `target`.
pub fn merge_sets_into<T>(target: &mut HashSet<T>, incoming: &HashSet<T>)
where
    T: Eq + Hash + Clone,
{
    target.extend(incoming.iter().cloned());
}

/// Returns the union of two sets.
#[must_use]
pub fn merge_sets<T>(a: &HashSet<T>, b: &HashSet<T>) -> HashSet<T>
where
    T: Eq + Hash + Clone,
{
    a.union(b).cloned().collect()
}
