//! This module provides a deterministic hasher and `HashMap` and `HashSet` variants that use
//! it. The hashing data structures in the standard library are not deterministic:
//!
//! > By default, HashMap uses a hashing algorithm selected to provide
//! > resistance against HashDoS attacks. The algorithm is randomly seeded, and a
//! > reasonable best-effort is made to generate this seed from a high quality,
//! > secure source of randomness provided by the host without blocking the program.
//!
//! Iteration order of a simulation's bookkeeping must not depend on the process, so every map
//! and set in this crate uses the `FxHasher` from `rustc-hash`. `HashMap<K, V, S>` does not have
//! a `new` method for a custom hasher; the `HashMapExt` / `HashSetExt` traits provide one and
//! need only be in scope.
//!
//! The `hash_str` free function is used by `crate::random` to derive a per-stream seed offset.

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
use xxhash_rust::xxh3::xxh3_64;

pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<FxHasher>>;
pub type HashSet<T> = std::collections::HashSet<T, BuildHasherDefault<FxHasher>>;

pub trait HashMapExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, BuildHasherDefault::default())
    }
}

pub trait HashSetExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<T> HashSetExt for HashSet<T> {
    fn new() -> Self {
        HashSet::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashSet::with_capacity_and_hasher(capacity, BuildHasherDefault::default())
    }
}

/// A convenience method to compute the hash of a `&str`. Stable across runs and platforms.
#[must_use]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_strings() {
        let a = hash_str("EpidemicRng");
        let b = hash_str("EpidemicRng");
        let c = hash_str("VaccinationRng");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn iteration_order_is_reproducible() {
        let mut first: HashSet<usize> = HashSet::new();
        let mut second: HashSet<usize> = HashSet::new();
        for value in [17, 3, 99, 42, 5, 8311] {
            first.insert(value);
            second.insert(value);
        }
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            second.iter().collect::<Vec<_>>()
        );
    }
}
