//! Type aliases for `HashMap`/`HashSet` backed by `ahash`, the hasher used
//! throughout the decompiler for anything keyed by module id, tag name, or
//! identifier atom.

#[cfg(feature = "ahash")]
pub type RandomState = ahash::RandomState;
#[cfg(not(feature = "ahash"))]
pub type RandomState = std::collections::hash_map::RandomState;

pub type AHashMap<K, V> = std::collections::HashMap<K, V, RandomState>;
pub type AHashSet<K> = std::collections::HashSet<K, RandomState>;

pub mod hash_map {
    pub use std::collections::hash_map::Entry;
}

pub mod hash_set {
    pub use std::collections::hash_set::Iter;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_default_is_usable() {
        let mut m: AHashMap<&str, u32> = AHashMap::default();
        m.insert("a", 1);
        assert_eq!(m.get("a"), Some(&1));
    }

    #[test]
    fn set_default_is_usable() {
        let mut s: AHashSet<u32> = AHashSet::default();
        s.insert(1);
        assert!(s.contains(&1));
    }
}
