//! The cache contract and strategy dispatch

use crate::array::ArrayLru;
use crate::config::{CacheConfig, Strategy};
use crate::error::Result;
use crate::key::{Entry, StatementKey};
use crate::list::ListLru;
use crate::stats::CacheStats;

/// Bounded LRU cache of statement values keyed by `(address, statement)`.
///
/// Every method takes the instance lock for its whole duration, so calls on
/// one cache are linearizable. Values are opaque: `get` hands out clones,
/// and anything the cache gives up (replaced, evicted, deleted, discarded
/// by a shrink) is returned by value so the caller can release it.
pub trait StatementCache<V> {
    /// Look up a statement and make it the most recently used
    fn get(&self, address: &str, statement: &str) -> Option<V>;

    /// Insert or replace a statement, leaving it most recently used.
    ///
    /// Returns the entry that left the cache: the previous binding for the
    /// same key on update, or the least recently used entry if an insert
    /// found the cache full.
    fn set(&self, address: &str, statement: &str, value: V) -> Option<Entry<V>>;

    /// Remove a statement, returning its value if it was cached
    fn delete(&self, address: &str, statement: &str) -> Option<V>;

    /// Change the capacity.
    ///
    /// Shrinking below the current length discards the least recently used
    /// entries, returned most recent first. A zero capacity is rejected and
    /// leaves the cache untouched.
    fn resize(&self, capacity: usize) -> Result<Vec<Entry<V>>>;

    /// Membership test that does not affect recency
    fn contains(&self, address: &str, statement: &str) -> bool;

    /// Number of cached statements
    fn len(&self) -> usize;

    /// Check if the cache is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached statements
    fn capacity(&self) -> usize;

    /// Keys from most to least recently used
    fn keys(&self) -> Vec<StatementKey>;

    /// Remove everything, most recent first
    fn clear(&self) -> Vec<Entry<V>>;

    /// Hit/miss/eviction counters
    fn stats(&self) -> &CacheStats;
}

/// A statement cache whose strategy is picked at construction time
pub enum PreparedCache<V> {
    /// Slot array with shift-based reordering
    Array(ArrayLru<V>),
    /// Indexed doubly-linked list
    List(ListLru<V>),
}

impl<V> PreparedCache<V> {
    /// Create an empty cache using the given strategy
    pub fn new(strategy: Strategy, capacity: usize) -> Result<Self> {
        Ok(match strategy {
            Strategy::Array => PreparedCache::Array(ArrayLru::new(capacity)?),
            Strategy::List => PreparedCache::List(ListLru::new(capacity)?),
        })
    }

    /// Create a cache from a validated config
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.strategy, config.capacity)
    }

    /// Strategy backing this cache
    pub fn strategy(&self) -> Strategy {
        match self {
            PreparedCache::Array(_) => Strategy::Array,
            PreparedCache::List(_) => Strategy::List,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $cache:ident => $call:expr) => {
        match $self {
            PreparedCache::Array($cache) => $call,
            PreparedCache::List($cache) => $call,
        }
    };
}

impl<V: Clone> StatementCache<V> for PreparedCache<V> {
    fn get(&self, address: &str, statement: &str) -> Option<V> {
        dispatch!(self, cache => cache.get(address, statement))
    }

    fn set(&self, address: &str, statement: &str, value: V) -> Option<Entry<V>> {
        dispatch!(self, cache => cache.set(address, statement, value))
    }

    fn delete(&self, address: &str, statement: &str) -> Option<V> {
        dispatch!(self, cache => cache.delete(address, statement))
    }

    fn resize(&self, capacity: usize) -> Result<Vec<Entry<V>>> {
        dispatch!(self, cache => cache.resize(capacity))
    }

    fn contains(&self, address: &str, statement: &str) -> bool {
        dispatch!(self, cache => cache.contains(address, statement))
    }

    fn len(&self) -> usize {
        dispatch!(self, cache => cache.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, cache => cache.capacity())
    }

    fn keys(&self) -> Vec<StatementKey> {
        dispatch!(self, cache => cache.keys())
    }

    fn clear(&self) -> Vec<Entry<V>> {
        dispatch!(self, cache => cache.clear())
    }

    fn stats(&self) -> &CacheStats {
        dispatch!(self, cache => cache.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;
    use std::thread;

    use proptest::prelude::{any, prop, prop_assert, prop_assert_eq, prop_oneof, proptest};
    use proptest::strategy::Strategy as PropStrategy;

    const STRATEGIES: [Strategy; 2] = [Strategy::Array, Strategy::List];

    fn caches(capacity: usize) -> Vec<PreparedCache<&'static str>> {
        STRATEGIES
            .iter()
            .map(|&strategy| PreparedCache::new(strategy, capacity).unwrap())
            .collect()
    }

    #[test]
    fn test_cache_scenario() {
        for cache in caches(2) {
            cache.set("A", "1", "x");
            cache.set("A", "2", "y");
            assert_eq!(cache.get("A", "1"), Some("x"));

            // "2" is now least recent
            let evicted = cache.set("A", "3", "z").unwrap();
            assert_eq!(evicted.key(), &StatementKey::new("A", "2"));

            assert_eq!(cache.get("A", "2"), None, "{:?}", cache.strategy());
            assert_eq!(cache.get("A", "1"), Some("x"));
            assert_eq!(cache.get("A", "3"), Some("z"));
        }
    }

    #[test]
    fn test_cache_eviction_order() {
        for cache in caches(3) {
            for stmt in ["1", "2", "3", "4"] {
                cache.set("db", stmt, stmt);
            }

            assert!(!cache.contains("db", "1"));
            for stmt in ["2", "3", "4"] {
                assert!(cache.contains("db", stmt));
            }
            assert_eq!(cache.stats().evictions(), 1);
        }
    }

    #[test]
    fn test_cache_update_in_place() {
        for cache in caches(3) {
            cache.set("A", "1", "x");
            cache.set("A", "2", "y");

            let previous = cache.set("A", "1", "x2").unwrap();
            assert_eq!(previous.into_value(), "x");
            assert_eq!(cache.len(), 2);
            assert_eq!(cache.get("A", "1"), Some("x2"));
            assert_eq!(cache.keys()[0], StatementKey::new("A", "1"));
        }
    }

    #[test]
    fn test_cache_delete() {
        for cache in caches(3) {
            cache.set("A", "1", "x");
            cache.set("A", "2", "y");

            assert_eq!(cache.delete("A", "1"), Some("x"));
            assert_eq!(cache.len(), 1);
            assert_eq!(cache.get("A", "1"), None);

            assert_eq!(cache.delete("A", "1"), None);
            assert_eq!(cache.len(), 1);
        }
    }

    #[test]
    fn test_cache_resize_shrink() {
        for cache in caches(5) {
            for i in 0..5 {
                cache.set("A", &i.to_string(), "v");
            }
            cache.get("A", "0");

            let discarded = cache.resize(2).unwrap();
            assert_eq!(discarded.len(), 3);
            assert_eq!(
                cache.keys(),
                [StatementKey::new("A", "0"), StatementKey::new("A", "4")]
            );
        }
    }

    #[test]
    fn test_cache_unallocatable_capacity_leaves_cache_intact() {
        for strategy in STRATEGIES {
            assert!(matches!(
                PreparedCache::<u8>::new(strategy, usize::MAX),
                Err(Error::CapacityTooLarge(_))
            ));
        }

        for cache in caches(2) {
            cache.set("A", "1", "x");

            assert_eq!(
                cache.resize(usize::MAX).err(),
                Some(Error::CapacityTooLarge(usize::MAX))
            );
            assert_eq!(cache.capacity(), 2);
            assert_eq!(cache.get("A", "1"), Some("x"));
        }
    }

    #[test]
    fn test_cache_pair_key_no_collision() {
        for cache in caches(4) {
            cache.set("ab", "c", "first");
            cache.set("a", "bc", "second");

            assert_eq!(cache.len(), 2);
            assert_eq!(cache.get("ab", "c"), Some("first"));
            assert_eq!(cache.get("a", "bc"), Some("second"));
        }
    }

    #[test]
    fn test_cache_from_config() {
        let config = CacheConfig::new(7).with_strategy(Strategy::List);
        let cache: PreparedCache<u8> = PreparedCache::from_config(&config).unwrap();

        assert_eq!(cache.strategy(), Strategy::List);
        assert_eq!(cache.capacity(), 7);
        assert!(PreparedCache::<u8>::from_config(&CacheConfig::new(0)).is_err());
    }

    #[test]
    fn test_cache_concurrent_access() {
        for strategy in STRATEGIES {
            let cache = Arc::new(PreparedCache::new(strategy, 16).unwrap());

            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        for i in 0..500u32 {
                            let stmt = format!("q{}", i % 24);
                            match i % 5 {
                                0 => {
                                    cache.delete("A", &stmt);
                                }
                                1 if t == 0 && i % 50 == 1 => {
                                    cache.resize(8 + (i as usize % 16)).unwrap();
                                }
                                2 | 3 => {
                                    cache.get("A", &stmt);
                                }
                                _ => {
                                    cache.set("A", &stmt, i);
                                }
                            }
                            assert!(cache.len() <= 24);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            let keys = cache.keys();
            let mut unique = keys.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), keys.len());
            assert!(keys.len() <= cache.capacity());
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Get(u8),
        Set(u8, u16),
        Delete(u8),
        Resize(usize),
    }

    fn op() -> impl PropStrategy<Value = Op> {
        prop_oneof![
            4 => (0u8..12).prop_map(Op::Get),
            4 => (0u8..12, any::<u16>()).prop_map(|(k, v)| Op::Set(k, v)),
            1 => (0u8..12).prop_map(Op::Delete),
            1 => (0usize..10).prop_map(Op::Resize),
        ]
    }

    proptest! {
        #[test]
        fn prop_strategies_agree(capacity in 1usize..8, ops in prop::collection::vec(op(), 0..200)) {
            let array = ArrayLru::new(capacity).unwrap();
            let list = ListLru::new(capacity).unwrap();

            for op in ops {
                match op {
                    Op::Get(k) => {
                        let stmt = k.to_string();
                        prop_assert_eq!(array.get("A", &stmt), list.get("A", &stmt));
                    }
                    Op::Set(k, v) => {
                        let stmt = k.to_string();
                        prop_assert_eq!(array.set("A", &stmt, v), list.set("A", &stmt, v));
                        let keys = array.keys();
                        prop_assert_eq!(keys[0].statement(), stmt.as_str());
                    }
                    Op::Delete(k) => {
                        let stmt = k.to_string();
                        prop_assert_eq!(array.delete("A", &stmt), list.delete("A", &stmt));
                        prop_assert!(!array.contains("A", &stmt));
                    }
                    Op::Resize(n) => {
                        prop_assert_eq!(array.resize(n), list.resize(n));
                    }
                }

                prop_assert!(array.len() <= array.capacity());
                prop_assert_eq!(array.keys(), list.keys());
                prop_assert_eq!(array.capacity(), list.capacity());
            }
        }
    }
}
