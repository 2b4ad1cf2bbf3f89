//! Array-backed LRU
//!
//! Live entries sit in a fixed slot array, most recent first. Promotion and
//! insertion shift the prefix right by one slot, removal shifts the suffix
//! left. Every operation is a linear scan, which is cheap for the small
//! capacities a per-pool statement cache usually has, and nothing is
//! allocated at steady state.

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::StatementCache;
use crate::error::{check_entry_capacity, Error, Result};
use crate::key::{Entry, StatementKey};
use crate::stats::CacheStats;

/// Fixed slot array; `slots[..count]` are live, the rest are `None`
struct Slots<V> {
    slots: Box<[Option<Entry<V>>]>,
    count: usize,
}

impl<V> Slots<V> {
    fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            slots: empty_slots(capacity)?,
            count: 0,
        })
    }

    fn position(&self, address: &str, statement: &str) -> Option<usize> {
        self.slots[..self.count].iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|entry| entry.key().matches(address, statement))
        })
    }

    /// Rotate `[0, pos]` so the entry at `pos` lands in slot 0
    fn promote(&mut self, pos: usize) {
        if pos > 0 {
            self.slots[..=pos].rotate_right(1);
        }
    }

    fn live(&self) -> impl Iterator<Item = &Entry<V>> {
        self.slots[..self.count].iter().flatten()
    }
}

fn empty_slots<V>(capacity: usize) -> Result<Box<[Option<Entry<V>>]>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| Error::CapacityTooLarge(capacity))?;
    slots.resize_with(capacity, || None);
    Ok(slots.into_boxed_slice())
}

/// LRU cache over a fixed-size slot array with shift-based reordering
pub struct ArrayLru<V> {
    inner: Mutex<Slots<V>>,
    stats: CacheStats,
}

impl<V> ArrayLru<V> {
    /// Create an empty cache holding at most `capacity` statements
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = check_entry_capacity::<V>(capacity)?;

        Ok(Self {
            inner: Mutex::new(Slots::with_capacity(capacity)?),
            stats: CacheStats::new(),
        })
    }
}

impl<V: Clone> StatementCache<V> for ArrayLru<V> {
    fn get(&self, address: &str, statement: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        match inner.position(address, statement) {
            Some(pos) => {
                inner.promote(pos);
                self.stats.record_hit();
                inner.slots[0].as_ref().map(|entry| entry.value().clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn set(&self, address: &str, statement: &str, value: V) -> Option<Entry<V>> {
        let mut inner = self.inner.lock();

        if let Some(pos) = inner.position(address, statement) {
            if let Some(entry) = inner.slots[pos].as_mut() {
                let previous = entry.replace_value(value);
                let key = entry.key().clone();
                inner.promote(pos);
                self.stats.record_update();
                return Some(Entry::new(key, previous));
            }
        }

        let mut evicted = None;
        if inner.count == inner.slots.len() {
            let last = inner.count - 1;
            evicted = inner.slots[last].take();
            inner.count = last;
        }

        // slots[count] is empty; rotating it to the front opens slot 0
        let count = inner.count;
        inner.slots[..=count].rotate_right(1);
        inner.slots[0] = Some(Entry::new(StatementKey::new(address, statement), value));
        inner.count += 1;
        self.stats.record_insert();

        if let Some(entry) = &evicted {
            trace!(key = %entry.key(), "evicted least recently used statement");
            self.stats.record_evictions(1);
        }
        evicted
    }

    fn delete(&self, address: &str, statement: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        let pos = inner.position(address, statement)?;
        let removed = inner.slots[pos].take();
        let count = inner.count;
        inner.slots[pos..count].rotate_left(1);
        inner.count -= 1;

        self.stats.record_delete();
        removed.map(Entry::into_value)
    }

    fn resize(&self, capacity: usize) -> Result<Vec<Entry<V>>> {
        let capacity = check_entry_capacity::<V>(capacity)?;
        let mut inner = self.inner.lock();

        if capacity == inner.slots.len() {
            return Ok(Vec::new());
        }

        let slots = empty_slots(capacity)?;
        let keep = inner.count.min(capacity);
        let old = std::mem::replace(&mut inner.slots, slots);
        let mut discarded = Vec::with_capacity(inner.count - keep);

        for (pos, slot) in old.into_vec().into_iter().take(inner.count).enumerate() {
            if pos < keep {
                inner.slots[pos] = slot;
            } else if let Some(entry) = slot {
                discarded.push(entry);
            }
        }
        inner.count = keep;

        self.stats.record_evictions(discarded.len());
        debug!(capacity, discarded = discarded.len(), "resized array cache");
        Ok(discarded)
    }

    fn contains(&self, address: &str, statement: &str) -> bool {
        self.inner.lock().position(address, statement).is_some()
    }

    fn len(&self) -> usize {
        self.inner.lock().count
    }

    fn capacity(&self) -> usize {
        self.inner.lock().slots.len()
    }

    fn keys(&self) -> Vec<StatementKey> {
        self.inner.lock().live().map(|entry| entry.key().clone()).collect()
    }

    fn clear(&self) -> Vec<Entry<V>> {
        let mut inner = self.inner.lock();
        let count = inner.count;
        let cleared: Vec<_> = inner.slots[..count]
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        inner.count = 0;

        debug!(cleared = cleared.len(), "cleared array cache");
        cleared
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
