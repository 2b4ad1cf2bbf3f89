//! Linked-list LRU
//!
//! Nodes live in an index-addressed arena and are threaded into a
//! doubly-linked list, head = most recent. An AHash index maps each
//! statement to its node, so lookup is O(1) on average and promotion is a
//! constant-time relink.

use std::collections::HashMap;

use ahash::RandomState;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::StatementCache;
use crate::error::{check_entry_capacity, Result};
use crate::key::{Entry, KeyParts, StatementKey};
use crate::stats::CacheStats;

/// Node in the LRU doubly-linked list
struct Node<V> {
    entry: Entry<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// List state guarded by the cache mutex
struct List<V> {
    index: HashMap<StatementKey, usize, RandomState>,
    nodes: Vec<Option<Node<V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<V> List<V> {
    fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::with_hasher(RandomState::new()),
            nodes: Vec::new(),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn find(&self, address: &str, statement: &str) -> Option<usize> {
        self.index.get(&(address, statement) as &dyn KeyParts).copied()
    }

    fn entry(&self, idx: usize) -> Option<&Entry<V>> {
        self.nodes[idx].as_ref().map(|node| &node.entry)
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);
        self.link_front(idx);
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = old_head;
        }

        if let Some(head_idx) = old_head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    /// Unlink a node, free its slot and drop it from the index
    fn detach(&mut self, idx: usize) -> Option<Entry<V>> {
        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.free_list.push(idx);
        self.index.remove(node.entry.key());
        Some(node.entry)
    }

    fn pop_back(&mut self) -> Option<Entry<V>> {
        let tail = self.tail?;
        self.detach(tail)
    }

    fn push_front(&mut self, entry: Entry<V>) {
        let idx = match self.free_list.pop() {
            Some(idx) => idx,
            None => {
                self.nodes.push(None);
                self.nodes.len() - 1
            }
        };

        self.index.insert(entry.key().clone(), idx);
        self.nodes[idx] = Some(Node {
            entry,
            prev: None,
            next: None,
        });
        self.link_front(idx);
    }

    fn iter(&self) -> ListIter<'_, V> {
        ListIter {
            list: self,
            cursor: self.head,
        }
    }

    fn drain(&mut self) -> Vec<Entry<V>> {
        let mut drained = Vec::with_capacity(self.len());
        let mut cursor = self.head;

        while let Some(idx) = cursor {
            let Some(node) = self.nodes[idx].take() else {
                break;
            };
            cursor = node.next;
            drained.push(node.entry);
        }

        self.index.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        drained
    }
}

/// Front-to-back walk over the list
struct ListIter<'a, V> {
    list: &'a List<V>,
    cursor: Option<usize>,
}

impl<'a, V> Iterator for ListIter<'a, V> {
    type Item = &'a Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.nodes[self.cursor?].as_ref()?;
        self.cursor = node.next;
        Some(&node.entry)
    }
}

/// LRU cache over a doubly-linked list with a hash index
pub struct ListLru<V> {
    inner: Mutex<List<V>>,
    stats: CacheStats,
}

impl<V> ListLru<V> {
    /// Create an empty cache holding at most `capacity` statements
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = check_entry_capacity::<V>(capacity)?;

        Ok(Self {
            inner: Mutex::new(List::new(capacity)),
            stats: CacheStats::new(),
        })
    }
}

impl<V: Clone> StatementCache<V> for ListLru<V> {
    fn get(&self, address: &str, statement: &str) -> Option<V> {
        let mut list = self.inner.lock();

        match list.find(address, statement) {
            Some(idx) => {
                list.move_to_front(idx);
                self.stats.record_hit();
                list.entry(idx).map(|entry| entry.value().clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn set(&self, address: &str, statement: &str, value: V) -> Option<Entry<V>> {
        let mut list = self.inner.lock();

        if let Some(idx) = list.find(address, statement) {
            if let Some(node) = &mut list.nodes[idx] {
                let previous = node.entry.replace_value(value);
                let key = node.entry.key().clone();
                list.move_to_front(idx);
                self.stats.record_update();
                return Some(Entry::new(key, previous));
            }
        }

        let evicted = if list.len() >= list.capacity {
            list.pop_back()
        } else {
            None
        };

        list.push_front(Entry::new(StatementKey::new(address, statement), value));
        self.stats.record_insert();

        if let Some(entry) = &evicted {
            trace!(key = %entry.key(), "evicted least recently used statement");
            self.stats.record_evictions(1);
        }
        evicted
    }

    fn delete(&self, address: &str, statement: &str) -> Option<V> {
        let mut list = self.inner.lock();

        let idx = list.find(address, statement)?;
        let removed = list.detach(idx)?;
        self.stats.record_delete();
        Some(removed.into_value())
    }

    fn resize(&self, capacity: usize) -> Result<Vec<Entry<V>>> {
        let capacity = check_entry_capacity::<V>(capacity)?;
        let mut list = self.inner.lock();

        list.capacity = capacity;

        // Popped back to front; reverse to report most recent first
        let mut discarded = Vec::new();
        while list.len() > capacity {
            match list.pop_back() {
                Some(entry) => discarded.push(entry),
                None => break,
            }
        }
        discarded.reverse();

        if list.free_list.len() > capacity {
            compact(&mut list);
        }

        self.stats.record_evictions(discarded.len());
        debug!(capacity, discarded = discarded.len(), "resized list cache");
        Ok(discarded)
    }

    fn contains(&self, address: &str, statement: &str) -> bool {
        self.inner.lock().find(address, statement).is_some()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    fn keys(&self) -> Vec<StatementKey> {
        self.inner
            .lock()
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn clear(&self) -> Vec<Entry<V>> {
        let cleared = self.inner.lock().drain();
        debug!(cleared = cleared.len(), "cleared list cache");
        cleared
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Rebuild the arena densely after a large shrink, keeping order
fn compact<V>(list: &mut List<V>) {
    for entry in list.drain().into_iter().rev() {
        list.push_front(entry);
    }
    list.nodes.shrink_to_fit();
}
