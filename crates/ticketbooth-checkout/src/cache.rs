//! # TTL Cache
//!
//! Bounded, time-limited key/value cache. Constructed explicitly and handed to
//! whatever needs it; there is no process-wide instance.
//!
//! ## Eviction
//! ```text
//! insert(k, v) when full:
//!   1. drop every expired entry
//!   2. still full? drop the entry inserted longest ago
//! ```
//!
//! Time comes from `tokio::time::Instant`, so tests can pause and advance the
//! clock.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    /// Monotonic insertion order, used to find the oldest entry.
    seq: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    next_seq: u64,
}

/// Thread-safe cache with a per-entry time to live and a fixed capacity.
pub struct TtlCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache holding at most `capacity` entries (minimum 1), each
    /// valid for `ttl` after insertion.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        TtlCache {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a clone of the live value for `key`. Expired entries are
    /// removed on the way.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(key);
        }
        None
    }

    /// Inserts or replaces `key`, restarting its TTL.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let dropped = Self::drop_expired(&mut inner, self.ttl);
            if dropped > 0 {
                debug!(dropped, "Evicted expired cache entries");
            }
            if inner.entries.len() >= self.capacity {
                let oldest = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.seq)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    inner.entries.remove(&oldest);
                    debug!(capacity = self.capacity, "Evicted oldest cache entry");
                }
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
                seq,
            },
        );
    }

    /// Removes `key`, returning its value if it was still live.
    pub fn remove(&self, key: &K) -> Option<V> {
        let entry = self.inner.lock().entries.remove(key)?;
        (entry.inserted_at.elapsed() < self.ttl).then_some(entry.value)
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        Self::drop_expired(&mut inner, self.ttl)
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    fn drop_expired(inner: &mut Inner<K, V>, ttl: Duration) -> usize {
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
        before - inner.entries.len()
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.inner.lock().entries.len())
            .finish()
    }
}
