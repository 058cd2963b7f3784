//! Key/value storage with per-entry expiry.
//!
//! Components that need short-lived state take an `ExpiringStore` at
//! construction time, so the in-process map can be replaced by a shared cache
//! without touching callers.

use std::time::{Duration, Instant};

use dashmap::DashMap;

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

pub trait ExpiringStore<V>: Send + Sync {
    fn put(&self, key: String, value: V, ttl: Duration);

    /// Expired entries are never returned.
    fn get(&self, key: &str) -> Option<V>;

    fn remove(&self, key: &str) -> Option<V>;

    /// Drop every expired entry, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Sharded in-process store. Holds at most `max_entries` keys: a full store
/// first drops expired entries, then the entry closest to expiry.
pub struct InMemoryExpiringStore<V> {
    entries: DashMap<String, Entry<V>>,
    max_entries: usize,
}

impl<V> Default for InMemoryExpiringStore<V> {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl<V> InMemoryExpiringStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    fn make_room(&self, now: Instant) {
        if self.entries.len() < self.max_entries {
            return;
        }
        self.purge(now);

        while self.entries.len() >= self.max_entries {
            let soonest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().expires_at)
                .map(|entry| entry.key().clone());
            match soonest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl<V: Clone + Send + Sync> ExpiringStore<V> for InMemoryExpiringStore<V> {
    fn put(&self, key: String, value: V, ttl: Duration) {
        let now = Instant::now();
        if !self.entries.contains_key(&key) {
            self.make_room(now);
        }
        let expires_at = now + ttl;
        self.entries.insert(key, Entry { value, expires_at });
    }

    fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
        }

        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    fn purge_expired(&self) -> usize {
        self.purge(Instant::now())
    }
}
