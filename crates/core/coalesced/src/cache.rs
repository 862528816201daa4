use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

struct CacheEntry<Value> {
    value: Value,
    cached_at: Instant,
}

/// Last known good value per key.
///
/// Entries are never evicted; they simply stop being served once older than
/// the configured TTL and get overwritten by the next successful flush.
pub(crate) struct TtlCache<Value> {
    ttl: Duration,
    entries: HashMap<String, CacheEntry<Value>>,
}

impl<Value> TtlCache<Value> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Fresh value for `key` as of `now`
    pub fn get(&self, key: &str, now: Instant) -> Option<&Value> {
        self.entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.cached_at) < self.ttl)
            .map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: String, value: Value, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: now,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
