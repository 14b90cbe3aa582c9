//! Cache store: key/value table with TTL, metadata, and bounded capacity.

use super::entry::CacheEntry;
use super::eviction::{EvictionIndex, EvictionPolicy};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Configuration for a [`CacheStore`] instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of live entries.
    pub max_size: usize,
    /// TTL applied when a `set` does not specify one.
    pub default_ttl: Duration,
    pub eviction: EvictionPolicy,
    /// Fraction of entries removed per overflow, clamped to at least one.
    pub evict_fraction: f64,
    /// Values whose serialized size exceeds this bound are not cached.
    pub max_entry_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl: Duration::from_secs(300),
            eviction: EvictionPolicy::Lru,
            evict_fraction: 0.10,
            max_entry_size: 10 * 1024 * 1024,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.max(1);
        self
    }
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
    pub fn with_eviction(mut self, policy: EvictionPolicy) -> Self {
        self.eviction = policy;
        self
    }
    pub fn with_evict_fraction(mut self, fraction: f64) -> Self {
        self.evict_fraction = fraction.clamp(0.0, 1.0);
        self
    }
    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }
}

/// Per-call options for [`CacheStore::set`].
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Overrides the store's default TTL.
    pub ttl: Option<Duration>,
    pub tags: HashSet<String>,
    pub priority: i32,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Point-in-time view of store counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub total_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-memory cache with per-entry TTL, tag metadata, and policy-driven
/// eviction.
///
/// All operations are synchronous and non-blocking; share a store across
/// tasks through [`CacheHandle`].
#[derive(Debug)]
pub struct CacheStore {
    pub(crate) entries: HashMap<String, CacheEntry>,
    index: EvictionIndex,
    config: CacheConfig,
    pub(crate) total_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
    seq: u64,
    tick: u64,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            index: EvictionIndex::new(),
            config,
            total_bytes: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
            seq: 0,
            tick: 0,
        }
    }

    /// Insert or overwrite an entry. Triggers synchronous eviction when the
    /// store exceeds its capacity, so no caller ever observes a size above
    /// `max_size` after this returns.
    pub fn set(&mut self, key: impl Into<String>, value: Value, opts: SetOptions) {
        let key = key.into();
        let size_bytes = estimate_size(&value);
        if size_bytes > self.config.max_entry_size {
            debug!(key = %key, size_bytes, "value exceeds max_entry_size, not cached");
            return;
        }

        // Last set wins: drop any previous entry under this key first.
        self.remove_entry(&key);

        self.seq += 1;
        self.tick += 1;
        let ttl = opts.ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry::new(
            value,
            ttl,
            opts.tags,
            opts.priority,
            size_bytes,
            self.seq,
            self.tick,
        );
        let rank = self.config.eviction.rank(&entry);
        self.index.insert(rank, entry.seq, &key);
        self.total_bytes += entry.size_bytes;
        self.entries.insert(key, entry);

        if self.entries.len() > self.config.max_size {
            self.evict_overflow();
        }
    }

    /// Read a value. Expired entries are deleted as a side effect and
    /// reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        if self.expire_if_needed(key) {
            self.misses += 1;
            return None;
        }
        let policy = self.config.eviction;
        let Some(entry) = self.entries.get_mut(key) else {
            self.misses += 1;
            return None;
        };

        self.tick += 1;
        let old_rank = policy.rank(entry);
        entry.touch(self.tick);
        let new_rank = policy.rank(entry);
        let seq = entry.seq;
        let value = entry.value.clone();
        self.index.reindex(old_rank, new_rank, seq, key);
        self.hits += 1;
        Some(value)
    }

    /// Whether a live, unexpired entry exists. Does not update access
    /// metadata or hit/miss counters.
    pub fn has(&mut self, key: &str) -> bool {
        if self.expire_if_needed(key) {
            return false;
        }
        self.entries.contains_key(key)
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delete all entries whose TTL has elapsed; returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove_entry(key);
        }
        self.expirations += expired.len() as u64;
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.config.max_size,
            total_bytes: self.total_bytes,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Remove an entry and keep the index and byte counter consistent.
    pub(crate) fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        let rank = self.config.eviction.rank(&entry);
        self.index.remove(rank, entry.seq);
        self.total_bytes -= entry.size_bytes;
        Some(entry)
    }

    /// Lazily expire the entry under `key`. Returns true if it was removed.
    fn expire_if_needed(&mut self, key: &str) -> bool {
        let expired = self.entries.get(key).is_some_and(|e| e.is_expired());
        if expired {
            self.remove_entry(key);
            self.expirations += 1;
        }
        expired
    }

    /// Evict the lowest-ranked fraction of entries (at least one).
    fn evict_overflow(&mut self) {
        let len = self.entries.len();
        let count = ((len as f64 * self.config.evict_fraction).ceil() as usize)
            .max(1)
            .min(len);
        for _ in 0..count {
            let Some(key) = self.index.pop_lowest() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&key) {
                self.total_bytes -= entry.size_bytes;
                self.evictions += 1;
                debug!(key = %key, policy = ?self.config.eviction, "evicted cache entry");
            }
        }
    }
}

fn estimate_size(value: &Value) -> usize {
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(0)
}

/// Cloneable, shareable handle over a [`CacheStore`].
///
/// Constructed once and passed by reference/clone to every consumer; there
/// is deliberately no process-wide instance, so tests and embedders can run
/// multiple isolated caches.
#[derive(Debug, Clone)]
pub struct CacheHandle {
    inner: Arc<Mutex<CacheStore>>,
}

impl CacheHandle {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheStore::new(config))),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: Value, opts: SetOptions) {
        self.inner.lock().unwrap().set(key, value, opts)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().unwrap().get(key)
    }

    /// Typed read; deserialization failures surface as
    /// [`Error::Serialization`].
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().unwrap().has(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().unwrap().delete(key)
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().clear()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    pub fn purge_expired(&self) -> usize {
        self.inner.lock().unwrap().purge_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap().stats()
    }

    pub fn invalidate_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        self.inner.lock().unwrap().invalidate_by_tags(tags)
    }

    pub fn invalidate_by_pattern(&self, pattern: &str) -> Result<usize> {
        self.inner.lock().unwrap().invalidate_by_pattern(pattern)
    }
}

impl Default for CacheHandle {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
