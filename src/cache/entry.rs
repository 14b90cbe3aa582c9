//! Cache entry record.

use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// A single live cache entry with its bookkeeping metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub created_at: Instant,
    pub ttl: Duration,
    pub access_count: u64,
    pub last_access_at: Instant,
    /// Non-owning labels used only for bulk invalidation lookup.
    pub tags: HashSet<String>,
    pub priority: i32,
    /// Serialized size estimated once at insertion.
    pub size_bytes: usize,
    /// Monotonic insertion sequence; FIFO rank and eviction tie-break.
    pub(crate) seq: u64,
    /// Monotonic access tick; LRU rank.
    pub(crate) last_tick: u64,
}

impl CacheEntry {
    pub(crate) fn new(
        value: Value,
        ttl: Duration,
        tags: HashSet<String>,
        priority: i32,
        size_bytes: usize,
        seq: u64,
        tick: u64,
    ) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            ttl,
            access_count: 0,
            last_access_at: now,
            tags,
            priority,
            size_bytes,
            seq,
            last_tick: tick,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Record a successful read.
    pub(crate) fn touch(&mut self, tick: u64) {
        self.access_count += 1;
        self.last_access_at = Instant::now();
        self.last_tick = tick;
    }
}
