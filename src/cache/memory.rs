// SPDX-License-Identifier: Apache-2.0

//! In-process response cache backed by a `HashMap`

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    types::{AccessSequence, TimestampMillis},
    CacheKey, CacheStats, ResponseCache,
};
use crate::errors::CacheError;

/// One stored response body plus the bookkeeping LRU eviction needs
#[derive(Debug, Clone)]
struct Slot {
    body: Value,
    stored_at: TimestampMillis,
    last_used: TimestampMillis,
    use_seq: AccessSequence,
}

impl Slot {
    fn new(body: Value, use_seq: AccessSequence) -> Self {
        let now = TimestampMillis::now();
        Self {
            body,
            stored_at: now,
            last_used: now,
            use_seq,
        }
    }

    fn expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.stored_at.older_than(ttl))
    }

    fn mark_used(&mut self, use_seq: AccessSequence) {
        self.last_used = TimestampMillis::now();
        self.use_seq = use_seq;
    }
}

#[derive(Debug, Default)]
struct Inner {
    slots: HashMap<CacheKey, Slot>,
    stats: CacheStats,
    seq: AccessSequence,
}

impl Inner {
    /// Key of the least recently used slot, by (last use, sequence)
    fn lru_key(&self) -> Option<CacheKey> {
        self.slots
            .iter()
            .min_by_key(|(_, slot)| (slot.last_used, slot.use_seq))
            .map(|(key, _)| key.clone())
    }

    fn take_seq(&mut self) -> AccessSequence {
        let seq = self.seq;
        self.seq = self.seq.next();
        seq
    }
}

/// Response cache held entirely in process memory
///
/// Entries live in a `HashMap` behind a `tokio` mutex. Optional limits:
/// a TTL after which entries expire on access, and a maximum entry count
/// enforced by least-recently-used eviction. Contents are gone when the
/// process exits; use [`DiskCache`](super::DiskCache) when hits should
/// survive restarts.
///
/// # Examples
///
/// ```rust,ignore
/// use aggcache::cache::MemoryCache;
/// use std::time::Duration;
///
/// let unbounded = MemoryCache::new();
///
/// let bounded = MemoryCache::new()
///     .with_max_entries(500)
///     .with_ttl(Duration::from_secs(86400 * 7));
/// ```
#[derive(Debug)]
pub struct MemoryCache {
    max_entries: Option<usize>,
    ttl: Option<Duration>,
    inner: Mutex<Inner>,
}

impl MemoryCache {
    /// An unbounded cache: no TTL, no entry limit
    pub fn new() -> Self {
        Self {
            max_entries: None,
            ttl: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Caps the entry count; the least recently used entry is evicted to
    /// make room
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Expires entries older than `ttl` when they are next read
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut inner = self.inner.lock().await;
        let seq = inner.take_seq();

        let mut stale = false;
        let hit = if let Some(slot) = inner.slots.get_mut(key) {
            if slot.expired(self.ttl) {
                stale = true;
                None
            } else {
                slot.mark_used(seq);
                Some(slot.body.clone())
            }
        } else {
            None
        };

        if stale {
            debug!(key = %key, "Dropping expired memory cache entry");
            inner.slots.remove(key);
            inner.stats.expirations += 1;
            inner.stats.entries = inner.slots.len();
        }

        match hit {
            Some(body) => {
                inner.stats.hits += 1;
                debug!(key = %key, "Memory cache hit");
                Some(body)
            }
            None => {
                inner.stats.misses += 1;
                debug!(key = %key, "Memory cache miss");
                None
            }
        }
    }

    async fn insert(&self, key: CacheKey, body: Value) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().await;

        if let Some(cap) = self.max_entries {
            while inner.slots.len() >= cap {
                let Some(victim) = inner.lru_key() else { break };
                debug!(key = %victim, "Evicting least recently used memory cache entry");
                inner.slots.remove(&victim);
                inner.stats.evictions += 1;
            }
        }

        let seq = inner.take_seq();
        debug!(key = %key, "Storing response body in memory cache");
        inner.slots.insert(key, Slot::new(body, seq));
        inner.stats.entries = inner.slots.len();

        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().await;
        debug!(dropped = inner.slots.len(), "Memory cache cleared");
        inner.slots.clear();
        inner.stats.entries = 0;
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats.clone()
    }

    fn name(&self) -> &'static str {
        "MemoryCache"
    }
}
