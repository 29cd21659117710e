//! Cache backends for raw API response bodies
//!
//! A cached entry is the decoded body of one HTTP exchange, keyed by the
//! outbound request URL. Entries are only ever written for responses the
//! [classifier](crate::classify) has judged immutable, so a hit can be
//! served indefinitely. Three backends implement [`ResponseCache`]:
//! [`DiskCache`] persists across runs, [`MemoryCache`] lives for the
//! process, and [`NoOpCache`] turns caching off.
//!
//! # Examples
//!
//! ```rust,ignore
//! use aggcache::cache::{DiskCache, MemoryCache, NoOpCache};
//! use std::time::Duration;
//!
//! let persistent = DiskCache::new("responses.json")
//!     .with_ttl(Duration::from_secs(86400 * 30))
//!     .with_max_entries(10_000)
//!     .validate()?;
//!
//! let per_process = MemoryCache::new().with_max_entries(500);
//!
//! let disabled = NoOpCache;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use url::Url;

use crate::errors::CacheError;

mod disk;
mod memory;
mod noop;
pub mod types;

pub use disk::DiskCache;
pub use memory::MemoryCache;
pub use noop::NoOpCache;

/// Key for caching response bodies: the outbound request URL
///
/// The key covers the full URL including query parameters, so two requests
/// differing only in a passthrough parameter cache independently.
/// Authentication is carried in headers, never in the URL, so keys hold no
/// secrets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a cache key from an outbound request URL
    pub fn from_url(url: &Url) -> Self {
        Self(url.as_str().to_owned())
    }

    /// Creates a cache key from a raw string
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Running counters a cache backend keeps about itself
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that fell through to the network
    pub misses: u64,
    /// Entries dropped to stay under a size cap
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Entries currently stored
    pub entries: usize,
}

impl CacheStats {
    /// Share of lookups served from the cache, as a percentage
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 * 100.0 / total as f64,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits / {} misses ({:.1}%), {} entries, {} evicted, {} expired",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.evictions,
            self.expirations
        )
    }
}

/// Trait for response cache backends
///
/// Backends differ only in where bodies live; the transport drives them all
/// through this trait and never fails a fetch over a cache problem. Reads
/// that error internally surface as misses; write errors are returned but
/// callers log and move on. Implementations take `&self` and must tolerate
/// concurrent calls.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// The stored body for `key`, or `None` on a miss, an expired entry, or
    /// an internal read failure
    async fn get(&self, key: &CacheKey) -> Option<Value>;

    /// Stores a body under `key`, evicting older entries if a size cap
    /// requires it
    async fn insert(&self, key: CacheKey, body: Value) -> Result<(), CacheError>;

    /// Drops every stored entry
    async fn clear(&self) -> Result<(), CacheError>;

    /// A snapshot of this backend's counters
    async fn stats(&self) -> CacheStats;

    /// Short backend name for log lines
    fn name(&self) -> &'static str;
}
