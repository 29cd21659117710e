// SPDX-License-Identifier: Apache-2.0

//! Persistent response cache stored as a single versioned JSON file

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{types::TimestampMillis, CacheKey, CacheStats, ResponseCache};
use crate::errors::CacheError;

/// On-disk format version; bumped on any incompatible layout change
const FORMAT_VERSION: u32 = 1;

/// Throwaway file used to probe directory writability in [`DiskCache::validate`]
const PROBE_FILE: &str = ".aggcache-probe";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredResponse {
    body: Value,
    #[serde(default)]
    stored_at: TimestampMillis,
}

impl StoredResponse {
    fn new(body: Value) -> Self {
        Self {
            body,
            stored_at: TimestampMillis::now(),
        }
    }

    fn expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.stored_at.older_than(ttl))
    }
}

/// The whole cache file: a version tag and a URL-keyed entry map
///
/// Keys are request URLs, so the map serializes directly as a JSON object.
#[derive(Debug, Serialize, Deserialize)]
struct DiskFile {
    version: u32,
    entries: HashMap<CacheKey, StoredResponse>,
}

impl DiskFile {
    fn empty() -> Self {
        Self {
            version: FORMAT_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Removes the oldest entries until at most `cap` remain; returns how
    /// many were dropped
    fn prune_oldest(&mut self, cap: usize) -> u64 {
        if self.entries.len() <= cap {
            return 0;
        }

        let mut by_age: Vec<(CacheKey, TimestampMillis)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.stored_at))
            .collect();
        by_age.sort_by_key(|(_, stored_at)| *stored_at);

        let excess = self.entries.len() - cap;
        for (key, _) in by_age.into_iter().take(excess) {
            debug!(key = %key, "Pruning oldest disk cache entry");
            self.entries.remove(&key);
        }
        excess as u64
    }
}

/// Response cache persisted to a JSON file
///
/// The whole cache lives in one file, rewritten atomically (write to a
/// sibling temp file, then rename) under an advisory file lock so separate
/// processes sharing the path do not tear each other's writes. The format
/// carries a version tag; a file with an unknown version is ignored rather
/// than migrated.
///
/// Historical market data never changes, so entries written through the
/// classifier gate stay valid indefinitely. The optional TTL and entry cap
/// bound file growth, not correctness.
///
/// # Examples
///
/// ```rust,ignore
/// use aggcache::cache::DiskCache;
/// use std::time::Duration;
///
/// let cache = DiskCache::new("/var/cache/aggcache/responses.json")
///     .with_max_entries(10_000)
///     .with_ttl(Duration::from_secs(86400 * 30))
///     .validate()?;
/// ```
#[derive(Debug)]
pub struct DiskCache {
    path: PathBuf,
    max_entries: Option<usize>,
    ttl: Option<Duration>,
    // Guards both the stats and, by convention, file access from this
    // process; cross-process safety comes from the file lock.
    stats: Mutex<CacheStats>,
}

impl DiskCache {
    /// A cache stored at `path`
    ///
    /// The file is created on first insert. Nothing touches the filesystem
    /// until then; call [`validate`](Self::validate) to surface path problems
    /// up front instead of on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: None,
            ttl: None,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Caps the entry count; the oldest entries (by storage time) are pruned
    /// on insert to stay under the cap
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Expires entries older than `ttl` when they are next read
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Checks the cache path eagerly: creates the parent directory if absent
    /// and probes that it is writable
    pub fn validate(self) -> Result<Self, CacheError> {
        let dir = self.path.parent().ok_or_else(|| {
            CacheError::io(
                self.path.display().to_string(),
                "cache path has no parent directory",
                None,
            )
        })?;

        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| {
                CacheError::io(
                    dir.display().to_string(),
                    format!("cannot create cache directory: {e}"),
                    Some(e),
                )
            })?;
            debug!(dir = %dir.display(), "Created cache directory");
        }

        let probe = dir.join(PROBE_FILE);
        std::fs::write(&probe, b"probe").map_err(|e| {
            CacheError::io(
                dir.display().to_string(),
                format!("cache directory is not writable: {e}"),
                Some(e),
            )
        })?;
        let _ = std::fs::remove_file(&probe);

        Ok(self)
    }

    /// Reads and decodes the cache file under a shared lock
    ///
    /// A missing file is an empty cache; an unreadable or undecodable one is
    /// an error the read path downgrades to a miss.
    async fn read_file(&self) -> Result<DiskFile, CacheError> {
        if !self.path.exists() {
            return Ok(DiskFile::empty());
        }

        let file = File::open(&self.path).map_err(|e| {
            CacheError::io(
                self.path.display().to_string(),
                format!("cannot open cache file: {e}"),
                Some(e),
            )
        })?;
        file.lock_shared().map_err(|e| {
            CacheError::io(
                self.path.display().to_string(),
                format!("cannot lock cache file for reading: {e}"),
                Some(e),
            )
        })?;

        // The lock releases when `file` drops at the end of this scope.
        let decoded: DiskFile = serde_json::from_reader(&file)
            .map_err(|e| CacheError::serialization("cache file is not valid JSON", e))?;

        if decoded.version != FORMAT_VERSION {
            warn!(
                path = %self.path.display(),
                found = decoded.version,
                expected = FORMAT_VERSION,
                "Ignoring cache file with unknown format version"
            );
            return Ok(DiskFile::empty());
        }

        Ok(decoded)
    }

    /// Writes the cache file atomically: temp file, exclusive lock, rename
    async fn write_file(&self, contents: &DiskFile) -> Result<(), CacheError> {
        let encoded = serde_json::to_vec(contents)
            .map_err(|e| CacheError::serialization("cannot encode cache contents", e))?;

        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    CacheError::io(
                        dir.display().to_string(),
                        format!("cannot create cache directory: {e}"),
                        Some(e),
                    )
                })?;
            }
        }

        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, &encoded).await.map_err(|e| {
            CacheError::io(
                staging.display().to_string(),
                format!("cannot write cache file: {e}"),
                Some(e),
            )
        })?;

        let lock = File::open(&staging).map_err(|e| {
            CacheError::io(
                staging.display().to_string(),
                format!("cannot reopen staged cache file: {e}"),
                Some(e),
            )
        })?;
        lock.lock().map_err(|e| {
            CacheError::io(
                staging.display().to_string(),
                format!("cannot lock cache file for writing: {e}"),
                Some(e),
            )
        })?;

        tokio::fs::rename(&staging, &self.path).await.map_err(|e| {
            CacheError::io(
                self.path.display().to_string(),
                format!("cannot move cache file into place: {e}"),
                Some(e),
            )
        })?;
        drop(lock);

        debug!(
            path = %self.path.display(),
            entries = contents.entries.len(),
            "Wrote disk cache"
        );
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for DiskCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut stats = self.stats.lock().await;

        let contents = match self.read_file().await {
            Ok(contents) => contents,
            Err(e) => {
                warn!(error = %e, "Disk cache unreadable, treating as miss");
                stats.misses += 1;
                return None;
            }
        };

        match contents.entries.get(key) {
            Some(entry) if entry.expired(self.ttl) => {
                debug!(key = %key, "Disk cache entry expired");
                stats.expirations += 1;
                stats.misses += 1;
                None
            }
            Some(entry) => {
                stats.hits += 1;
                debug!(key = %key, "Disk cache hit");
                Some(entry.body.clone())
            }
            None => {
                stats.misses += 1;
                debug!(key = %key, "Disk cache miss");
                None
            }
        }
    }

    async fn insert(&self, key: CacheKey, body: Value) -> Result<(), CacheError> {
        let mut stats = self.stats.lock().await;

        // An unreadable file is replaced rather than propagated: losing the
        // old cache is preferable to never writing a new one.
        let mut contents = self.read_file().await.unwrap_or_else(|e| {
            warn!(error = %e, "Replacing unreadable disk cache");
            DiskFile::empty()
        });

        debug!(key = %key, "Storing response body in disk cache");
        contents.entries.insert(key, StoredResponse::new(body));

        if let Some(cap) = self.max_entries {
            stats.evictions += contents.prune_oldest(cap);
        }
        stats.entries = contents.entries.len();

        self.write_file(&contents).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut stats = self.stats.lock().await;

        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await.map_err(|e| {
                CacheError::io(
                    self.path.display().to_string(),
                    format!("cannot delete cache file: {e}"),
                    Some(e),
                )
            })?;
            info!(path = %self.path.display(), "Deleted disk cache file");
        }

        stats.entries = 0;
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().await;
        if let Ok(contents) = self.read_file().await {
            stats.entries = contents.entries.len();
        }
        stats.clone()
    }

    fn name(&self) -> &'static str {
        "DiskCache"
    }
}
