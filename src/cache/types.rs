// SPDX-License-Identifier: Apache-2.0

//! Metadata newtypes shared by the cache backends

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Creation instant of a cache entry, as milliseconds since the Unix epoch
///
/// Millisecond precision keeps entries written in quick succession ordered
/// distinctly, which the disk backend relies on for oldest-first pruning.
/// A clock before the epoch collapses to zero rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampMillis(u128);

impl TimestampMillis {
    /// The current instant
    pub fn now() -> Self {
        Self(Self::epoch_millis())
    }

    #[cfg(test)]
    pub(crate) fn from_millis(millis: u128) -> Self {
        Self(millis)
    }

    /// How long ago this instant was; zero for instants in the future
    pub fn age(&self) -> Duration {
        let elapsed = Self::epoch_millis().saturating_sub(self.0);
        Duration::from_millis(elapsed as u64)
    }

    /// Whether this instant lies further in the past than `limit`
    pub fn older_than(&self, limit: Duration) -> bool {
        self.age() > limit
    }

    fn epoch_millis() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }
}

impl Default for TimestampMillis {
    fn default() -> Self {
        Self::now()
    }
}

/// Tie-breaker for LRU ordering in the memory backend
///
/// Two entries touched within the same millisecond compare equal on their
/// timestamps alone; the sequence number makes the ordering total, with lower
/// values meaning less recently used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct AccessSequence(u64);

impl AccessSequence {
    /// The sequence number after this one (saturating at the maximum)
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}
