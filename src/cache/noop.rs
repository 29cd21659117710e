//! Cache backend that stores nothing

use async_trait::async_trait;
use serde_json::Value;

use super::{CacheKey, CacheStats, ResponseCache};
use crate::errors::CacheError;

/// A backend that never stores and never hits
///
/// Every lookup misses and every write is discarded, so all traffic reaches
/// the upstream API, immutable historical responses included. Useful as a
/// control when measuring cache behavior, or when responses must always be
/// fresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCache;

#[async_trait]
impl ResponseCache for NoOpCache {
    async fn get(&self, _key: &CacheKey) -> Option<Value> {
        None
    }

    async fn insert(&self, _key: CacheKey, _body: Value) -> Result<(), CacheError> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }

    fn name(&self) -> &'static str {
        "NoOpCache"
    }
}
