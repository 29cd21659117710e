// SPDX-License-Identifier: Apache-2.0

//! Cached REST client for the upstream aggregates API

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use url::Url;

use crate::aggregates::{self, AggregateQuery, AggregatesApi};
use crate::cache::{CacheStats, DiskCache, MemoryCache, NoOpCache, ResponseCache};
use crate::errors::{CacheError, FetchError, TransportError};
use crate::transport::{CachedTransport, HttpBackend, ReqwestBackend};
use crate::types::AggregateResponse;
use crate::window::Timespan;

/// Default upstream API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// REST client with a classifier-gated response cache
///
/// Wraps an [`HttpBackend`] with a [`ResponseCache`] and exposes the
/// aggregates endpoint both as single calls ([`AggregatesApi`]) and as
/// chunked ranged fetches ([`CachedRestClient::fetch_aggregates`]).
///
/// # Examples
///
/// ```rust,no_run
/// use aggcache::{AggregateQuery, CachedRestClient, Timespan};
/// use chrono::NaiveDate;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CachedRestClient::with_disk_cache("my-api-key", "/tmp/aggcache.json")?;
///
/// let query = AggregateQuery::new(
///     "AAPL",
///     1,
///     Timespan::Minute,
///     NaiveDate::from_ymd_opt(2020, 6, 4).ok_or("bad date")?,
///     NaiveDate::from_ymd_opt(2020, 6, 20).ok_or("bad date")?,
/// );
/// let combined = client.fetch_aggregates(&query).await?;
/// println!("{} rows", combined.results.len());
/// # Ok(())
/// # }
/// ```
pub struct CachedRestClient<B = ReqwestBackend> {
    base_url: String,
    transport: CachedTransport<B>,
}

impl CachedRestClient<ReqwestBackend> {
    /// Creates a client with a persistent disk cache at `path`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the cache path is not writable.
    pub fn with_disk_cache(
        api_key: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, CacheError> {
        let cache = DiskCache::new(path.as_ref()).validate()?;
        Ok(Self::new(ReqwestBackend::new(api_key), Box::new(cache)))
    }

    /// Creates a client with an in-process memory cache
    pub fn with_memory_cache(api_key: impl Into<String>) -> Self {
        Self::new(ReqwestBackend::new(api_key), Box::new(MemoryCache::new()))
    }

    /// Creates a client that never caches
    ///
    /// Every call goes to the network. Useful for comparing cached and
    /// uncached behavior, or when responses must always be fresh.
    pub fn without_cache(api_key: impl Into<String>) -> Self {
        Self::new(ReqwestBackend::new(api_key), Box::new(NoOpCache))
    }
}

impl<B: HttpBackend> CachedRestClient<B> {
    /// Creates a client over an explicit backend and cache
    pub fn new(backend: B, cache: Box<dyn ResponseCache>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: CachedTransport::new(backend, cache),
        }
    }

    /// Overrides the upstream base URL (e.g. for a test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches a ranged aggregate query, chunked and cached
    ///
    /// Partitions the range into windows sized for the query's granularity,
    /// fetches the windows concurrently through the cache, and merges the
    /// partial responses in window order. See
    /// [`aggregates::fetch_aggregates_chunked`].
    pub async fn fetch_aggregates(
        &self,
        query: &AggregateQuery,
    ) -> Result<AggregateResponse, FetchError> {
        aggregates::fetch_aggregates_chunked(self, query).await
    }

    /// Returns current cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        self.transport.cache_stats().await
    }

    /// Builds the aggregates endpoint URL for one window
    ///
    /// The API key is never part of the URL; backends authenticate with a
    /// header, so the URL doubles as a secret-free cache key.
    fn aggregates_url(
        &self,
        ticker: &str,
        multiplier: u32,
        timespan: Timespan,
        from: NaiveDate,
        to: NaiveDate,
        params: &[(String, String)],
    ) -> Result<Url, TransportError> {
        let raw = format!(
            "{}/v2/aggs/ticker/{ticker}/range/{multiplier}/{timespan}/{from}/{to}",
            self.base_url.trim_end_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|e| TransportError::invalid_url(&raw, e))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Performs one GET through the cached transport
    async fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        self.transport.get_json(url).await
    }
}

#[async_trait]
impl<B: HttpBackend> AggregatesApi for CachedRestClient<B> {
    async fn aggregates(
        &self,
        ticker: &str,
        multiplier: u32,
        timespan: Timespan,
        from: NaiveDate,
        to: NaiveDate,
        params: &[(String, String)],
    ) -> Result<AggregateResponse, FetchError> {
        let url = self.aggregates_url(ticker, multiplier, timespan, from, to, params)?;
        let body = self.get_json(&url).await?;
        serde_json::from_value(body)
            .map_err(|e| FetchError::decode(format!("aggregates response for {ticker}"), e))
    }
}
