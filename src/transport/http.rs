//! HTTP backend trait, reqwest implementation, and the classifier-gated
//! cached transport

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn, Instrument};
use url::Url;

use crate::cache::{CacheKey, CacheStats, ResponseCache};
use crate::classify;
use crate::errors::TransportError;
use crate::spans;

/// Trait for performing one HTTP exchange with the upstream API
///
/// Implementations own authentication and connection management. The cached
/// transport builds URLs without credentials so that cache keys never hold
/// secrets; backends attach the API key as a request header.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Performs a GET request and decodes the response body as JSON
    async fn get_json(&self, url: &Url) -> Result<Value, TransportError>;
}

/// Production [`HttpBackend`] over a shared `reqwest` client
///
/// Authenticates with a bearer token so the API key never appears in request
/// URLs (and therefore never in cache keys).
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    api_key: String,
}

impl ReqwestBackend {
    /// Creates a backend authenticating with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Creates a backend over an existing `reqwest` client
    ///
    /// Use this to configure timeouts, proxies, or retry middleware on the
    /// client; retries are the transport's concern, not the fetcher's.
    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| TransportError::request(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::status(url.as_str(), status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::decode(url.as_str(), e))
    }
}

/// HTTP transport with a classifier-gated response cache
///
/// For every request:
/// 1. Consult the cache; a hit is returned without touching the network.
/// 2. On a miss, perform the exchange through the backend.
/// 3. Run the classifier on the decoded body; insert into the cache only when
///    the verdict is "cacheable". Volatile responses are never written, so
///    they are re-fetched on every call.
///
/// Cache failures are best-effort: a failed read is a miss, a failed write is
/// logged and ignored. Transport failures propagate.
pub struct CachedTransport<B> {
    backend: B,
    cache: Box<dyn ResponseCache>,
}

impl<B: HttpBackend> CachedTransport<B> {
    /// Creates a transport over the given backend and cache
    pub fn new(backend: B, cache: Box<dyn ResponseCache>) -> Self {
        Self { backend, cache }
    }

    /// Performs a GET request through the cache
    pub async fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        let span = spans::transport_get(url.as_str());

        async {
            let key = CacheKey::from_url(url);

            if let Some(body) = self.cache.get(&key).await {
                debug!(
                    url = %url,
                    cache = %self.cache.name(),
                    "Serving response from cache"
                );
                return Ok(body);
            }

            let body = self.backend.get_json(url).await?;

            if classify::is_cacheable(&body) {
                debug!(url = %url, "Response classified cacheable, writing to cache");
                if let Err(e) = self.cache.insert(key, body.clone()).await {
                    warn!(error = %e, "Failed to cache response (continuing anyway)");
                }
            } else {
                debug!(url = %url, "Response classified volatile, skipping cache write");
            }

            Ok(body)
        }
        .instrument(span)
        .await
    }

    /// Returns current cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
