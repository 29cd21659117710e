// SPDX-License-Identifier: Apache-2.0

//! Caching and chunked fetching for market-data REST aggregates
//!
//! `aggcache` decorates a REST client for an upstream aggregates API with two
//! orthogonal capabilities:
//!
//! - **Response caching** behind a content classifier: a response is only
//!   written to the cache when its content proves the underlying data is
//!   finalized (historical), so volatile in-progress data is always
//!   re-fetched. Backends are pluggable ([`DiskCache`], [`MemoryCache`],
//!   [`NoOpCache`]) behind the [`ResponseCache`] trait.
//! - **Chunked ranged fetching**: date ranges too large for one upstream call
//!   are partitioned into bounded windows, fetched concurrently, and the
//!   partial responses are merged back into one combined result with strict
//!   identity-field checking.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use aggcache::{AggregateQuery, CachedRestClient, Timespan};
//! use chrono::NaiveDate;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CachedRestClient::with_memory_cache("my-api-key");
//!
//! let query = AggregateQuery::new(
//!     "AAPL",
//!     1,
//!     Timespan::Minute,
//!     NaiveDate::from_ymd_opt(2020, 6, 4).ok_or("bad date")?,
//!     NaiveDate::from_ymd_opt(2020, 6, 20).ok_or("bad date")?,
//! );
//!
//! // Three concurrent sub-requests, merged into one response.
//! let combined = client.fetch_aggregates(&query).await?;
//! println!("{} bars, {} served from cache",
//!     combined.results.len(),
//!     client.cache_stats().await.hits);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`classify`] decides cacheability from response content alone
//! - [`window`] partitions date ranges into bounded windows
//! - [`aggregates`] dispatches windows concurrently and merges partials
//! - [`cache`] holds the [`ResponseCache`] trait and its backends
//! - [`transport`] performs HTTP exchanges through the classifier-gated cache
//! - [`errors`] carries the per-module error types and [`AggcacheError`]

pub mod aggregates;
pub mod cache;
pub mod classify;
pub mod errors;
pub mod transport;
pub mod window;

mod client;
mod spans;
mod types;

pub use aggregates::{
    combine_aggregate_results, fetch_aggregates_chunked, AggregateQuery, AggregatesApi,
    DEFAULT_MAX_CONCURRENCY,
};
pub use cache::{
    types::{AccessSequence, TimestampMillis},
    CacheKey, CacheStats, DiskCache, MemoryCache, NoOpCache, ResponseCache,
};
pub use classify::is_cacheable;
pub use client::{CachedRestClient, DEFAULT_BASE_URL};
pub use errors::{AggcacheError, CacheError, FetchError, MergeError, TransportError};
pub use transport::{CachedTransport, HttpBackend, ReqwestBackend};
pub use types::{AggregateBar, AggregateResponse};
pub use window::{DateWindow, Timespan, WindowIterator, WindowLength};
