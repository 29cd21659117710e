//! Error types for the aggcache library.
//!
//! Each layer has its own enum for callers that match on failure modes:
//!
//! - [`TransportError`] — the HTTP exchange itself
//! - [`CacheError`] — response cache backends
//! - [`MergeError`] — data-integrity violations while combining partials
//! - [`FetchError`] — ranged aggregate fetching (wraps the others it can hit)
//!
//! [`AggcacheError`] wraps all of them via `From`, for callers that only
//! need one error type to propagate with `?`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use aggcache::{CachedRestClient, FetchError};
//!
//! match client.fetch_aggregates(query).await {
//!     Ok(combined) => println!("{} rows", combined.results.len()),
//!     Err(FetchError::InvalidRange { from, to }) => {
//!         eprintln!("Bad range: {from} > {to}");
//!     }
//!     Err(FetchError::Merge(e)) => {
//!         eprintln!("Upstream returned inconsistent partials: {e}");
//!     }
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! ```

mod cache;
mod fetch;
mod merge;
mod transport;

pub use cache::CacheError;
pub use fetch::FetchError;
pub use merge::MergeError;
pub use transport::TransportError;

/// Any error an aggcache operation can produce.
///
/// Every per-module error converts into this via `From`, so `?` works across
/// layers without mapping. Match on the variants when the failing layer
/// matters; otherwise treat it as opaque.
#[derive(Debug, thiserror::Error)]
pub enum AggcacheError {
    /// Error from the HTTP transport layer.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error from a response cache backend.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Data-integrity error from combining partial results.
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Error from a ranged aggregate fetch.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}
