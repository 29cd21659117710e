// SPDX-License-Identifier: Apache-2.0

//! Cached HTTP transport for the upstream API.
//!
//! This module performs the actual HTTP exchanges and gates cache writes on
//! the [classifier](crate::classify): every outbound call first consults the
//! response cache, and a fresh response body is written back only when the
//! classifier judges it immutable. Responses judged volatile are always
//! re-fetched.
//!
//! The [`HttpBackend`] trait is the seam to the wire: [`ReqwestBackend`]
//! implements it for production use, and tests substitute a mock backend to
//! exercise the gating logic without a network.
//!
//! # Usage
//!
//! ```rust,ignore
//! use aggcache::transport::{CachedTransport, ReqwestBackend};
//! use aggcache::cache::MemoryCache;
//!
//! let backend = ReqwestBackend::new("api_key");
//! let transport = CachedTransport::new(backend, Box::new(MemoryCache::new()));
//!
//! let body = transport.get_json(&url).await?;
//! ```

mod http;

pub use http::{CachedTransport, HttpBackend, ReqwestBackend};
