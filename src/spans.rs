// SPDX-License-Identifier: Apache-2.0

//! Span constructors for the instrumented operations.
//!
//! Telemetry stays out of the business logic: rather than `#[instrument]`
//! attributes, each operation builds its span from a helper here and wraps
//! its body with `tracing::Instrument`:
//!
//! ```rust,ignore
//! async { /* operation body */ }
//!     .instrument(spans::fetch_window(ticker, start, end))
//!     .await
//! ```
//!
//! Instrumenting the future (instead of holding an entered guard across an
//! `.await`) keeps the composed futures `Send`.

use chrono::NaiveDate;
use tracing::{Level, Span};

use crate::window::Timespan;

/// Create span for a full chunked aggregate fetch.
///
/// Parent: None (root span for this operation)
/// Children: fetch_window spans (one per date window)
#[inline]
pub(crate) fn fetch_aggregates(
    ticker: &str,
    multiplier: u32,
    timespan: Timespan,
    from: NaiveDate,
    to: NaiveDate,
) -> Span {
    tracing::span!(
        Level::INFO,
        "aggcache.fetch_aggregates",
        ticker = %ticker,
        multiplier = multiplier,
        timespan = %timespan,
        from = %from,
        to = %to,
    )
}

/// Create span for one sub-request of a chunked fetch.
///
/// Parent: fetch_aggregates span
/// Children: transport_get span
#[inline]
pub(crate) fn fetch_window(ticker: &str, start: NaiveDate, end: NaiveDate) -> Span {
    tracing::debug_span!(
        "aggcache.fetch_window",
        ticker = %ticker,
        window_start = %start,
        window_end = %end,
    )
}

/// Create span for one cached transport exchange.
///
/// Parent: fetch_window span (or none for direct endpoint calls)
#[inline]
pub(crate) fn transport_get(url: &str) -> Span {
    tracing::debug_span!("aggcache.transport_get", url = %url)
}
