// SPDX-License-Identifier: Apache-2.0

//! Chunked fetching of ranged aggregate queries
//!
//! Upstream per-call row limits make large sub-daily queries impossible in a
//! single request, so a ranged query is partitioned into bounded date windows
//! (see [`crate::window`]), the windows are dispatched concurrently against
//! an [`AggregatesApi`] implementation, and the partial responses are merged
//! back into one combined result (see [`merge`]).
//!
//! The fetch is all-or-nothing: a failed sub-request aborts the whole query
//! and no partial data is ever returned.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, Instrument};

use crate::errors::FetchError;
use crate::spans;
use crate::types::AggregateResponse;
use crate::window::{DateWindow, Timespan};

pub mod merge;

pub use merge::combine_aggregate_results;

/// Default bound on concurrent in-flight sub-requests per fetch
pub const DEFAULT_MAX_CONCURRENCY: usize = 20;

/// A ranged aggregate query
///
/// Built with [`AggregateQuery::new`] plus the `with_*` builders, then passed
/// to [`fetch_aggregates_chunked`] or
/// [`CachedRestClient::fetch_aggregates`](crate::CachedRestClient::fetch_aggregates).
#[derive(Debug, Clone)]
pub struct AggregateQuery {
    /// Ticker symbol to query
    pub ticker: String,

    /// Number of timespan units per bar (e.g. 5 with `Minute` = 5-minute bars)
    pub multiplier: u32,

    /// Bar granularity
    pub timespan: Timespan,

    /// First day of the range (inclusive)
    pub from: NaiveDate,

    /// Last day of the range (inclusive)
    pub to: NaiveDate,

    /// Extra query parameters passed through to every sub-request
    pub params: Vec<(String, String)>,

    /// Maximum concurrent in-flight sub-requests
    pub max_concurrency: usize,
}

impl AggregateQuery {
    /// Creates a query with default passthrough parameters and concurrency
    pub fn new(
        ticker: impl Into<String>,
        multiplier: u32,
        timespan: Timespan,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            multiplier,
            timespan,
            from,
            to,
            params: Vec::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Adds a query parameter forwarded verbatim to every sub-request
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Overrides the concurrency bound for this query
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }
}

/// A source of single-window aggregate responses
///
/// [`fetch_aggregates_chunked`] is generic over this trait so the chunking
/// and merging logic can be tested against mocks without any HTTP transport.
/// The production implementation is
/// [`CachedRestClient`](crate::CachedRestClient).
#[async_trait]
pub trait AggregatesApi: Send + Sync {
    /// Fetches aggregate bars for one date window
    async fn aggregates(
        &self,
        ticker: &str,
        multiplier: u32,
        timespan: Timespan,
        from: NaiveDate,
        to: NaiveDate,
        params: &[(String, String)],
    ) -> Result<AggregateResponse, FetchError>;
}

/// Fetches a ranged aggregate query as concurrent bounded sub-requests
///
/// The date range is partitioned per the query's granularity
/// ([`Timespan::max_window`]), each window is fetched through `api` with at
/// most `max_concurrency` requests in flight, and the partial responses are
/// merged in window order. Every in-flight sub-request runs to completion
/// before errors are reported, so a fast failure never cancels its siblings
/// mid-request.
///
/// # Errors
///
/// - [`FetchError::InvalidRange`] when `from > to`.
/// - [`FetchError::Transport`] / [`FetchError::Decode`] when any sub-request
///   fails; the first failure in window order is reported.
/// - [`FetchError::Merge`] when the partial responses disagree on an identity
///   field.
pub async fn fetch_aggregates_chunked<A>(
    api: &A,
    query: &AggregateQuery,
) -> Result<AggregateResponse, FetchError>
where
    A: AggregatesApi + ?Sized,
{
    if query.from > query.to {
        return Err(FetchError::invalid_range(query.from, query.to));
    }

    let span = spans::fetch_aggregates(
        &query.ticker,
        query.multiplier,
        query.timespan,
        query.from,
        query.to,
    );

    async {
        let windows: Vec<DateWindow> = query
            .timespan
            .max_window()
            .partition(query.from, query.to)
            .collect();

        debug!(
            windows = windows.len(),
            max_concurrency = query.max_concurrency,
            "partitioned aggregate query"
        );

        let partials: Vec<Result<AggregateResponse, FetchError>> = stream::iter(windows)
            .map(|window| {
                let window_span = spans::fetch_window(&query.ticker, window.start, window.end);
                async move {
                    api.aggregates(
                        &query.ticker,
                        query.multiplier,
                        query.timespan,
                        window.start,
                        window.end,
                        &query.params,
                    )
                    .await
                }
                .instrument(window_span)
            })
            .buffered(query.max_concurrency)
            .collect()
            .await;

        // Every window has completed by now; surface the first failure in
        // window order, discarding any sibling results.
        let partials: Vec<AggregateResponse> =
            partials.into_iter().collect::<Result<_, _>>()?;

        let combined = merge::combine_aggregate_results(partials)?;
        debug!(
            rows = combined.results.len(),
            query_count = combined.query_count,
            "combined partial results"
        );
        Ok(combined)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::errors::TransportError;
    use crate::types::AggregateBar;

    /// Records each requested window and synthesizes one bar per window.
    struct RecordingApi {
        calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
        fail_on_window: Option<usize>,
    }

    impl RecordingApi {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on_window: None,
            }
        }

        fn failing_on(window: usize) -> Self {
            Self {
                fail_on_window: Some(window),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl AggregatesApi for RecordingApi {
        async fn aggregates(
            &self,
            ticker: &str,
            _multiplier: u32,
            _timespan: Timespan,
            from: NaiveDate,
            to: NaiveDate,
            _params: &[(String, String)],
        ) -> Result<AggregateResponse, FetchError> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((from, to));
                calls.len() - 1
            };

            if self.fail_on_window == Some(index) {
                return Err(TransportError::status("http://example.invalid", 500).into());
            }

            Ok(AggregateResponse {
                ticker: ticker.to_string(),
                status: "OK".into(),
                adjusted: true,
                query_count: 1,
                results_count: 1,
                results: vec![AggregateBar {
                    timestamp_ms: from.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis(),
                    open: None,
                    high: None,
                    low: None,
                    close: None,
                    volume: None,
                    vwap: None,
                    transactions: None,
                }],
            })
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_sub_daily_query_is_partitioned() {
        let api = RecordingApi::new();
        let query = AggregateQuery::new(
            "TIC",
            1,
            Timespan::Minute,
            date(2020, 1, 1),
            date(2020, 1, 14),
        );

        let combined = fetch_aggregates_chunked(&api, &query).await.unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], (date(2020, 1, 1), date(2020, 1, 6)));
        assert_eq!(calls[2], (date(2020, 1, 13), date(2020, 1, 14)));
        assert_eq!(combined.query_count, 3);
        assert_eq!(combined.results.len(), 3);
    }

    #[tokio::test]
    async fn test_daily_query_is_one_request() {
        let api = RecordingApi::new();
        let query =
            AggregateQuery::new("TIC", 1, Timespan::Day, date(2020, 1, 1), date(2024, 1, 1));

        fetch_aggregates_chunked(&api, &query).await.unwrap();

        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rows_stay_in_window_order() {
        let api = RecordingApi::new();
        let query = AggregateQuery::new(
            "TIC",
            1,
            Timespan::Hour,
            date(2020, 6, 1),
            date(2020, 6, 20),
        );

        let combined = fetch_aggregates_chunked(&api, &query).await.unwrap();

        let timestamps: Vec<_> = combined.results.iter().map(|b| b.timestamp_ms).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_unstable();
        assert_eq!(timestamps, sorted);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let api = RecordingApi::new();
        let query = AggregateQuery::new(
            "TIC",
            1,
            Timespan::Minute,
            date(2020, 1, 14),
            date(2020, 1, 1),
        );

        let err = fetch_aggregates_chunked(&api, &query).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRange { .. }));
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_day_range_is_one_window() {
        let api = RecordingApi::new();
        let query = AggregateQuery::new(
            "TIC",
            1,
            Timespan::Minute,
            date(2020, 6, 4),
            date(2020, 6, 4),
        );

        fetch_aggregates_chunked(&api, &query).await.unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(date(2020, 6, 4), date(2020, 6, 4))]);
    }

    #[tokio::test]
    async fn test_sub_request_failure_aborts_the_fetch() {
        let api = RecordingApi::failing_on(1);
        let query = AggregateQuery::new(
            "TIC",
            1,
            Timespan::Minute,
            date(2020, 1, 1),
            date(2020, 1, 14),
        );

        let err = fetch_aggregates_chunked(&api, &query).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        // All windows were still dispatched before the error surfaced.
        assert_eq!(api.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrency_bound_of_one_serializes_requests() {
        let api = RecordingApi::new();
        let query = AggregateQuery::new(
            "TIC",
            1,
            Timespan::Minute,
            date(2020, 1, 1),
            date(2020, 1, 14),
        )
        .with_max_concurrency(1);

        let combined = fetch_aggregates_chunked(&api, &query).await.unwrap();
        assert_eq!(combined.results.len(), 3);
    }

    #[test]
    fn test_query_builder() {
        let query = AggregateQuery::new(
            "TIC",
            5,
            Timespan::Minute,
            date(2020, 1, 1),
            date(2020, 1, 2),
        )
        .with_param("sort", "asc")
        .with_max_concurrency(0);

        assert_eq!(query.params, vec![("sort".into(), "asc".into())]);
        // The bound is clamped to at least one in-flight request.
        assert_eq!(query.max_concurrency, 1);
        assert_eq!(query.max_concurrency.max(DEFAULT_MAX_CONCURRENCY), 20);
    }
}
