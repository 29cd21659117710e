// SPDX-License-Identifier: Apache-2.0

//! Test helpers for aggcache integration tests
//!
//! Provides mock implementations of traits to enable testing without real
//! network access.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use aggcache::{
    AggregateBar, AggregateResponse, AggregatesApi, FetchError, Timespan, TransportError,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Mock AggregatesApi for testing chunked fetching logic
///
/// Synthesizes one bar per calendar day of each requested window, and allows
/// per-window failures and identity-field overrides keyed by window start
/// date (stable under concurrent dispatch, unlike call order).
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockAggregatesApi::new()
///     .with_status("OK")
///     .with_failure_on(date(2020, 6, 10))
///     .with_status_override(date(2020, 6, 16), "DELAYED");
/// ```
pub struct MockAggregatesApi {
    status: String,
    adjusted: bool,
    fail_on: HashSet<NaiveDate>,
    status_overrides: HashMap<NaiveDate, String>,
    ticker_overrides: HashMap<NaiveDate, String>,
    calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
}

impl MockAggregatesApi {
    /// Create a mock that succeeds on every window
    pub fn new() -> Self {
        Self {
            status: "OK".to_string(),
            adjusted: true,
            fail_on: HashSet::new(),
            status_overrides: HashMap::new(),
            ticker_overrides: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the status string returned for every window
    #[allow(dead_code)]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Fail the window that starts on the given date with a transport error
    #[allow(dead_code)]
    pub fn with_failure_on(mut self, window_start: NaiveDate) -> Self {
        self.fail_on.insert(window_start);
        self
    }

    /// Override the status for the window that starts on the given date
    #[allow(dead_code)]
    pub fn with_status_override(
        mut self,
        window_start: NaiveDate,
        status: impl Into<String>,
    ) -> Self {
        self.status_overrides.insert(window_start, status.into());
        self
    }

    /// Override the echoed ticker for the window that starts on the given date
    #[allow(dead_code)]
    pub fn with_ticker_override(
        mut self,
        window_start: NaiveDate,
        ticker: impl Into<String>,
    ) -> Self {
        self.ticker_overrides.insert(window_start, ticker.into());
        self
    }

    /// Windows requested so far, in call order
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.calls.lock().unwrap().clone()
    }

    /// The bar the mock synthesizes for one calendar day
    pub fn bar_for(day: NaiveDate) -> AggregateBar {
        let midnight = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
        AggregateBar {
            timestamp_ms: midnight.timestamp_millis(),
            open: Some(100.0),
            high: Some(110.0),
            low: Some(95.0),
            close: Some(105.0),
            volume: Some(1000.0),
            vwap: None,
            transactions: Some(10),
        }
    }
}

impl Default for MockAggregatesApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AggregatesApi for MockAggregatesApi {
    async fn aggregates(
        &self,
        ticker: &str,
        _multiplier: u32,
        _timespan: Timespan,
        from: NaiveDate,
        to: NaiveDate,
        _params: &[(String, String)],
    ) -> Result<AggregateResponse, FetchError> {
        self.calls.lock().unwrap().push((from, to));

        if self.fail_on.contains(&from) {
            return Err(TransportError::status("http://mock.invalid", 500).into());
        }

        let results: Vec<AggregateBar> = from
            .iter_days()
            .take_while(|day| *day <= to)
            .map(Self::bar_for)
            .collect();

        let ticker = self
            .ticker_overrides
            .get(&from)
            .cloned()
            .unwrap_or_else(|| ticker.to_string());
        let status = self
            .status_overrides
            .get(&from)
            .cloned()
            .unwrap_or_else(|| self.status.clone());

        Ok(AggregateResponse {
            ticker,
            status,
            adjusted: self.adjusted,
            query_count: results.len() as u64,
            results_count: results.len() as u64,
            results,
        })
    }
}
