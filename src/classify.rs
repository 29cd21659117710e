// SPDX-License-Identifier: Apache-2.0

//! Cache eligibility classification for raw API responses
//!
//! Upstream financial data for a fully elapsed trading day is immutable and
//! safe to cache forever; data for the current or a future day may still be
//! revised intraday and must never be cached. This module decides, per decoded
//! response body, which of the two a response is.
//!
//! Two upstream response shapes encode "which date this data is about"
//! differently: an explicit `from` query-date field, or the timestamp of the
//! last row in the `results` collection. The classifier tries both rules in
//! order; each rule either fires with a verdict or falls through on any
//! structural mismatch. If neither rule fires, the response is conservatively
//! treated as not cacheable.
//!
//! The two rules deliberately use different reference clocks: the `from` field
//! is a US-market query date and is compared against "today" in US Eastern
//! time, while row timestamps are UTC epoch milliseconds and are compared
//! against "today" in UTC. The asymmetry reflects the two shapes' own
//! conventions and must not be unified.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::New_York;
use serde_json::Value;
use tracing::trace;

/// Upstream query-date format (`YYYY-MM-DD`)
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decides whether a raw response body is safe to cache permanently
///
/// Never panics and never errors: any structural mismatch in the body falls
/// through the rule chain, and an unclassifiable body defaults to not
/// cacheable.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// // Historical query date: immutable, cacheable.
/// assert!(aggcache::is_cacheable(&json!({"from": "2020-01-15"})));
///
/// // Nothing to classify on: conservative default.
/// assert!(!aggcache::is_cacheable(&json!({"status": "OK"})));
/// ```
pub fn is_cacheable(body: &Value) -> bool {
    let now = Utc::now();
    is_cacheable_at(
        body,
        now.with_timezone(&New_York).date_naive(),
        now.date_naive(),
    )
}

/// [`is_cacheable`] with an explicit "today" for each reference clock
///
/// `today_eastern` is used by the from-date rule and `today_utc` by the
/// timestamp rule. Exposed within the crate so tests can pin the clock.
pub(crate) fn is_cacheable_at(body: &Value, today_eastern: NaiveDate, today_utc: NaiveDate) -> bool {
    // First applicable rule wins; conservative default otherwise.
    let verdict = from_date_rule(body, today_eastern)
        .or_else(|| last_timestamp_rule(body, today_utc))
        .unwrap_or(false);

    trace!(cacheable = verdict, "Classified response body");
    verdict
}

/// Rule 1: the body carries the query's start date in a `from` field
///
/// Fires iff the field is present and parses as `YYYY-MM-DD`; the response is
/// cacheable iff that date is strictly before today in US Eastern time.
fn from_date_rule(body: &Value, today: NaiveDate) -> Option<bool> {
    let raw = body.get("from")?.as_str()?;
    let from_date = NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()?;
    Some(from_date < today)
}

/// Rule 2: the last row of the `results` collection carries a millisecond
/// Unix timestamp in `t`
///
/// Fires iff the collection is a non-empty array whose last element has a
/// numeric `t`; the response is cacheable iff the UTC calendar date of that
/// timestamp is strictly before today in UTC. The last row is representative
/// because upstream orders result rows ascending by time.
fn last_timestamp_rule(body: &Value, today: NaiveDate) -> Option<bool> {
    let ts_ms = body.get("results")?.as_array()?.last()?.get("t")?.as_i64()?;
    let row_date = DateTime::<Utc>::from_timestamp_millis(ts_ms)?.date_naive();
    Some(row_date < today)
}
