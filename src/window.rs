//! Date-range partitioning for ranged aggregate queries
//!
//! The upstream API enforces per-call row limits that depend on the bar
//! granularity: minute and hour bars produce so many rows that only a few days
//! fit in one call, while daily and coarser bars are effectively unbounded.
//! These types partition an inclusive `[from, to]` date range into consecutive
//! windows small enough for a single upstream call each.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::FetchError;

/// Bar granularity of an aggregate query
///
/// Matches the upstream path segment (`minute`, `hour`, `day`, ...). The
/// granularity determines the maximum window length for chunked fetching via
/// [`Timespan::max_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timespan {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Timespan {
    /// Returns the upstream wire name of this timespan
    pub fn as_str(&self) -> &'static str {
        match self {
            Timespan::Minute => "minute",
            Timespan::Hour => "hour",
            Timespan::Day => "day",
            Timespan::Week => "week",
            Timespan::Month => "month",
            Timespan::Quarter => "quarter",
            Timespan::Year => "year",
        }
    }

    /// True for granularities finer than one day
    pub fn is_sub_daily(&self) -> bool {
        matches!(self, Timespan::Minute | Timespan::Hour)
    }

    /// Maximum window length for one upstream call at this granularity
    ///
    /// Sub-daily bars hit the upstream per-call row limit quickly, so their
    /// windows are capped at [`WindowLength::SUB_DAILY`]. Daily and coarser
    /// bars use [`WindowLength::UNBOUNDED`], which covers any realistic range
    /// in a single call.
    pub fn max_window(&self) -> WindowLength {
        if self.is_sub_daily() {
            WindowLength::SUB_DAILY
        } else {
            WindowLength::UNBOUNDED
        }
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timespan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minute" => Ok(Timespan::Minute),
            "hour" => Ok(Timespan::Hour),
            "day" => Ok(Timespan::Day),
            "week" => Ok(Timespan::Week),
            "month" => Ok(Timespan::Month),
            "quarter" => Ok(Timespan::Quarter),
            "year" => Ok(Timespan::Year),
            other => Err(format!("Unknown timespan: {other}")),
        }
    }
}

/// An inclusive pair of calendar dates, day granularity, no timezone
///
/// Produced by the partitioner and consumed by the dispatcher; never mutated
/// after creation. Both endpoints are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First day in the window (inclusive)
    pub start: NaiveDate,

    /// Last day in the window (inclusive)
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a new window, validating that `start <= end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FetchError> {
        if start > end {
            return Err(FetchError::invalid_range(start, end));
        }
        Ok(Self { start, end })
    }

    /// Number of calendar days covered by this window (inclusive)
    pub fn days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Maximum window span in days for one upstream call
///
/// A window of length `n` runs from its start date to `start + n` days
/// (truncated to the range end), so it covers up to `n + 1` calendar days.
/// This matches the upstream decorator's observed partitions: a 14-day range
/// at length 5 splits into three windows of 6, 6 and 2 days.
///
/// # Examples
///
/// ```
/// use aggcache::WindowLength;
///
/// let sub_daily = WindowLength::SUB_DAILY;
/// assert_eq!(sub_daily.as_days(), 5);
///
/// let unbounded = WindowLength::UNBOUNDED;
/// assert_eq!(unbounded.as_days(), 3000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowLength(u64);

impl WindowLength {
    /// Window length for minute and hour bars (tight upstream row limits)
    pub const SUB_DAILY: Self = Self(5);

    /// Window length for daily and coarser bars (effectively unbounded)
    pub const UNBOUNDED: Self = Self(3000);

    /// Create a new window length
    pub const fn new(days: u64) -> Self {
        Self(days)
    }

    /// Get the length in days
    pub const fn as_days(&self) -> u64 {
        self.0
    }

    /// Calculate the number of windows needed to cover `[from, to]`
    ///
    /// Returns 0 for an inverted range.
    ///
    /// # Examples
    ///
    /// ```
    /// use aggcache::WindowLength;
    /// use chrono::NaiveDate;
    ///
    /// let length = WindowLength::new(5);
    /// let from = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    /// let to = NaiveDate::from_ymd_opt(2020, 1, 14).unwrap();
    /// assert_eq!(length.windows_needed(from, to), 3);
    /// ```
    pub fn windows_needed(&self, from: NaiveDate, to: NaiveDate) -> usize {
        if to < from {
            return 0;
        }
        let total_days = (to - from).num_days() as u64 + 1;
        // Each window advances the cursor by length + 1 days.
        total_days.div_ceil(self.0 + 1) as usize
    }

    /// Partition `[from, to]` into consecutive bounded windows
    ///
    /// Returns an iterator of [`DateWindow`]s covering the full range with no
    /// gaps or overlaps, in chronological order. Each window ends at
    /// `start + length` days or at `to`, whichever comes first; the next
    /// window starts the following day. An inverted range yields no windows.
    ///
    /// # Examples
    ///
    /// ```
    /// use aggcache::WindowLength;
    /// use chrono::NaiveDate;
    ///
    /// let length = WindowLength::new(5);
    /// let from = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    /// let to = NaiveDate::from_ymd_opt(2020, 1, 14).unwrap();
    /// let windows: Vec<_> = length.partition(from, to).collect();
    ///
    /// assert_eq!(windows.len(), 3);
    /// assert_eq!(windows[0].start, from);
    /// assert_eq!(windows[0].end, NaiveDate::from_ymd_opt(2020, 1, 6).unwrap());
    /// assert_eq!(windows[2].end, to);
    /// ```
    pub fn partition(&self, from: NaiveDate, to: NaiveDate) -> WindowIterator {
        WindowIterator {
            current: from,
            end: to,
            length: self.0,
            done: to < from,
        }
    }
}

impl From<u64> for WindowLength {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for WindowLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.0)
    }
}

/// Iterator over date windows
///
/// Created by [`WindowLength::partition`]. Yields [`DateWindow`]s in
/// chronological order.
#[derive(Debug, Clone)]
pub struct WindowIterator {
    current: NaiveDate,
    end: NaiveDate,
    length: u64,
    done: bool,
}

impl Iterator for WindowIterator {
    type Item = DateWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.current;
        let window_end = start
            .checked_add_days(Days::new(self.length))
            .map_or(self.end, |d| d.min(self.end));

        match window_end.succ_opt() {
            Some(next) if window_end < self.end => self.current = next,
            _ => self.done = true,
        }

        Some(DateWindow {
            start,
            end: window_end,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            let remaining_days = (self.end - self.current).num_days() as u64 + 1;
            let windows = remaining_days.div_ceil(self.length + 1) as usize;
            (windows, Some(windows))
        }
    }
}

impl ExactSizeIterator for WindowIterator {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_partition_sub_daily_range() {
        let windows: Vec<_> = WindowLength::new(5)
            .partition(date(2020, 1, 1), date(2020, 1, 14))
            .collect();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, date(2020, 1, 1));
        assert_eq!(windows[0].end, date(2020, 1, 6));
        assert_eq!(windows[1].start, date(2020, 1, 7));
        assert_eq!(windows[1].end, date(2020, 1, 12));
        assert_eq!(windows[2].start, date(2020, 1, 13));
        assert_eq!(windows[2].end, date(2020, 1, 14));
    }

    #[test]
    fn test_partition_unbounded_range() {
        let windows: Vec<_> = WindowLength::new(3000)
            .partition(date(2020, 1, 1), date(2020, 1, 14))
            .collect();

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, date(2020, 1, 1));
        assert_eq!(windows[0].end, date(2020, 1, 14));
    }

    #[test]
    fn test_partition_single_day() {
        let windows: Vec<_> = WindowLength::new(5)
            .partition(date(2020, 6, 4), date(2020, 6, 4))
            .collect();

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, date(2020, 6, 4));
        assert_eq!(windows[0].end, date(2020, 6, 4));
    }

    #[test]
    fn test_partition_inverted_range_is_empty() {
        let windows: Vec<_> = WindowLength::new(5)
            .partition(date(2020, 1, 14), date(2020, 1, 1))
            .collect();

        assert!(windows.is_empty());
    }

    #[test]
    fn test_partition_no_gaps_or_overlaps() {
        let from = date(2021, 3, 10);
        let to = date(2021, 7, 22);
        let windows: Vec<_> = WindowLength::new(7).partition(from, to).collect();

        assert_eq!(windows[0].start, from);
        assert_eq!(windows.last().unwrap().end, to);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
        }
    }

    #[test]
    fn test_partition_crosses_month_boundary() {
        let windows: Vec<_> = WindowLength::new(5)
            .partition(date(2020, 1, 29), date(2020, 2, 5))
            .collect();

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].end, date(2020, 2, 3));
        assert_eq!(windows[1].start, date(2020, 2, 4));
        assert_eq!(windows[1].end, date(2020, 2, 5));
    }

    #[test]
    fn test_windows_needed() {
        let length = WindowLength::new(5);

        assert_eq!(length.windows_needed(date(2020, 1, 1), date(2020, 1, 14)), 3);
        assert_eq!(length.windows_needed(date(2020, 1, 1), date(2020, 1, 6)), 1);
        assert_eq!(length.windows_needed(date(2020, 1, 1), date(2020, 1, 7)), 2);
        assert_eq!(length.windows_needed(date(2020, 1, 1), date(2020, 1, 1)), 1);
        assert_eq!(length.windows_needed(date(2020, 1, 14), date(2020, 1, 1)), 0);
    }

    #[test]
    fn test_window_iterator_size_hint() {
        let mut iter = WindowLength::new(5).partition(date(2020, 1, 1), date(2020, 1, 14));

        assert_eq!(iter.size_hint(), (3, Some(3)));

        iter.next();
        assert_eq!(iter.size_hint(), (2, Some(2)));

        iter.next();
        assert_eq!(iter.size_hint(), (1, Some(1)));

        iter.next();
        assert_eq!(iter.size_hint(), (0, Some(0)));
    }

    #[test]
    fn test_date_window_validation() {
        let window = DateWindow::new(date(2020, 1, 1), date(2020, 1, 6));
        assert!(window.is_ok());
        assert_eq!(window.unwrap().days(), 6);

        let inverted = DateWindow::new(date(2020, 1, 6), date(2020, 1, 1));
        assert!(inverted.is_err());

        let single = DateWindow::new(date(2020, 1, 1), date(2020, 1, 1)).unwrap();
        assert_eq!(single.days(), 1);
    }

    #[test]
    fn test_timespan_max_window() {
        assert_eq!(Timespan::Minute.max_window(), WindowLength::SUB_DAILY);
        assert_eq!(Timespan::Hour.max_window(), WindowLength::SUB_DAILY);
        assert_eq!(Timespan::Day.max_window(), WindowLength::UNBOUNDED);
        assert_eq!(Timespan::Week.max_window(), WindowLength::UNBOUNDED);
        assert_eq!(Timespan::Year.max_window(), WindowLength::UNBOUNDED);
    }

    #[test]
    fn test_timespan_round_trip() {
        for timespan in [
            Timespan::Minute,
            Timespan::Hour,
            Timespan::Day,
            Timespan::Week,
            Timespan::Month,
            Timespan::Quarter,
            Timespan::Year,
        ] {
            let parsed: Timespan = timespan.as_str().parse().unwrap();
            assert_eq!(parsed, timespan);
        }

        assert!("fortnight".parse::<Timespan>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", WindowLength::new(5)), "5 days");
        assert_eq!(format!("{}", Timespan::Minute), "minute");
        let window = DateWindow::new(date(2020, 1, 1), date(2020, 1, 6)).unwrap();
        assert_eq!(format!("{window}"), "[2020-01-01, 2020-01-06]");
    }

    #[test]
    fn test_serialization() {
        let length = WindowLength::new(5);
        let json = serde_json::to_string(&length).unwrap();
        assert_eq!(json, "5");
        let back: WindowLength = serde_json::from_str(&json).unwrap();
        assert_eq!(back, length);

        let json = serde_json::to_string(&Timespan::Minute).unwrap();
        assert_eq!(json, "\"minute\"");
    }
}
