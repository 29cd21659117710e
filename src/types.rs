// SPDX-License-Identifier: Apache-2.0

//! Serde models of the upstream aggregate-bar response

use serde::{Deserialize, Serialize};

/// One OHLCV bar from the upstream aggregates endpoint
///
/// Only the millisecond timestamp is guaranteed; the remaining fields vary by
/// endpoint variant and market, so they are optional. Wire names follow the
/// upstream single-letter convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBar {
    /// Window start as milliseconds since the Unix epoch (UTC)
    #[serde(rename = "t")]
    pub timestamp_ms: i64,

    /// Open price
    #[serde(rename = "o", default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,

    /// High price
    #[serde(rename = "h", default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,

    /// Low price
    #[serde(rename = "l", default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,

    /// Close price
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,

    /// Trading volume
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,

    /// Volume-weighted average price
    #[serde(rename = "vw", default, skip_serializing_if = "Option::is_none")]
    pub vwap: Option<f64>,

    /// Number of transactions in the aggregate window
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<u64>,
}

/// Decoded response of one aggregates call, or the combined result of a
/// chunked fetch
///
/// `ticker`, `status` and `adjusted` are identity fields: every partial result
/// of one logical query must agree on them exactly. `query_count`,
/// `results_count` and `results` are accumulation fields: summed or
/// concatenated across partials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    /// Ticker symbol the query was for
    pub ticker: String,

    /// Upstream status string (e.g. "OK", "DELAYED")
    pub status: String,

    /// Whether results are adjusted for splits
    pub adjusted: bool,

    /// Number of aggregates the upstream query touched
    pub query_count: u64,

    /// Number of rows in `results`
    pub results_count: u64,

    /// Bar rows, ordered ascending by timestamp
    #[serde(default)]
    pub results: Vec<AggregateBar>,
}
