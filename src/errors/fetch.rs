//! Error types for ranged aggregate fetching.

use chrono::NaiveDate;

use super::{MergeError, TransportError};

/// Errors that can occur during a chunked aggregate fetch.
///
/// Any failure in a single sub-request aborts the whole fetch: ranged
/// aggregate fetching never returns partial results.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The requested date range is inverted (`from > to`).
    #[error("Invalid date range: from {from} is after to {to}")]
    InvalidRange {
        /// Requested start date
        from: NaiveDate,
        /// Requested end date
        to: NaiveDate,
    },

    /// A sub-request failed at the transport layer.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// An upstream response body did not decode into the aggregate shape.
    #[error("Failed to decode aggregate response: {details}")]
    Decode {
        /// Details about the decode failure
        details: String,
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// Partial results could not be reconciled into one combined result.
    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl FetchError {
    /// Create an `InvalidRange` error.
    pub fn invalid_range(from: NaiveDate, to: NaiveDate) -> Self {
        FetchError::InvalidRange { from, to }
    }

    /// Create a `Decode` error with details.
    pub fn decode(details: impl Into<String>, source: serde_json::Error) -> Self {
        FetchError::Decode {
            details: details.into(),
            source,
        }
    }
}
