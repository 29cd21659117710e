//! Error types for combining partial aggregate results.

/// Data-integrity errors from merging partial results of one logical query.
///
/// Every partial result of a chunked aggregate fetch must agree exactly on its
/// identity fields (ticker, status, adjusted flag). A disagreement means the
/// partials do not describe the same logical query and the merge is aborted;
/// this is not a recoverable condition.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Two partial results disagree on an identity field.
    ///
    /// `field` is the plural description of the field ("tickers", "statuses",
    /// "adjusted flags"), `value` is the conflicting value and `expected` is
    /// the value taken from the first partial.
    #[error("Multiple {field} encountered while trying to combine results: {value} and {expected}")]
    FieldMismatch {
        /// Plural description of the disagreeing field
        field: &'static str,
        /// The conflicting value
        value: String,
        /// The expected value (from the first partial)
        expected: String,
    },

    /// No partial results were provided to merge.
    #[error("Cannot combine an empty set of partial results")]
    NoResults,
}

impl MergeError {
    /// Create a `FieldMismatch` error for the given field description.
    pub fn field_mismatch(
        field: &'static str,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        MergeError::FieldMismatch {
            field,
            value: value.into(),
            expected: expected.into(),
        }
    }
}
