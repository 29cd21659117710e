// SPDX-License-Identifier: Apache-2.0

//! Reconciliation of partial aggregate results into one combined result
//!
//! Every response field is either an *identity* field (must match exactly
//! across all partials of one logical query) or an *accumulation* field
//! (summed or concatenated across partials). Identity fields are declared in
//! a small table so that extending the merge to other ranged endpoints means
//! adding a row, not another hand-written comparison.

use std::fmt;

use crate::errors::MergeError;
use crate::types::AggregateResponse;

/// Value of an identity field, erased to a comparable, printable form
#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Flag(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// One identity field: a plural description for error messages and an
/// accessor into the response
struct IdentityField {
    description: &'static str,
    get: fn(&AggregateResponse) -> FieldValue,
}

/// Fields every partial of one logical query must agree on exactly
const IDENTITY_FIELDS: [IdentityField; 3] = [
    IdentityField {
        description: "tickers",
        get: |r| FieldValue::Text(r.ticker.clone()),
    },
    IdentityField {
        description: "statuses",
        get: |r| FieldValue::Text(r.status.clone()),
    },
    IdentityField {
        description: "adjusted flags",
        get: |r| FieldValue::Flag(r.adjusted),
    },
];

/// Merges partial results of one logical query into a combined result
///
/// The first partial's identity fields are taken as the expected values;
/// every other partial must match them exactly. `query_count` and
/// `results_count` are summed and the bar rows are concatenated in input
/// order, so passing partials in window order yields a chronologically
/// ordered combined row sequence.
///
/// # Errors
///
/// - [`MergeError::FieldMismatch`] when any partial disagrees with the first
///   on an identity field. This is a data-integrity violation, not a
///   recoverable condition.
/// - [`MergeError::NoResults`] when `partials` is empty.
pub fn combine_aggregate_results(
    partials: Vec<AggregateResponse>,
) -> Result<AggregateResponse, MergeError> {
    let first = partials.first().ok_or(MergeError::NoResults)?;

    for field in &IDENTITY_FIELDS {
        let expected = (field.get)(first);
        for partial in &partials[1..] {
            let value = (field.get)(partial);
            if value != expected {
                return Err(MergeError::field_mismatch(
                    field.description,
                    value.to_string(),
                    expected.to_string(),
                ));
            }
        }
    }

    let mut combined = AggregateResponse {
        ticker: first.ticker.clone(),
        status: first.status.clone(),
        adjusted: first.adjusted,
        query_count: 0,
        results_count: 0,
        results: Vec::with_capacity(partials.iter().map(|p| p.results.len()).sum()),
    };

    for partial in partials {
        combined.query_count += partial.query_count;
        combined.results_count += partial.results_count;
        combined.results.extend(partial.results);
    }

    Ok(combined)
}
