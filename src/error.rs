//! # Error Module
//!
//! Per-item error kinds surfaced during reconciliation. These are collected
//! and reported per key or per pair; they never abort a whole batch. Only
//! infrastructure failures from the external store readers are run-fatal,
//! and those never reach this crate.

use crate::mac::Mac;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A typed, per-item reconciliation error.
///
/// Serializable so skip reports can travel inside serialized change plans.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ReconcileError {
    /// A hardware identifier failed MAC normalization. The offending record
    /// is dropped by the store readers; the raw value is kept for reporting.
    #[error("malformed hardware identifier: {value:?}")]
    MalformedIdentifier { value: String },

    /// A bucket expected to hold a single record holds several. Comparison
    /// for the key is skipped, never resolved by picking an arbitrary entry.
    #[error("ambiguous key {key:?}: {count} records share it")]
    AmbiguousKey { key: String, count: usize },

    /// A matched pair disagrees on the hardware identifier across stores.
    /// The pair is excluded from planning rather than silently merged.
    #[error("mismatched MAC for {key:?}: primary {primary}, secondary {secondary}")]
    MismatchedCounterpart {
        key: String,
        primary: Mac,
        secondary: Mac,
    },

    /// An operation was invoked on an item missing its preconditions, e.g.
    /// history reconstruction with zero intervals or planning over a record
    /// without coordinates. Fatal for the item, not for the run.
    #[error("precondition violation for {key:?}: {detail}")]
    PreconditionViolation { key: String, detail: String },
}

impl ReconcileError {
    pub fn precondition(key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            key: key.into(),
            detail: detail.into(),
        }
    }
}
