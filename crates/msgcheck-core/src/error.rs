/// Errors raised at the comparison boundary.
///
/// Field-level disagreements are never errors: they are reported as
/// `FAILED`/`NA` nodes in the result tree, and a key-field mismatch is the
/// `Ok(None)` no-match outcome. [`CompareError`] covers only misuse of the
/// engine that is detected before any comparison runs.
use thiserror::Error;

/// A programming-contract violation detected at the call boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompareError {
    /// Enum translation was requested but no dictionary was supplied.
    #[error("settings request enum translation but no dictionary was supplied")]
    MissingDictionary,
    /// A tolerance table entry is negative, infinite or NaN.
    #[error("{table} tolerance for field `{field}` must be a finite non-negative number, got {value}")]
    InvalidTolerance {
        /// Field the tolerance is declared for.
        field: String,
        /// Which table holds the entry (`"double"` or `"system"`).
        table: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A known-bug description has no field path to attach to.
    #[error("known bug `{description}` has an empty field path")]
    EmptyKnownBugPath {
        /// Description of the offending entry.
        description: String,
    },
}
