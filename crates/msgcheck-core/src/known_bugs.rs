/// Known-bug annotations on failed fields.
///
/// A [`KnownBug`] names a field path and, optionally, the value the buggy
/// system is known to produce there. Matching `FAILED` nodes are tagged with
/// the bug's description so reports can separate reproduced known issues
/// from new failures. Verdicts are left unchanged.
use serde::{Deserialize, Serialize};

use crate::error::CompareError;
use crate::result::ReportedValue;
use crate::value::TypedValue;

/// An acceptable failure scoped to a field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnownBug {
    /// Free-form description copied into matching result nodes.
    pub description: String,
    /// Field names from the root message; group indices are omitted.
    pub path: Vec<String>,
    /// Observed value the bug produces; any value matches when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<TypedValue>,
}

impl KnownBug {
    /// Creates a known bug for `path`.
    pub fn new<I, S>(description: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            description: description.into(),
            path: path.into_iter().map(Into::into).collect(),
            actual: None,
        }
    }

    /// Restricts the bug to a specific observed value.
    #[must_use]
    pub fn with_actual(mut self, actual: impl Into<TypedValue>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    /// Returns `true` if a failure at `path` with `actual` matches this bug.
    pub fn matches(&self, path: &[String], actual: Option<&ReportedValue>) -> bool {
        if self.path != path {
            return false;
        }
        match (&self.actual, actual) {
            (None, _) => true,
            (Some(expected), Some(ReportedValue::Value(observed))) => {
                observed.loosely_equals(expected)
            }
            (Some(_), Some(ReportedValue::Null | ReportedValue::Description(_)) | None) => false,
        }
    }
}

/// Rejects entries that could never match a field.
pub(crate) fn validate(bugs: &[KnownBug]) -> Result<(), CompareError> {
    match bugs.iter().find(|b| b.path.is_empty()) {
        Some(bug) => Err(CompareError::EmptyKnownBugPath {
            description: bug.description.clone(),
        }),
        None => Ok(()),
    }
}

/// Returns the first bug matching a failure at `path`.
pub(crate) fn find<'a>(
    bugs: &'a [KnownBug],
    path: &[String],
    actual: Option<&ReportedValue>,
) -> Option<&'a KnownBug> {
    bugs.iter().find(|b| b.matches(path, actual))
}
