/// The verdict tree returned by a comparison.
///
/// Every compared field produces one [`ComparisonResult`] node. Scalar
/// comparisons are leaves; sub-messages and groups have children mirroring
/// the compared structure (group entries are named `"0"`, `"1"`, ...).
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::TypedValue;

/// Tri-state verdict of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusType {
    /// The field satisfied its expectation.
    Passed,
    /// The field violated its expectation.
    Failed,
    /// Nothing was asserted about the field.
    Na,
}

impl StatusType {
    /// Combines two sibling verdicts: `FAILED` dominates, and `NA` survives
    /// only when both sides are `NA`.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Failed, _) | (_, Self::Failed) => Self::Failed,
            (Self::Passed, _) | (_, Self::Passed) => Self::Passed,
            (Self::Na, Self::Na) => Self::Na,
        }
    }

    /// Folds a sequence of child verdicts. An empty sequence is `NA`.
    pub fn aggregate(statuses: impl IntoIterator<Item = Self>) -> Self {
        statuses.into_iter().fold(Self::Na, Self::combine)
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Na => "NA",
        })
    }
}

/// A value recorded on a result node for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReportedValue {
    /// The key was present with an explicit null.
    Null,
    /// A concrete scalar.
    Value(TypedValue),
    /// A textual stand-in: a container summary or a matcher description.
    Description(String),
}

impl fmt::Display for ReportedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Value(v) => write!(f, "{v}"),
            Self::Description(d) => f.write_str(d),
        }
    }
}

/// One node of the verdict tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Field name, or the entry index inside a group.
    pub name: String,
    /// Verdict of this node.
    pub status: StatusType,
    /// Observed value; `None` when the field was absent or for container
    /// nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<ReportedValue>,
    /// Expected value or matcher description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<ReportedValue>,
    /// Set on key fields and on sub-trees declared as a whole key.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_key: bool,
    /// Extra detail for failures the values alone do not explain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Description of a known bug this failure matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_bug: Option<String>,
    /// Identifier of the compared message; root node only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_message_id: Option<u64>,
    /// Child verdicts in comparison order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComparisonResult>,
}

/// Leaf counts per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusTally {
    /// Number of `PASSED` leaves.
    pub passed: usize,
    /// Number of `FAILED` leaves.
    pub failed: usize,
    /// Number of `NA` leaves.
    pub na: usize,
}

impl StatusTally {
    fn record(&mut self, status: StatusType) {
        match status {
            StatusType::Passed => self.passed += 1,
            StatusType::Failed => self.failed += 1,
            StatusType::Na => self.na += 1,
        }
    }
}

impl fmt::Display for StatusTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} n/a",
            self.passed, self.failed, self.na
        )
    }
}

impl ComparisonResult {
    /// Creates a leaf with the given verdict and no recorded values.
    pub fn leaf(name: impl Into<String>, status: StatusType) -> Self {
        Self {
            name: name.into(),
            status,
            actual: None,
            expected: None,
            is_key: false,
            diagnostic: None,
            known_bug: None,
            subject_message_id: None,
            children: Vec::new(),
        }
    }

    /// Creates a container node whose status aggregates `children`.
    pub fn node(name: impl Into<String>, children: Vec<ComparisonResult>) -> Self {
        let status = StatusType::aggregate(children.iter().map(|c| c.status));
        Self {
            children,
            ..Self::leaf(name, status)
        }
    }

    /// Sets the observed value.
    #[must_use]
    pub fn with_actual(mut self, actual: Option<ReportedValue>) -> Self {
        self.actual = actual;
        self
    }

    /// Sets the expected value.
    #[must_use]
    pub fn with_expected(mut self, expected: Option<ReportedValue>) -> Self {
        self.expected = expected;
        self
    }

    /// Attaches a diagnostic message.
    #[must_use]
    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    /// Returns `true` if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&ComparisonResult> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follows a sequence of child names from this node.
    pub fn path(&self, names: &[&str]) -> Option<&ComparisonResult> {
        names
            .iter()
            .try_fold(self, |node, name| node.child(name))
    }

    /// Pre-order, depth-first traversal over every node, starting with
    /// `self`.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Counts leaves by status.
    pub fn tally(&self) -> StatusTally {
        let mut tally = StatusTally::default();
        for node in self.iter().filter(|n| n.is_leaf()) {
            tally.record(node.status);
        }
        tally
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}: {}", "", self.name, self.status, indent = depth * 2)?;
        if self.is_key {
            f.write_str(" [key]")?;
        }
        if self.is_leaf() {
            let actual = self
                .actual
                .as_ref()
                .map_or_else(|| "<absent>".to_owned(), ToString::to_string);
            let expected = self
                .expected
                .as_ref()
                .map_or_else(|| "<none>".to_owned(), ToString::to_string);
            write!(f, " (actual: {actual}, expected: {expected})")?;
        }
        if let Some(diagnostic) = &self.diagnostic {
            write!(f, " -- {diagnostic}")?;
        }
        if let Some(bug) = &self.known_bug {
            write!(f, " [known bug: {bug}]")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl<'a> IntoIterator for &'a ComparisonResult {
    type Item = &'a ComparisonResult;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order iterator returned by [`ComparisonResult::iter`].
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a ComparisonResult>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ComparisonResult;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
