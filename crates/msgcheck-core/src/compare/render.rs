//! Renders one side of an unpaired structure as a result subtree in which
//! every node carries the same verdict.

use crate::filter::{FieldMatcher, FilterEntry, FilterNode, FilterValue};
use crate::message::{Entry, FieldValue, MessageNode, describe_entries};
use crate::result::{ComparisonResult, ReportedValue, StatusType};

/// How a matcher is shown in the `expected` column.
pub(super) fn matcher_report(matcher: &FieldMatcher) -> ReportedValue {
    match matcher {
        FieldMatcher::Exact(v) => ReportedValue::Value(v.clone()),
        FieldMatcher::IsNull
        | FieldMatcher::IsNotNull
        | FieldMatcher::ConventionMissing
        | FieldMatcher::ConventionPresent
        | FieldMatcher::Predicate(_) => ReportedValue::Description(matcher.to_string()),
    }
}

fn container(
    name: &str,
    children: Vec<ComparisonResult>,
    status: StatusType,
    summary: String,
) -> ComparisonResult {
    let mut node = ComparisonResult::leaf(name, status);
    if children.is_empty() {
        node.actual = Some(ReportedValue::Description(summary));
    }
    node.children = children;
    node
}

/// Observed field value.
pub(super) fn actual_field(name: &str, value: &FieldValue, status: StatusType) -> ComparisonResult {
    match value {
        FieldValue::Null => ComparisonResult::leaf(name, status).with_actual(Some(ReportedValue::Null)),
        FieldValue::Scalar(v) => {
            ComparisonResult::leaf(name, status).with_actual(Some(ReportedValue::Value(v.clone())))
        }
        FieldValue::Message(m) => actual_message(name, m, status),
        FieldValue::Group(entries) => actual_group(name, entries, status),
    }
}

/// Observed group with every entry carrying `status`.
pub(super) fn actual_group(name: &str, entries: &[Entry], status: StatusType) -> ComparisonResult {
    let children = entries
        .iter()
        .enumerate()
        .map(|(i, e)| actual_entry(&i.to_string(), e, status))
        .collect();
    container(name, children, status, describe_entries(entries.len()))
}

/// Observed group entry.
pub(super) fn actual_entry(name: &str, entry: &Entry, status: StatusType) -> ComparisonResult {
    match entry {
        Entry::Message(m) => actual_message(name, m, status),
        Entry::Scalar(v) => {
            ComparisonResult::leaf(name, status).with_actual(Some(ReportedValue::Value(v.clone())))
        }
    }
}

fn actual_message(name: &str, message: &MessageNode, status: StatusType) -> ComparisonResult {
    let children = message
        .fields
        .iter()
        .map(|(field, value)| actual_field(field, value, status))
        .collect();
    container(name, children, status, format!("message {}", message.name))
}

/// Expected field with no observed counterpart.
pub(super) fn expected_field(
    name: &str,
    value: &FilterValue,
    status: StatusType,
) -> ComparisonResult {
    match value {
        FilterValue::Matcher(m) => {
            ComparisonResult::leaf(name, status).with_expected(Some(matcher_report(m)))
        }
        FilterValue::Message(node) => expected_message(name, node, status),
        FilterValue::Group(entries) => {
            let children: Vec<_> = entries
                .iter()
                .enumerate()
                .map(|(j, e)| expected_entry(&j.to_string(), e, status))
                .collect();
            let mut node = ComparisonResult::leaf(name, status);
            if children.is_empty() {
                node.expected = Some(ReportedValue::Description(describe_entries(0)));
            }
            node.children = children;
            node
        }
    }
}

/// Expected group entry with no observed counterpart.
pub(super) fn expected_entry(
    name: &str,
    entry: &FilterEntry,
    status: StatusType,
) -> ComparisonResult {
    match entry {
        FilterEntry::Message(node) => expected_message(name, node, status),
        FilterEntry::Matcher(m) => {
            ComparisonResult::leaf(name, status).with_expected(Some(matcher_report(m)))
        }
    }
}

fn expected_message(name: &str, node: &FilterNode, status: StatusType) -> ComparisonResult {
    let children: Vec<_> = node
        .fields
        .iter()
        .map(|(field, value)| expected_field(field, value, status))
        .collect();
    let mut result = ComparisonResult::leaf(name, status);
    if children.is_empty() {
        result.expected = Some(ReportedValue::Description(format!("message {}", node.name)));
    }
    result.children = children;
    result
}

/// An ignored field: both sides are recorded, nothing is asserted.
pub(super) fn ignored(
    name: &str,
    actual: Option<&FieldValue>,
    expected: &FilterValue,
) -> ComparisonResult {
    match (actual, expected) {
        (None, _) => expected_field(name, expected, StatusType::Na),
        (Some(value @ (FieldValue::Null | FieldValue::Scalar(_))), FilterValue::Matcher(m)) => {
            let mut leaf = actual_field(name, value, StatusType::Na);
            leaf.expected = Some(matcher_report(m));
            leaf
        }
        (Some(value), _) => actual_field(name, value, StatusType::Na),
    }
}
