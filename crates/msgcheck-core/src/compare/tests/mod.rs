#![allow(clippy::expect_used)]

mod scalar_tests;

use crate::filter::{FilterNode, FilterValue};
use crate::message::{FieldValue, MessageNode};
use crate::result::{ComparisonResult, StatusType};
use crate::settings::ComparatorSettings;

use super::compare;

/// Runs a comparison that is expected to produce a tree.
pub(crate) fn run(
    actual: &MessageNode,
    filter: &FilterNode,
    settings: &ComparatorSettings,
) -> ComparisonResult {
    compare(actual, filter, settings)
        .expect("settings are valid")
        .expect("filter should identify the message")
}

/// Returns `true` when the comparison yields the no-match outcome.
pub(crate) fn is_no_match(
    actual: &MessageNode,
    filter: &FilterNode,
    settings: &ComparatorSettings,
) -> bool {
    compare(actual, filter, settings)
        .expect("settings are valid")
        .is_none()
}

/// Leaf counts as `(passed, failed, na)`.
pub(crate) fn counts(result: &ComparisonResult) -> (usize, usize, usize) {
    let t = result.tally();
    (t.passed, t.failed, t.na)
}

/// Status of the node at `path`.
pub(crate) fn status_at(result: &ComparisonResult, path: &[&str]) -> StatusType {
    result.path(path).expect("node exists at path").status
}

/// A message whose fields are all `i32` scalars.
pub(crate) fn int_message(name: &str, fields: &[(&str, i32)]) -> MessageNode {
    fields
        .iter()
        .fold(MessageNode::new(name), |m, (f, v)| m.with_field(*f, *v))
}

/// A template whose fields are all exact `i32` matchers.
pub(crate) fn int_filter(name: &str, fields: &[(&str, i32)]) -> FilterNode {
    fields
        .iter()
        .fold(FilterNode::new(name), |f, (k, v)| f.with_field(*k, *v))
}

pub(crate) fn message_group(entries: Vec<MessageNode>) -> FieldValue {
    FieldValue::group_of_messages(entries)
}

pub(crate) fn filter_group(entries: Vec<FilterNode>) -> FilterValue {
    FilterValue::group_of_messages(entries)
}
