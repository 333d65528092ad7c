//! Message-node comparison: key fields, expected fields, unexpected fields.

use tracing::debug;

use crate::filter::{FilterNode, FilterValue};
use crate::message::{FieldValue, MessageNode};
use crate::result::{ComparisonResult, StatusType};
use crate::settings::{SettingsView, UnexpectedPolicy};

use super::scalar::Observed;
use super::{NoMatch, Verdict, Walk, render, unpaired_status};

impl Walk<'_> {
    /// Compares a message, or its absence, against a template.
    ///
    /// Key fields are compared first; the first one that does not pass
    /// aborts the call. Children keep filter order, followed by the
    /// message's unexpected fields in message order.
    pub(super) fn message(
        &mut self,
        view: &SettingsView<'_>,
        name: &str,
        actual: Option<&MessageNode>,
        filter: &FilterNode,
    ) -> Verdict {
        let message_name = actual.map_or(filter.name.as_str(), |m| m.name.as_str());
        let lookup = |field: &str| actual.and_then(|m| m.get(field));

        let mut keyed: Vec<Option<ComparisonResult>> = vec![None; filter.fields.len()];
        for (idx, (field, expected)) in filter.fields.iter().enumerate() {
            if !view.is_key_field(field) || view.is_ignored(field) {
                continue;
            }
            let mut result = self.field(view, message_name, field, lookup(field), expected)?;
            result.is_key = true;
            if result.status != StatusType::Passed {
                debug!(
                    path = %self.path_string(),
                    key = field,
                    status = %result.status,
                    "key field mismatch; filter does not identify the message"
                );
                return Err(NoMatch);
            }
            keyed[idx] = Some(result);
        }

        let mut children = Vec::with_capacity(filter.fields.len());
        for ((field, expected), key_result) in filter.fields.iter().zip(keyed) {
            let result = match key_result {
                Some(result) => result,
                None => self.field(view, message_name, field, lookup(field), expected)?,
            };
            children.push(result);
        }

        if let Some(message) = actual {
            for (field, value) in message.fields.iter() {
                if !filter.fields.contains_key(field) {
                    children.push(self.unexpected_field(view, field, value));
                }
            }
        }

        let node = ComparisonResult::node(name, children);
        Ok(match actual {
            Some(_) => node,
            None => node.with_diagnostic("message is absent"),
        })
    }

    /// Compares one named field of a message.
    fn field(
        &mut self,
        view: &SettingsView<'_>,
        message: &str,
        field: &str,
        actual: Option<&FieldValue>,
        expected: &FilterValue,
    ) -> Verdict {
        self.within(field, |walk| {
            let mut result = walk.field_value(view, message, field, actual, expected)?;
            walk.annotate(&mut result);
            Ok(result)
        })
    }

    fn field_value(
        &mut self,
        view: &SettingsView<'_>,
        message: &str,
        field: &str,
        actual: Option<&FieldValue>,
        expected: &FilterValue,
    ) -> Verdict {
        if view.is_ignored(field) {
            return Ok(render::ignored(field, actual, expected));
        }
        match expected {
            FilterValue::Matcher(matcher) => {
                let observed = Observed::from_field(actual);
                Ok(self.leaf(view, message, field, field, &observed, matcher))
            }
            FilterValue::Message(template) => {
                let sub = view.field(field);
                match actual {
                    Some(FieldValue::Message(m)) => self.message(&sub, field, Some(m), template),
                    None | Some(FieldValue::Null) => self.message(&sub, field, None, template),
                    Some(other @ (FieldValue::Scalar(_) | FieldValue::Group(_))) => Ok(self
                        .message(&sub, field, None, template)?
                        .with_diagnostic(format!("expected a message, found {}", other.describe()))),
                }
            }
            FilterValue::Group(templates) => match actual {
                Some(FieldValue::Group(entries)) => {
                    self.group(view, message, field, entries, templates)
                }
                None | Some(FieldValue::Null) => self.group(view, message, field, &[], templates),
                Some(other @ (FieldValue::Scalar(_) | FieldValue::Message(_))) => Ok(self
                    .group(view, message, field, &[], templates)?
                    .with_diagnostic(format!("expected a group, found {}", other.describe()))),
            },
        }
    }

    /// Reports a message field the filter does not name.
    fn unexpected_field(
        &mut self,
        view: &SettingsView<'_>,
        field: &str,
        value: &FieldValue,
    ) -> ComparisonResult {
        self.within(field, |walk| {
            let mut result = if view.is_ignored(field) {
                render::actual_field(field, value, StatusType::Na)
            } else {
                let policy = view.unexpected_policy();
                match (policy, value) {
                    (UnexpectedPolicy::A, FieldValue::Group(entries)) => {
                        let expected = view.expected_occurrences(field);
                        let children = entries
                            .iter()
                            .enumerate()
                            .map(|(i, entry)| {
                                let status = unpaired_status(policy, i, expected);
                                render::actual_entry(&i.to_string(), entry, status)
                            })
                            .collect();
                        ComparisonResult::node(field, children)
                    }
                    _ => render::actual_field(field, value, unpaired_status(policy, 0, None)),
                }
            };
            if result.status == StatusType::Failed {
                result.diagnostic = Some("field not named in filter".to_owned());
                walk.annotate(&mut result);
            }
            result
        })
    }
}
