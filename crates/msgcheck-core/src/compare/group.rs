//! Repeating-group comparison.
//!
//! Template entries are paired with actual entries either positionally
//! (`check_group_order`) or by best match:
//!
//! 1. Every (template, actual) pair is compared. Pairs rejected by a key
//!    field are discarded.
//! 2. Remaining pairs are taken greedily, ordered by fewest failed leaves,
//!    then most passed leaves, then template index, then actual index.
//! 3. A template entry that declares key fields and is left unpaired means
//!    the filter does not identify the message.
//!
//! Unpaired entries on either side are rendered with the verdict of the
//! unexpected-field policy. Under policy `A` an unpaired entry is judged by
//! its occurrence number: its index when pairing is positional, otherwise
//! the number of paired entries plus its rank among the unpaired ones. Children list template positions first, then
//! unexpected actual entries, named `"0"`, `"1"`, ... in that order.

use std::cmp::Reverse;

use tracing::{debug, trace};

use crate::filter::{FilterEntry, FilterNode, FilterValue};
use crate::message::Entry;
use crate::result::ComparisonResult;
use crate::settings::SettingsView;

use super::scalar::Observed;
use super::{NoMatch, Verdict, Walk, render, unpaired_status};

struct Candidate {
    template: usize,
    actual: usize,
    failed: usize,
    passed: usize,
    result: Option<ComparisonResult>,
}

impl Walk<'_> {
    /// Compares the group held by `field` of `message`.
    pub(super) fn group(
        &mut self,
        view: &SettingsView<'_>,
        message: &str,
        field: &str,
        actual: &[Entry],
        templates: &[FilterEntry],
    ) -> Verdict {
        let policy = view.unexpected_policy();
        let expected = view.expected_occurrences(field);

        let ordered = view.check_group_order();
        let mut paired: Vec<Option<ComparisonResult>> = vec![None; templates.len()];
        let mut used = vec![false; actual.len()];
        if ordered {
            for (j, (template, entry)) in templates.iter().zip(actual).enumerate() {
                paired[j] = Some(self.entry(view, message, field, j, Some(entry), template)?);
                used[j] = true;
            }
        } else {
            self.pair_best(view, message, field, actual, templates, &mut paired, &mut used);
        }

        // Unordered pairing ignores positions, so an unpaired entry counts as
        // the next occurrence after the paired ones.
        let paired_count = paired.iter().filter(|slot| slot.is_some()).count();
        let occurrence = |index: usize, rank: &mut usize| {
            if ordered {
                index
            } else {
                *rank += 1;
                paired_count + *rank - 1
            }
        };

        let mut children = Vec::with_capacity(templates.len().max(actual.len()));
        let mut missing_rank = 0;
        for (j, (slot, template)) in paired.into_iter().zip(templates).enumerate() {
            let child = match slot {
                Some(result) => result,
                None => {
                    if declares_keys(&view.element(field, j), template) {
                        debug!(
                            path = %self.path_string(),
                            entry = j,
                            "keyed group entry has no counterpart; filter does not identify the message"
                        );
                        return Err(NoMatch);
                    }
                    let status =
                        unpaired_status(policy, occurrence(j, &mut missing_rank), expected);
                    render::expected_entry(&j.to_string(), template, status)
                        .with_diagnostic("expected entry not found")
                }
            };
            children.push(child);
        }
        let mut extra_rank = 0;
        for (i, entry) in actual.iter().enumerate() {
            if used[i] {
                continue;
            }
            let status = unpaired_status(policy, occurrence(i, &mut extra_rank), expected);
            let name = children.len().to_string();
            children.push(render::actual_entry(&name, entry, status).with_diagnostic("unexpected entry"));
        }
        Ok(ComparisonResult::node(field, children))
    }

    /// Compares template entry `index` against an actual entry (or its
    /// absence) under the element's settings.
    fn entry(
        &mut self,
        view: &SettingsView<'_>,
        message: &str,
        field: &str,
        index: usize,
        actual: Option<&Entry>,
        template: &FilterEntry,
    ) -> Verdict {
        let element = view.element(field, index);
        let name = index.to_string();
        match template {
            FilterEntry::Message(node) => match actual {
                Some(Entry::Message(m)) => self.message(&element, &name, Some(m), node),
                None => self.message(&element, &name, None, node),
                Some(Entry::Scalar(v)) => Ok(self
                    .message(&element, &name, None, node)?
                    .with_diagnostic(format!("expected a message, found {v}"))),
            },
            FilterEntry::Matcher(matcher) => {
                let observed = Observed::from_entry(actual);
                Ok(self.leaf(&element, message, &name, field, &observed, matcher))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn pair_best(
        &mut self,
        view: &SettingsView<'_>,
        message: &str,
        field: &str,
        actual: &[Entry],
        templates: &[FilterEntry],
        paired: &mut [Option<ComparisonResult>],
        used: &mut [bool],
    ) {
        let mut candidates = Vec::with_capacity(templates.len() * actual.len());
        for (j, template) in templates.iter().enumerate() {
            for (i, entry) in actual.iter().enumerate() {
                match self.entry(view, message, field, j, Some(entry), template) {
                    Ok(result) => {
                        let tally = result.tally();
                        candidates.push(Candidate {
                            template: j,
                            actual: i,
                            failed: tally.failed,
                            passed: tally.passed,
                            result: Some(result),
                        });
                    }
                    Err(NoMatch) => {
                        trace!(field, template = j, actual = i, "candidate rejected by key fields");
                    }
                }
            }
        }

        candidates.sort_by_key(|c| (c.failed, Reverse(c.passed), c.template, c.actual));
        for candidate in &mut candidates {
            if paired[candidate.template].is_some() || used[candidate.actual] {
                continue;
            }
            trace!(
                field,
                template = candidate.template,
                actual = candidate.actual,
                failed = candidate.failed,
                passed = candidate.passed,
                "paired group entry"
            );
            used[candidate.actual] = true;
            paired[candidate.template] = candidate.result.take();
        }
    }
}

/// Returns `true` if `template`, or anything nested in it, declares key
/// fields under `view`.
fn declares_keys(view: &SettingsView<'_>, template: &FilterEntry) -> bool {
    match template {
        FilterEntry::Message(node) => node_declares_keys(view, node),
        FilterEntry::Matcher(_) => false,
    }
}

fn node_declares_keys(view: &SettingsView<'_>, node: &FilterNode) -> bool {
    node.fields.iter().any(|(field, value)| {
        if view.is_key_field(field) && !view.is_ignored(field) {
            return true;
        }
        match value {
            FilterValue::Matcher(_) => false,
            FilterValue::Message(sub) => node_declares_keys(&view.field(field), sub),
            FilterValue::Group(entries) => entries
                .iter()
                .enumerate()
                .any(|(j, entry)| declares_keys(&view.element(field, j), entry)),
        }
    })
}
