/// Comparison settings and the per-path view handed down the recursion.
///
/// [`ComparatorSettings`] holds the global switches (ignored and unchecked
/// field names, polarity overrides, enum translation) plus a tree of
/// [`FieldSettings`] overrides rooted at the compared message. A field's
/// override list holds one entry per group element; element `n` uses entry
/// `n`, and the last entry is reused once the list is exhausted. A
/// sub-message field uses its first entry.
///
/// The engine never reads the tree directly. It walks a [`SettingsView`],
/// which resolves inherited values (unexpected policy, group-order flag,
/// tolerance tables) against the chain of views above it.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompareError;

/// Treatment of entries and fields present on only one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnexpectedPolicy {
    /// Unpaired entries are reported as `NA`.
    #[default]
    #[serde(rename = "N", alias = "n", alias = "")]
    N,
    /// Unpaired entries are reported as `FAILED`.
    #[serde(rename = "Y", alias = "y")]
    Y,
    /// Unpaired entries are `NA` within the declared expected-occurrence
    /// count and `FAILED` beyond it.
    #[serde(rename = "A", alias = "a")]
    A,
}

/// Error returned when parsing an [`UnexpectedPolicy`] token fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected-field policy must be one of N, Y, A; got `{0}`")]
pub struct ParsePolicyError(String);

impl FromStr for UnexpectedPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "N" | "n" => Ok(Self::N),
            "Y" | "y" => Ok(Self::Y),
            "A" | "a" => Ok(Self::A),
            other => Err(ParsePolicyError(other.to_owned())),
        }
    }
}

impl fmt::Display for UnexpectedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::N => "N",
            Self::Y => "Y",
            Self::A => "A",
        })
    }
}

/// Top-level settings for one comparison call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparatorSettings {
    /// Overrides applying to the root message.
    pub root: FieldSettings,
    /// Default for positional group pairing when no override sets it.
    pub check_group_order: bool,
    /// Field names reported `NA` wherever they occur.
    pub ignored_fields: BTreeSet<String>,
    /// Field names reported `NA` wherever they occur (header and trailer
    /// bookkeeping such as sequence numbers and checksums).
    pub unchecked_fields: BTreeSet<String>,
    /// Field names whose exact-equality outcome is inverted when `true`.
    pub negative_overrides: BTreeMap<String, bool>,
    /// Translate enum codes to aliases through the dictionary before
    /// comparing.
    pub translate_enums: bool,
}

/// One node of the per-path override tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSettings {
    /// Identity fields of the message at this position. Not inherited.
    pub key_fields: BTreeSet<String>,
    /// Unexpected-field policy; inherited when unset.
    pub unexpected: Option<UnexpectedPolicy>,
    /// Positional group pairing; inherited when unset.
    pub check_group_order: Option<bool>,
    /// Absolute tolerances keyed by bare field name; merged with the
    /// inherited table entry by entry.
    pub system_tolerance: BTreeMap<String, f64>,
    /// Second, independent tolerance table with the same lookup rules.
    pub double_tolerance: BTreeMap<String, f64>,
    /// Expected number of occurrences when this entry describes a group
    /// element. Defaults to the number of element overrides.
    pub expected_occurrences: Option<usize>,
    /// Overrides for nested fields, one per group element.
    pub children: BTreeMap<String, Vec<FieldSettings>>,
}

impl ComparatorSettings {
    /// Creates default settings: policy `N`, unordered groups, no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the root overrides.
    #[must_use]
    pub fn with_root(mut self, root: FieldSettings) -> Self {
        self.root = root;
        self
    }

    /// Sets the global group-order default.
    #[must_use]
    pub fn with_check_group_order(mut self, ordered: bool) -> Self {
        self.check_group_order = ordered;
        self
    }

    /// Adds a field name to the ignored set.
    #[must_use]
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored_fields.insert(name.into());
        self
    }

    /// Adds a field name to the unchecked set.
    #[must_use]
    pub fn uncheck(mut self, name: impl Into<String>) -> Self {
        self.unchecked_fields.insert(name.into());
        self
    }

    /// Sets the polarity override for a field name.
    #[must_use]
    pub fn with_negative(mut self, name: impl Into<String>, negative: bool) -> Self {
        self.negative_overrides.insert(name.into(), negative);
        self
    }

    /// Enables or disables enum translation.
    #[must_use]
    pub fn with_translate_enums(mut self, translate: bool) -> Self {
        self.translate_enums = translate;
        self
    }

    /// Returns the view for the root message.
    pub fn view(&self) -> SettingsView<'_> {
        SettingsView::root(self)
    }

    /// Checks the programming-contract rules.
    ///
    /// # Errors
    ///
    /// [`CompareError::MissingDictionary`] if `translate_enums` is set and
    /// `has_dictionary` is false; [`CompareError::InvalidTolerance`] for the
    /// first tolerance that is negative or not finite.
    pub fn validate(&self, has_dictionary: bool) -> Result<(), CompareError> {
        if self.translate_enums && !has_dictionary {
            return Err(CompareError::MissingDictionary);
        }
        self.root.validate()
    }
}

impl FieldSettings {
    /// Creates an empty override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key fields of the message at this position.
    #[must_use]
    pub fn with_key_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the unexpected-field policy.
    #[must_use]
    pub fn with_unexpected(mut self, policy: UnexpectedPolicy) -> Self {
        self.unexpected = Some(policy);
        self
    }

    /// Sets the group-order flag.
    #[must_use]
    pub fn with_check_group_order(mut self, ordered: bool) -> Self {
        self.check_group_order = Some(ordered);
        self
    }

    /// Adds a system tolerance entry.
    #[must_use]
    pub fn with_system_tolerance(mut self, field: impl Into<String>, tolerance: f64) -> Self {
        self.system_tolerance.insert(field.into(), tolerance);
        self
    }

    /// Adds a double tolerance entry.
    #[must_use]
    pub fn with_double_tolerance(mut self, field: impl Into<String>, tolerance: f64) -> Self {
        self.double_tolerance.insert(field.into(), tolerance);
        self
    }

    /// Sets the expected occurrence count.
    #[must_use]
    pub fn with_expected_occurrences(mut self, count: usize) -> Self {
        self.expected_occurrences = Some(count);
        self
    }

    /// Appends an override for the next element of `field`.
    #[must_use]
    pub fn with_child(mut self, field: impl Into<String>, child: FieldSettings) -> Self {
        self.children.entry(field.into()).or_default().push(child);
        self
    }

    fn validate(&self) -> Result<(), CompareError> {
        for (table, entries) in [
            ("system", &self.system_tolerance),
            ("double", &self.double_tolerance),
        ] {
            for (field, &value) in entries {
                if !value.is_finite() || value < 0.0 {
                    return Err(CompareError::InvalidTolerance {
                        field: field.clone(),
                        table,
                        value,
                    });
                }
            }
        }
        self.children
            .values()
            .flatten()
            .try_for_each(FieldSettings::validate)
    }
}

/// Resolved settings at one position of the compared tree.
///
/// Views are cheap to copy and borrow their parent, so descending never
/// allocates and never mutates the underlying settings.
#[derive(Debug, Clone, Copy)]
pub struct SettingsView<'a> {
    global: &'a ComparatorSettings,
    node: Option<&'a FieldSettings>,
    parent: Option<&'a SettingsView<'a>>,
}

impl<'a> SettingsView<'a> {
    /// Returns the view for the root message.
    pub fn root(settings: &'a ComparatorSettings) -> Self {
        Self {
            global: settings,
            node: Some(&settings.root),
            parent: None,
        }
    }

    /// Descends into the sub-message held by `field`.
    pub fn field<'b>(&'b self, field: &str) -> SettingsView<'b> {
        self.element(field, 0)
    }

    /// Descends into element `index` of the group held by `field`.
    pub fn element<'b>(&'b self, field: &str, index: usize) -> SettingsView<'b> {
        let node = self
            .overrides(field)
            .and_then(|list| list.get(index).or_else(|| list.last()));
        SettingsView {
            global: self.global,
            node,
            parent: Some(self),
        }
    }

    /// Returns `true` if `field` is a key field of the message at this view.
    pub fn is_key_field(&self, field: &str) -> bool {
        self.node.is_some_and(|n| n.key_fields.contains(field))
    }

    /// Effective unexpected-field policy.
    pub fn unexpected_policy(&self) -> UnexpectedPolicy {
        match (self.node.and_then(|n| n.unexpected), self.parent) {
            (Some(policy), _) => policy,
            (None, Some(parent)) => parent.unexpected_policy(),
            (None, None) => UnexpectedPolicy::default(),
        }
    }

    /// Effective group-order flag.
    pub fn check_group_order(&self) -> bool {
        match (self.node.and_then(|n| n.check_group_order), self.parent) {
            (Some(ordered), _) => ordered,
            (None, Some(parent)) => parent.check_group_order(),
            (None, None) => self.global.check_group_order,
        }
    }

    /// Effective system tolerance for a bare field name.
    pub fn system_tolerance(&self, field: &str) -> Option<f64> {
        self.tolerance(field, |n| &n.system_tolerance)
    }

    /// Effective double tolerance for a bare field name.
    pub fn double_tolerance(&self, field: &str) -> Option<f64> {
        self.tolerance(field, |n| &n.double_tolerance)
    }

    /// Expected number of occurrences of the group held by `field`.
    ///
    /// An explicit count on any element override wins; otherwise the number
    /// of element overrides is used. `None` when nothing is declared.
    pub fn expected_occurrences(&self, field: &str) -> Option<usize> {
        let list = self.overrides(field).filter(|list| !list.is_empty())?;
        list.iter()
            .find_map(|o| o.expected_occurrences)
            .or(Some(list.len()))
    }

    /// Returns `true` if `field` is reported `NA` wherever it occurs.
    pub fn is_ignored(&self, field: &str) -> bool {
        self.global.ignored_fields.contains(field) || self.global.unchecked_fields.contains(field)
    }

    /// Returns `true` if `field`'s exact-equality outcome is inverted.
    pub fn is_negative(&self, field: &str) -> bool {
        self.global
            .negative_overrides
            .get(field)
            .copied()
            .unwrap_or(false)
    }

    fn overrides(&self, field: &str) -> Option<&'a Vec<FieldSettings>> {
        self.node.and_then(|n| n.children.get(field))
    }

    fn tolerance(
        &self,
        field: &str,
        table: fn(&FieldSettings) -> &BTreeMap<String, f64>,
    ) -> Option<f64> {
        self.node
            .and_then(|n| table(n).get(field).copied())
            .or_else(|| self.parent.and_then(|p| p.tolerance(field, table)))
    }
}
