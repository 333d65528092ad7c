/// Enum alias translation applied to scalar values before comparison.
///
/// Codecs deliver enum fields as raw codes (`"1"`, `'B'`); test authors often
/// write the alias (`"Buy"`). When [`ComparatorSettings::translate_enums`]
/// is set, both sides of an exact comparison are replaced by their alias
/// before the values are compared.
///
/// [`ComparatorSettings::translate_enums`]: crate::ComparatorSettings::translate_enums
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::TypedValue;

/// Source of enum aliases.
pub trait EnumDictionary {
    /// Returns the alias of `value` for `field` of message type `message`,
    /// or `None` if the value is not an enum code.
    fn alias(&self, message: &str, field: &str, value: &TypedValue) -> Option<String>;
}

/// In-memory dictionary keyed by field name and raw value text.
///
/// Message type names are not consulted: a field carries the same enum
/// wherever it appears. Deserializes from `{"Side": {"1": "Buy"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapDictionary {
    fields: BTreeMap<String, BTreeMap<String, String>>,
}

impl MapDictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `alias` for the raw `value` of `field`.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        alias: impl Into<String>,
    ) {
        self.fields
            .entry(field.into())
            .or_default()
            .insert(value.into(), alias.into());
    }

    /// Builder form of [`MapDictionary::insert`].
    #[must_use]
    pub fn with(
        mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        self.insert(field, value, alias);
        self
    }

    /// Returns `true` if no aliases are registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl EnumDictionary for MapDictionary {
    fn alias(&self, _message: &str, field: &str, value: &TypedValue) -> Option<String> {
        self.fields.get(field)?.get(&value.to_text()).cloned()
    }
}

/// Replaces `value` by its alias when one exists.
pub(crate) fn translate(
    dictionary: &dyn EnumDictionary,
    message: &str,
    field: &str,
    value: &TypedValue,
) -> TypedValue {
    dictionary
        .alias(message, field, value)
        .map_or_else(|| value.clone(), TypedValue::String)
}
