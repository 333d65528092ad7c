/// Decoded message trees: the "actual" side of a comparison.
///
/// A [`MessageNode`] is produced by a protocol codec before the comparison
/// engine ever sees it. The engine only borrows these trees; it never
/// mutates them.
use serde::{Deserialize, Serialize};

use crate::fields::Fields;
use crate::value::TypedValue;

/// A named, ordered collection of fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageNode {
    /// Message (or sub-message) type name, e.g. `"ExecutionReport"`.
    pub name: String,
    /// Identifier of the stored message this tree was decoded from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Fields in codec order.
    #[serde(default)]
    pub fields: Fields<FieldValue>,
}

/// The value stored under one field name.
///
/// A field key that is absent from [`MessageNode::fields`] and a key that is
/// present with [`FieldValue::Null`] are distinct states; the null-checking
/// matchers tell them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Key present, value explicitly null.
    Null,
    /// A single typed value.
    Scalar(TypedValue),
    /// A nested message owned by this field.
    Message(MessageNode),
    /// A repeating group, possibly empty.
    Group(Vec<Entry>),
}

/// One element of a repeating group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entry {
    /// A sub-message entry.
    Message(MessageNode),
    /// A scalar entry.
    Scalar(TypedValue),
}

impl MessageNode {
    /// Creates an empty message of the given type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            fields: Fields::new(),
        }
    }

    /// Sets the stored-message identifier.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Adds (or replaces) a field, builder style.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name, value.into());
        self
    }

    /// Adds (or replaces) a field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name, value.into());
    }

    /// Returns the field stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

impl FieldValue {
    /// Builds a group field from sub-messages.
    pub fn group_of_messages(entries: impl IntoIterator<Item = MessageNode>) -> Self {
        Self::Group(entries.into_iter().map(Entry::Message).collect())
    }

    /// Builds a group field from scalars.
    pub fn group_of_scalars<V: Into<TypedValue>>(entries: impl IntoIterator<Item = V>) -> Self {
        Self::Group(
            entries
                .into_iter()
                .map(|v| Entry::Scalar(v.into()))
                .collect(),
        )
    }

    /// Returns `true` unless this is [`FieldValue::Null`].
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Null)
    }

    /// Short human description used in result trees for container values.
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Scalar(v) => v.to_string(),
            Self::Message(m) => format!("message {}", m.name),
            Self::Group(entries) => describe_entries(entries.len()),
        }
    }
}

impl Entry {
    /// Converts the entry to the equivalent field value.
    pub fn as_field_value(&self) -> FieldValue {
        match self {
            Self::Message(m) => FieldValue::Message(m.clone()),
            Self::Scalar(v) => FieldValue::Scalar(v.clone()),
        }
    }
}

pub(crate) fn describe_entries(n: usize) -> String {
    if n == 1 {
        "1 entry".to_owned()
    } else {
        format!("{n} entries")
    }
}

macro_rules! scalar_field_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    Self::Scalar(TypedValue::from(v))
                }
            }
        )*
    };
}

scalar_field_from!(&str, String, i32, i64, f64, bool, char, rust_decimal::Decimal);

impl From<TypedValue> for FieldValue {
    fn from(v: TypedValue) -> Self {
        Self::Scalar(v)
    }
}

impl From<MessageNode> for FieldValue {
    fn from(m: MessageNode) -> Self {
        Self::Message(m)
    }
}
