/// Insertion-ordered, unique-key field map.
///
/// Message and filter nodes keep their fields in the order the codec (or the
/// test author) produced them, and result trees are rendered in that order.
/// The map is a `Vec` of pairs with linear lookup.
///
/// Serialization uses a plain map (a JSON object), and deserialization keeps
/// the document order and rejects duplicate keys.
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An ordered mapping from field name to `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fields<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Fields<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Fields<T> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `name`.
    ///
    /// An existing entry keeps its position and has its value replaced; the
    /// previous value is returned.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((name, value));
        None
    }

    /// Returns the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value stored under `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Returns `true` if `name` is present (with any value).
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes and returns the value under `name`, shifting later entries.
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Fields<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl<T: Serialize> Serialize for Fields<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            m.serialize_entry(k, v)?;
        }
        m.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Fields<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FieldsVisitor(PhantomData))
    }
}

struct FieldsVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for FieldsVisitor<T> {
    type Value = Fields<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of field names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Fields<T>, A::Error> {
        let mut fields = Fields::new();
        while let Some((key, value)) = map.next_entry::<String, T>()? {
            if fields.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate field `{key}`")));
            }
            fields.entries.push((key, value));
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn insert_keeps_first_position() {
        let mut f = Fields::new();
        f.insert("b", 1);
        f.insert("a", 2);
        assert_eq!(f.insert("b", 3), Some(1));
        let names: Vec<&str> = f.names().collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(f.get("b"), Some(&3));
    }

    #[test]
    fn remove_shifts_later_entries() {
        let mut f: Fields<i32> = [("x", 1), ("y", 2), ("z", 3)].into_iter().collect();
        assert_eq!(f.remove("y"), Some(2));
        assert_eq!(f.names().collect::<Vec<_>>(), ["x", "z"]);
        assert_eq!(f.remove("missing"), None);
    }

    #[test]
    fn deserialize_preserves_document_order() {
        let f: Fields<i32> =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).expect("deserialize");
        assert_eq!(f.names().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
        let json = serde_json::to_string(&f).expect("serialize");
        assert_eq!(json, r#"{"zeta":1,"alpha":2,"mid":3}"#);
    }

    #[test]
    fn deserialize_rejects_duplicates() {
        let err = serde_json::from_str::<Fields<i32>>(r#"{"a": 1, "a": 2}"#)
            .expect_err("duplicate must fail");
        assert!(err.to_string().contains("duplicate field `a`"), "{err}");
    }
}
