/// Expected-side templates: the "filter" a message is checked against.
///
/// A [`FilterNode`] mirrors the shape of a [`MessageNode`](crate::MessageNode)
/// but its leaves are [`FieldMatcher`]s. Container positions either hold a
/// nested template or a presence matcher that asserts the whole container is
/// absent or present.
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::fields::Fields;
use crate::value::TypedValue;

/// Fully-qualified prefix of the textual convention tokens.
const CONVENTION_PREFIX: &str = "Convention.";
/// Token meaning "the field must not be materially present".
pub const CONV_MISSED_OBJECT: &str = "CONV_MISSED_OBJECT";
/// Token meaning "the field must be materially present".
pub const CONV_PRESENT_OBJECT: &str = "CONV_PRESENT_OBJECT";

/// A template node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterNode {
    /// Expected message type name.
    pub name: String,
    /// Expected fields in authoring order.
    #[serde(default)]
    pub fields: Fields<FilterValue>,
}

/// What a template expects at one field position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// A leaf predicate, or a presence check on a container.
    Matcher(FieldMatcher),
    /// A nested template for a sub-message.
    Message(FilterNode),
    /// One template per expected group entry.
    Group(Vec<FilterEntry>),
}

/// One expected element of a repeating group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterEntry {
    /// Template for a sub-message entry.
    Message(FilterNode),
    /// Matcher for a scalar entry.
    Matcher(FieldMatcher),
}

/// A leaf predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg", rename_all = "snake_case")]
pub enum FieldMatcher {
    /// Value must equal this one (subject to tolerance and polarity rules).
    Exact(TypedValue),
    /// Key must be present with an explicit null value.
    IsNull,
    /// Key must be present with a non-null value.
    IsNotNull,
    /// Textual convention: the field must not be materially present.
    ConventionMissing,
    /// Textual convention: the field must be materially present.
    ConventionPresent,
    /// Value must satisfy a rule.
    Predicate(PredicateRule),
}

/// Rule evaluated by [`FieldMatcher::Predicate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "arg", rename_all = "snake_case")]
pub enum PredicateRule {
    /// Text form of the value must match this regular expression.
    Regex(Pattern),
    /// Numeric value must lie within the inclusive bounds.
    Range {
        /// Lower bound, if any.
        #[serde(default)]
        min: Option<TypedValue>,
        /// Upper bound, if any.
        #[serde(default)]
        max: Option<TypedValue>,
    },
    /// Value must equal one of these.
    OneOf(Vec<TypedValue>),
    /// Value must be present and differ from this one.
    NotEqual(TypedValue),
    /// Programmatic rule; cannot be serialized.
    #[serde(skip)]
    Custom(CustomPredicate),
}

/// A regular expression compiled on first use and cached with the rule.
///
/// Serializes as its source text. Equality compares the source only.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Pattern {
    source: String,
    compiled: OnceLock<Result<Regex, String>>,
}

impl Pattern {
    /// Wraps `source` without compiling it.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: OnceLock::new(),
        }
    }

    /// The compiled expression, or a diagnostic for an invalid pattern.
    fn regex(&self) -> Result<&Regex, String> {
        self.compiled
            .get_or_init(|| {
                Regex::new(&self.source)
                    .map_err(|e| format!("invalid pattern /{}/: {e}", self.source))
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Signature of a programmatic predicate. Receives `None` when the field is
/// absent or null.
pub type PredicateFn = dyn Fn(Option<&TypedValue>) -> bool + Send + Sync;

/// A named closure used as a filter rule.
#[derive(Clone)]
pub struct CustomPredicate {
    name: String,
    check: Arc<PredicateFn>,
}

impl CustomPredicate {
    /// Wraps `check` under a display `name`.
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(Option<&TypedValue>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Display name of the rule.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPredicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.check, &other.check)
    }
}

impl PredicateRule {
    /// Evaluates the rule against an observed value.
    ///
    /// `Err` carries a diagnostic for a malformed rule (bad pattern, a range
    /// applied to a non-numeric value); the caller reports it as a failure
    /// of this one field.
    pub fn evaluate(&self, actual: Option<&TypedValue>) -> Result<bool, String> {
        match self {
            Self::Custom(custom) => Ok((custom.check)(actual)),
            Self::Regex(pattern) => {
                let re = pattern.regex()?;
                Ok(actual.is_some_and(|v| re.is_match(&v.to_text())))
            }
            Self::Range { min, max } => {
                let Some(value) = actual else {
                    return Ok(false);
                };
                let Some(n) = value.as_numeric() else {
                    return Err(format!(
                        "range rule applied to non-numeric {} value",
                        value.type_name()
                    ));
                };
                for (bound, is_lower) in [(min, true), (max, false)] {
                    let Some(bound) = bound else { continue };
                    let Some(b) = bound.as_numeric() else {
                        return Err(format!("range bound {bound} is not numeric"));
                    };
                    let ok = match n.compare(b) {
                        Some(std::cmp::Ordering::Less) => !is_lower,
                        Some(std::cmp::Ordering::Greater) => is_lower,
                        Some(std::cmp::Ordering::Equal) => true,
                        None => false,
                    };
                    if !ok {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::OneOf(values) => {
                Ok(actual.is_some_and(|v| values.iter().any(|e| v.loosely_equals(e))))
            }
            Self::NotEqual(expected) => Ok(actual.is_some_and(|v| !v.loosely_equals(expected))),
        }
    }
}

impl fmt::Display for PredicateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(p) => write!(f, "matches /{p}/"),
            Self::Range { min, max } => {
                let lo = min.as_ref().map_or_else(|| "-inf".to_owned(), ToString::to_string);
                let hi = max.as_ref().map_or_else(|| "+inf".to_owned(), ToString::to_string);
                write!(f, "in [{lo}, {hi}]")
            }
            Self::OneOf(values) => {
                let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "one of [{}]", parts.join(", "))
            }
            Self::NotEqual(v) => write!(f, "!= {v}"),
            Self::Custom(c) => write!(f, "custom `{}`", c.name),
        }
    }
}

impl FieldMatcher {
    /// Recognises a textual convention token.
    ///
    /// Accepts `CONV_MISSED_OBJECT` / `CONV_PRESENT_OBJECT`, optionally
    /// qualified (`some.package.Convention.CONV_MISSED_OBJECT`), and the
    /// enum-style forms `<Enum>.Missed` / `<Enum>.Present`.
    pub fn from_convention_token(token: &str) -> Option<Self> {
        let token = token.trim();
        let bare = token
            .rfind(CONVENTION_PREFIX)
            .map_or(token, |idx| &token[idx + CONVENTION_PREFIX.len()..]);
        match bare {
            CONV_MISSED_OBJECT => return Some(Self::ConventionMissing),
            CONV_PRESENT_OBJECT => return Some(Self::ConventionPresent),
            _ => {}
        }
        let (_, suffix) = token.rsplit_once('.')?;
        match suffix {
            "Missed" => Some(Self::ConventionMissing),
            "Present" => Some(Self::ConventionPresent),
            _ => None,
        }
    }

    /// Interprets authored text: a convention token, otherwise an exact
    /// string match.
    pub fn from_text(text: &str) -> Self {
        Self::from_convention_token(text).unwrap_or_else(|| Self::Exact(TypedValue::from(text)))
    }
}

impl fmt::Display for FieldMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::IsNull => f.write_str("is null"),
            Self::IsNotNull => f.write_str("is not null"),
            Self::ConventionMissing => f.write_str("missed (convention)"),
            Self::ConventionPresent => f.write_str("present (convention)"),
            Self::Predicate(rule) => write!(f, "{rule}"),
        }
    }
}

impl FilterNode {
    /// Creates an empty template for the given message type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Fields::new(),
        }
    }

    /// Adds (or replaces) an expected field, builder style.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.fields.insert(name, value.into());
        self
    }

    /// Adds (or replaces) an expected field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FilterValue>) {
        self.fields.insert(name, value.into());
    }

    /// Returns the expectation stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.fields.get(name)
    }

    /// Returns a mutable reference to the expectation under `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FilterValue> {
        self.fields.get_mut(name)
    }
}

impl FilterValue {
    /// Shorthand for an exact-value leaf.
    pub fn exact(v: impl Into<TypedValue>) -> Self {
        Self::Matcher(FieldMatcher::Exact(v.into()))
    }

    /// Builds a group expectation from sub-message templates.
    pub fn group_of_messages(entries: impl IntoIterator<Item = FilterNode>) -> Self {
        Self::Group(entries.into_iter().map(FilterEntry::Message).collect())
    }

    /// Builds a group expectation of exact scalars.
    pub fn group_of_scalars<V: Into<TypedValue>>(entries: impl IntoIterator<Item = V>) -> Self {
        Self::Group(
            entries
                .into_iter()
                .map(|v| FilterEntry::Matcher(FieldMatcher::Exact(v.into())))
                .collect(),
        )
    }
}

impl From<FieldMatcher> for FilterValue {
    fn from(m: FieldMatcher) -> Self {
        Self::Matcher(m)
    }
}

impl From<FilterNode> for FilterValue {
    fn from(node: FilterNode) -> Self {
        Self::Message(node)
    }
}

impl From<TypedValue> for FilterValue {
    fn from(v: TypedValue) -> Self {
        Self::exact(v)
    }
}

macro_rules! exact_filter_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for FilterValue {
                fn from(v: $t) -> Self {
                    Self::exact(v)
                }
            }
        )*
    };
}

exact_filter_from!(&str, String, i32, i64, f64, bool, char, rust_decimal::Decimal);

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn convention_tokens() {
        assert_eq!(
            FieldMatcher::from_convention_token("CONV_MISSED_OBJECT"),
            Some(FieldMatcher::ConventionMissing)
        );
        assert_eq!(
            FieldMatcher::from_convention_token("matching.Convention.CONV_PRESENT_OBJECT"),
            Some(FieldMatcher::ConventionPresent)
        );
        assert_eq!(
            FieldMatcher::from_convention_token("OrderStatus.Present"),
            Some(FieldMatcher::ConventionPresent)
        );
        assert_eq!(
            FieldMatcher::from_convention_token("AutoInactivateOnDisconnect.Missed"),
            Some(FieldMatcher::ConventionMissing)
        );
        assert_eq!(FieldMatcher::from_convention_token("Side.Buy"), None);
        assert_eq!(FieldMatcher::from_convention_token("plain"), None);
    }

    #[test]
    fn from_text_falls_back_to_exact() {
        assert_eq!(
            FieldMatcher::from_text("Side.Buy"),
            FieldMatcher::Exact(TypedValue::from("Side.Buy"))
        );
    }

    #[test]
    fn regex_rule() {
        let rule = PredicateRule::Regex("^TCI".into());
        assert_eq!(rule.evaluate(Some(&TypedValue::from("TCI-1"))), Ok(true));
        assert_eq!(rule.evaluate(Some(&TypedValue::from("XTCI"))), Ok(false));
        assert_eq!(rule.evaluate(None), Ok(false));
    }

    #[test]
    fn pattern_is_compiled_once() {
        let pattern = Pattern::new("^[A-Z]{3}$");
        let first = pattern.regex().expect("valid pattern");
        let second = pattern.regex().expect("valid pattern");
        assert!(std::ptr::eq(first, second));

        let rule = PredicateRule::Regex(pattern);
        for text in ["ABC", "abc", "ABCD"] {
            assert_eq!(
                rule.evaluate(Some(&TypedValue::from(text))),
                Ok(text == "ABC"),
                "{text}"
            );
        }
    }

    #[test]
    fn pattern_serializes_as_its_source() {
        let rule = PredicateRule::Regex("^TCI".into());
        let json = serde_json::to_string(&rule).expect("serialize");
        assert_eq!(json, r#"{"rule":"regex","arg":"^TCI"}"#);
        let back: PredicateRule = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, rule);
    }

    #[test]
    fn bad_regex_is_a_diagnostic() {
        let rule = PredicateRule::Regex("(".into());
        let err = rule
            .evaluate(Some(&TypedValue::from("x")))
            .expect_err("pattern is malformed");
        assert!(err.contains("invalid pattern"), "{err}");
    }

    #[test]
    fn range_rule_is_inclusive() {
        let rule = PredicateRule::Range {
            min: Some(TypedValue::Int(1)),
            max: Some(TypedValue::Double(2.5)),
        };
        assert_eq!(rule.evaluate(Some(&TypedValue::Long(1))), Ok(true));
        assert_eq!(rule.evaluate(Some(&TypedValue::Double(2.5))), Ok(true));
        assert_eq!(rule.evaluate(Some(&TypedValue::Int(3))), Ok(false));
        assert_eq!(rule.evaluate(Some(&TypedValue::Int(0))), Ok(false));
        assert!(rule.evaluate(Some(&TypedValue::from("x"))).is_err());
    }

    #[test]
    fn one_of_and_not_equal() {
        let one_of = PredicateRule::OneOf(vec![TypedValue::Int(1), TypedValue::Int(2)]);
        assert_eq!(one_of.evaluate(Some(&TypedValue::Long(2))), Ok(true));
        assert_eq!(one_of.evaluate(Some(&TypedValue::Long(3))), Ok(false));
        let ne = PredicateRule::NotEqual(TypedValue::from("A"));
        assert_eq!(ne.evaluate(Some(&TypedValue::from("B"))), Ok(true));
        assert_eq!(ne.evaluate(Some(&TypedValue::from("A"))), Ok(false));
        assert_eq!(ne.evaluate(None), Ok(false));
    }

    #[test]
    fn custom_rule_sees_absence() {
        let rule = PredicateRule::Custom(CustomPredicate::new("absent", |v| v.is_none()));
        assert_eq!(rule.evaluate(None), Ok(true));
        assert_eq!(rule.evaluate(Some(&TypedValue::Int(1))), Ok(false));
        assert_eq!(rule.to_string(), "custom `absent`");
    }

    #[test]
    fn matcher_json_shape() {
        let m = FieldMatcher::Exact(TypedValue::Int(5));
        let json = serde_json::to_value(&m).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"op": "exact", "arg": {"type": "int", "value": 5}})
        );
        let back: FieldMatcher =
            serde_json::from_value(serde_json::json!({"op": "is_null"})).expect("deserialize");
        assert_eq!(back, FieldMatcher::IsNull);
    }

    #[test]
    fn filter_builder() {
        let f = FilterNode::new("Order")
            .with_field("ClOrdID", "A1")
            .with_field("Price", FieldMatcher::IsNotNull);
        assert_eq!(f.get("ClOrdID"), Some(&FilterValue::exact("A1")));
        assert_eq!(
            f.get("Price"),
            Some(&FilterValue::Matcher(FieldMatcher::IsNotNull))
        );
    }
}
