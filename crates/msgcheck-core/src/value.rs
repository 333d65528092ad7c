/// Typed scalar values shared by decoded messages and filter templates.
///
/// [`TypedValue`] is a closed set of the scalar kinds protocol codecs produce.
/// Numeric variants can be projected onto [`Numeric`] so that values of
/// different widths (an `Int` from one codec, a `Long` from another) compare
/// by magnitude rather than by representation.
use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// A single decoded scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// Signed 8-bit integer.
    Byte(i8),
    /// Signed 16-bit integer.
    Short(i16),
    /// Signed 32-bit integer.
    Int(i32),
    /// Signed 64-bit integer.
    Long(i64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// Arbitrary-precision decimal.
    Decimal(Decimal),
    /// Boolean flag.
    Bool(bool),
    /// Single character.
    Char(char),
    /// UTF-8 string.
    String(String),
    /// Calendar date without zone.
    Date(NaiveDate),
    /// Time of day without zone.
    Time(NaiveTime),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
}

/// Normalised numeric projection of a [`TypedValue`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    /// Any integer width, widened to `i64`.
    Integer(i64),
    /// Any float width, widened to `f64`.
    Float(f64),
    /// Decimal kept exact.
    Decimal(Decimal),
}

impl TypedValue {
    /// Returns the lowercase kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::Bool(_) => "bool",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "date_time",
        }
    }

    /// Projects the value onto [`Numeric`], or `None` for non-numeric kinds.
    pub fn as_numeric(&self) -> Option<Numeric> {
        match self {
            Self::Byte(n) => Some(Numeric::Integer(i64::from(*n))),
            Self::Short(n) => Some(Numeric::Integer(i64::from(*n))),
            Self::Int(n) => Some(Numeric::Integer(i64::from(*n))),
            Self::Long(n) => Some(Numeric::Integer(*n)),
            Self::Float(f) => Some(Numeric::Float(f64::from(*f))),
            Self::Double(f) => Some(Numeric::Float(*f)),
            Self::Decimal(d) => Some(Numeric::Decimal(*d)),
            Self::Bool(_)
            | Self::Char(_)
            | Self::String(_)
            | Self::Date(_)
            | Self::Time(_)
            | Self::DateTime(_) => None,
        }
    }

    /// Returns the textual form used for string-like comparison and
    /// dictionary lookups.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Type-normalised equality.
    ///
    /// Numeric kinds compare by magnitude after widening. `Char` and a
    /// one-character `String` are equal when their text matches. Every other
    /// cross-kind pair is unequal.
    pub fn loosely_equals(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_numeric(), other.as_numeric()) {
            return a.compare(b) == Some(Ordering::Equal);
        }
        match (self, other) {
            (Self::Char(a), Self::String(b)) | (Self::String(b), Self::Char(a)) => {
                let mut chars = b.chars();
                chars.next() == Some(*a) && chars.next().is_none()
            }
            _ => self == other,
        }
    }
}

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

impl Numeric {
    /// Orders two numerics after promoting them to a common representation.
    ///
    /// Integer pairs stay integral; any decimal operand promotes both sides
    /// to `Decimal`; everything else compares as `f64`. Returns `None` when a
    /// float cannot be represented as a decimal or when `NaN` is involved.
    pub fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(&b)),
            (Self::Decimal(_), _) | (_, Self::Decimal(_)) => {
                let a = self.to_decimal()?;
                let b = other.to_decimal()?;
                Some(a.cmp(&b))
            }
            (Self::Float(_), _) | (_, Self::Float(_)) => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Returns whether `|self - other| <= tolerance`.
    ///
    /// Integer pairs subtract exactly in `i128`. Decimal operands are
    /// compared exactly against the tolerance converted to a decimal; other
    /// pairs use `f64` arithmetic. Returns `None` when the difference cannot
    /// be represented (a decimal subtraction overflows, or a float operand
    /// has no decimal form).
    pub fn within(self, other: Self, tolerance: f64) -> Option<bool> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Some(false);
        }
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => {
                let diff = (i128::from(a) - i128::from(b)).unsigned_abs();
                // Every i64 difference is below 2^64, which is exact as f64.
                Some(tolerance >= TWO_POW_64 || diff <= tolerance.floor() as u128)
            }
            (Self::Decimal(_), _) | (_, Self::Decimal(_)) => {
                let a = self.to_decimal()?;
                let b = other.to_decimal()?;
                let diff = a.checked_sub(b)?.abs();
                Some(match Decimal::from_f64(tolerance) {
                    Some(tol) => diff <= tol,
                    // Larger than any decimal.
                    None => true,
                })
            }
            (Self::Integer(_) | Self::Float(_), Self::Float(_))
            | (Self::Float(_), Self::Integer(_)) => {
                Some((self.to_f64() - other.to_f64()).abs() <= tolerance)
            }
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Self::Integer(n) => n as f64,
            Self::Float(f) => f,
            Self::Decimal(d) => rust_decimal::prelude::ToPrimitive::to_f64(&d).unwrap_or(f64::NAN),
        }
    }

    fn to_decimal(self) -> Option<Decimal> {
        match self {
            Self::Integer(n) => Some(Decimal::from(n)),
            Self::Float(f) => Decimal::from_f64(f),
            Self::Decimal(d) => Some(d),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(n) => write!(f, "{n}"),
            Self::Short(n) => write!(f, "{n}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for TypedValue {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<i64> for TypedValue {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<char> for TypedValue {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<Decimal> for TypedValue {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> TypedValue {
        TypedValue::Decimal(Decimal::from_str(s).expect("decimal literal"))
    }

    #[test]
    fn integer_widths_compare_by_magnitude() {
        assert!(TypedValue::Byte(7).loosely_equals(&TypedValue::Long(7)));
        assert!(TypedValue::Short(-3).loosely_equals(&TypedValue::Int(-3)));
        assert!(!TypedValue::Int(1).loosely_equals(&TypedValue::Long(2)));
    }

    #[test]
    fn decimals_ignore_trailing_zeros() {
        assert!(dec("1.10").loosely_equals(&dec("1.1")));
        assert!(dec("2").loosely_equals(&TypedValue::Int(2)));
        assert!(!dec("1.001").loosely_equals(&dec("1.002")));
    }

    #[test]
    fn char_matches_single_character_string() {
        assert!(TypedValue::Char('B').loosely_equals(&TypedValue::from("B")));
        assert!(!TypedValue::Char('B').loosely_equals(&TypedValue::from("BB")));
    }

    #[test]
    fn strings_are_case_sensitive() {
        assert!(!TypedValue::from("abc").loosely_equals(&TypedValue::from("ABC")));
    }

    #[test]
    fn bool_never_equals_number() {
        assert!(!TypedValue::Bool(true).loosely_equals(&TypedValue::Int(1)));
    }

    #[test]
    fn within_uses_absolute_difference() {
        let a = TypedValue::Double(1.001).as_numeric().expect("numeric");
        let b = TypedValue::Double(1.002).as_numeric().expect("numeric");
        assert_eq!(a.within(b, 0.01), Some(true));
        assert_eq!(b.within(a, 0.01), Some(true));
        assert_eq!(a.within(b, 0.0001), Some(false));
    }

    #[test]
    fn within_on_decimals_is_exact() {
        let a = dec("89518.08").as_numeric().expect("numeric");
        let b = dec("89519").as_numeric().expect("numeric");
        assert_eq!(a.within(b, 10.0), Some(true));
        assert_eq!(a.within(b, 0.5), Some(false));
    }

    #[test]
    fn within_on_large_integers_is_exact() {
        let a = Numeric::Integer(9_007_199_254_740_993);
        let b = Numeric::Integer(9_007_199_254_740_992);
        assert_eq!(a.within(b, 0.0), Some(false));
        assert_eq!(a.within(b, 1.0), Some(true));
        assert_eq!(a.within(b, 0.99), Some(false));

        let max = Numeric::Integer(i64::MAX);
        let min = Numeric::Integer(i64::MIN);
        assert_eq!(max.within(min, 1e18), Some(false));
        assert_eq!(max.within(min, 1e20), Some(true));
    }

    #[test]
    fn within_reports_unrepresentable_decimal_difference() {
        let max = Numeric::Decimal(Decimal::MAX);
        let min = Numeric::Decimal(Decimal::MIN);
        assert_eq!(max.within(min, 0.01), None);
        assert_eq!(max.within(max, 0.01), Some(true));
    }

    #[test]
    fn nan_is_never_equal() {
        let nan = TypedValue::Double(f64::NAN);
        assert!(!nan.loosely_equals(&nan));
    }

    #[test]
    fn serde_uses_adjacent_tags() {
        let json = serde_json::to_string(&TypedValue::Int(5)).expect("serialize");
        assert_eq!(json, r#"{"type":"int","value":5}"#);
        let back: TypedValue = serde_json::from_str(r#"{"type":"string","value":"x"}"#)
            .expect("deserialize");
        assert_eq!(back, TypedValue::from("x"));
    }
}
