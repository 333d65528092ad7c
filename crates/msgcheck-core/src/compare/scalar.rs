//! Leaf comparison: one observed value against one [`FieldMatcher`].

use crate::dictionary;
use crate::filter::FieldMatcher;
use crate::message::{Entry, FieldValue};
use crate::result::{ComparisonResult, ReportedValue, StatusType};
use crate::settings::SettingsView;
use crate::value::TypedValue;

use super::Walk;
use super::render::matcher_report;

/// What the message side holds at a leaf position.
///
/// An absent key and an explicit null are distinct: `IsNull` passes only on
/// the latter.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Observed<'v> {
    /// The key is not present.
    Absent,
    /// The key is present with a null value.
    Null,
    /// A scalar value.
    Value(&'v TypedValue),
    /// A sub-message or group, summarised.
    Container(String),
}

impl<'v> Observed<'v> {
    pub(super) fn from_field(value: Option<&'v FieldValue>) -> Self {
        match value {
            None => Self::Absent,
            Some(FieldValue::Null) => Self::Null,
            Some(FieldValue::Scalar(v)) => Self::Value(v),
            Some(container @ (FieldValue::Message(_) | FieldValue::Group(_))) => {
                Self::Container(container.describe())
            }
        }
    }

    pub(super) fn from_entry(entry: Option<&'v Entry>) -> Self {
        match entry {
            None => Self::Absent,
            Some(Entry::Scalar(v)) => Self::Value(v),
            Some(Entry::Message(m)) => Self::Container(format!("message {}", m.name)),
        }
    }

    fn is_present(&self) -> bool {
        match self {
            Self::Value(_) | Self::Container(_) => true,
            Self::Absent | Self::Null => false,
        }
    }

    fn report(&self) -> Option<ReportedValue> {
        match self {
            Self::Absent => None,
            Self::Null => Some(ReportedValue::Null),
            Self::Value(v) => Some(ReportedValue::Value((*v).clone())),
            Self::Container(d) => Some(ReportedValue::Description(d.clone())),
        }
    }

    fn absence_diagnostic(&self) -> Option<String> {
        match self {
            Self::Absent => Some("field is absent".to_owned()),
            Self::Null => Some("field is null".to_owned()),
            Self::Container(d) => Some(format!("expected a scalar, found {d}")),
            Self::Value(_) => None,
        }
    }
}

impl Walk<'_> {
    /// Compares one leaf.
    ///
    /// `name` labels the result node; `field` is the bare field name used
    /// for tolerance, polarity and dictionary lookups (for a scalar group
    /// entry it is the group's field name).
    pub(super) fn leaf(
        &self,
        view: &SettingsView<'_>,
        message: &str,
        name: &str,
        field: &str,
        observed: &Observed<'_>,
        matcher: &FieldMatcher,
    ) -> ComparisonResult {
        let (passed, diagnostic, actual, expected) = match matcher {
            FieldMatcher::Exact(expected) => match observed {
                Observed::Value(actual) => {
                    let actual = self.translate(message, field, actual);
                    let expected = self.translate(message, field, expected);
                    let (equal, diagnostic) = values_match(view, field, &actual, &expected);
                    (
                        equal != view.is_negative(field),
                        diagnostic,
                        Some(ReportedValue::Value(actual)),
                        Some(ReportedValue::Value(expected)),
                    )
                }
                Observed::Absent | Observed::Null | Observed::Container(_) => (
                    false,
                    observed.absence_diagnostic(),
                    observed.report(),
                    Some(matcher_report(matcher)),
                ),
            },
            FieldMatcher::IsNull => {
                let passed = *observed == Observed::Null;
                let diagnostic = match observed {
                    Observed::Absent => Some("field is absent, not null".to_owned()),
                    Observed::Null | Observed::Value(_) | Observed::Container(_) => None,
                };
                (passed, diagnostic, observed.report(), Some(matcher_report(matcher)))
            }
            FieldMatcher::IsNotNull | FieldMatcher::ConventionPresent => {
                let passed = observed.is_present();
                let diagnostic = if passed { None } else { observed.absence_diagnostic() };
                (passed, diagnostic, observed.report(), Some(matcher_report(matcher)))
            }
            FieldMatcher::ConventionMissing => (
                !observed.is_present(),
                None,
                observed.report(),
                Some(matcher_report(matcher)),
            ),
            FieldMatcher::Predicate(rule) => {
                let outcome = match observed {
                    Observed::Value(v) => rule.evaluate(Some(*v)),
                    Observed::Absent | Observed::Null => rule.evaluate(None),
                    Observed::Container(d) => Err(format!("expected a scalar, found {d}")),
                };
                let (passed, diagnostic) = match outcome {
                    Ok(passed) => (passed, None),
                    Err(diagnostic) => (false, Some(diagnostic)),
                };
                (passed, diagnostic, observed.report(), Some(matcher_report(matcher)))
            }
        };

        let status = if passed {
            StatusType::Passed
        } else {
            StatusType::Failed
        };
        let result = ComparisonResult::leaf(name, status)
            .with_actual(actual)
            .with_expected(expected);
        match diagnostic {
            Some(d) => result.with_diagnostic(d),
            None => result,
        }
    }

    fn translate(&self, message: &str, field: &str, value: &TypedValue) -> TypedValue {
        match self.dictionary {
            Some(dict) => dictionary::translate(dict, message, field, value),
            None => value.clone(),
        }
    }
}

/// Exact equality with optional tolerance.
///
/// When either tolerance table has an entry for `field` and both values are
/// numeric, the values match if they are within any configured tolerance.
/// Otherwise type-normalised equality applies. A difference too large to
/// represent is outside every tolerance and is reported as a diagnostic.
fn values_match(
    view: &SettingsView<'_>,
    field: &str,
    actual: &TypedValue,
    expected: &TypedValue,
) -> (bool, Option<String>) {
    if let (Some(a), Some(e)) = (actual.as_numeric(), expected.as_numeric()) {
        let tolerances = [view.double_tolerance(field), view.system_tolerance(field)];
        if tolerances.iter().any(Option::is_some) {
            let mut unrepresentable = false;
            for tol in tolerances.into_iter().flatten() {
                match a.within(e, tol) {
                    Some(true) => return (true, None),
                    Some(false) => {}
                    None => unrepresentable = true,
                }
            }
            let diagnostic =
                unrepresentable.then(|| "difference is out of numeric range".to_owned());
            return (false, diagnostic);
        }
    }
    (actual.loosely_equals(expected), None)
}
