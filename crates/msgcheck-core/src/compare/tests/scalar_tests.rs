use std::str::FromStr;

use rust_decimal::Decimal;

use super::*;
use crate::compare::Comparator;
use crate::dictionary::MapDictionary;
use crate::error::CompareError;
use crate::filter::{FieldMatcher, PredicateRule};
use crate::result::ReportedValue;
use crate::settings::FieldSettings;
use crate::value::TypedValue;

#[test]
fn explicit_null_and_absent_key_differ_for_is_null() {
    let message = MessageNode::new("M").with_field("X", FieldValue::Null);
    let filter = FilterNode::new("M")
        .with_field("X", FieldMatcher::IsNull)
        .with_field("Y", FieldMatcher::IsNull);
    let r = run(&message, &filter, &ComparatorSettings::new());
    assert_eq!(status_at(&r, &["X"]), StatusType::Passed);
    assert_eq!(status_at(&r, &["Y"]), StatusType::Failed);
    assert_eq!(counts(&r), (1, 1, 0));
    assert_eq!(
        r.child("Y").and_then(|n| n.diagnostic.as_deref()),
        Some("field is absent, not null")
    );
}

#[test]
fn null_and_presence_matrix() {
    let message = MessageNode::new("M")
        .with_field("ExplicitNull_NullFilter", FieldValue::Null)
        .with_field("ExplicitNull_EmptyValue", FieldValue::Null)
        .with_field("ExplicitNull_NotNullFilter", FieldValue::Null)
        .with_field("ExplicitNull_AnyValue", FieldValue::Null);
    let missed = FieldMatcher::from_text("matching.Convention.CONV_MISSED_OBJECT");
    let present = FieldMatcher::from_text("matching.Convention.CONV_PRESENT_OBJECT");
    let filter = FilterNode::new("M")
        .with_field("ExplicitNull_NullFilter", FieldMatcher::IsNull)
        .with_field("HiddenNull_NullFilter", FieldMatcher::IsNull)
        .with_field("ExplicitNull_EmptyValue", missed.clone())
        .with_field("HiddenNull_EmptyValue", missed)
        .with_field("ExplicitNull_NotNullFilter", FieldMatcher::IsNotNull)
        .with_field("HiddenNull_NotNullFilter", FieldMatcher::IsNotNull)
        .with_field("ExplicitNull_AnyValue", present.clone())
        .with_field("HiddenNull_AnyValue", present);
    let r = run(&message, &filter, &ComparatorSettings::new());

    assert_eq!(status_at(&r, &["ExplicitNull_NullFilter"]), StatusType::Passed);
    assert_eq!(status_at(&r, &["HiddenNull_NullFilter"]), StatusType::Failed);
    assert_eq!(status_at(&r, &["ExplicitNull_EmptyValue"]), StatusType::Passed);
    assert_eq!(status_at(&r, &["HiddenNull_EmptyValue"]), StatusType::Passed);
    assert_eq!(counts(&r), (3, 5, 0));
}

#[test]
fn tolerance_turns_a_near_miss_into_a_pass() {
    let message = MessageNode::new("M").with_field("Px", 1.001);
    let filter = FilterNode::new("M").with_field("Px", 1.002);
    let strict = run(&message, &filter, &ComparatorSettings::new());
    assert_eq!(strict.status, StatusType::Failed);

    let settings = ComparatorSettings::new()
        .with_root(FieldSettings::new().with_double_tolerance("Px", 0.01));
    let lenient = run(&message, &filter, &settings);
    assert_eq!(lenient.status, StatusType::Passed);
}

#[test]
fn either_tolerance_table_is_sufficient() {
    let dec = |s: &str| Decimal::from_str(s).expect("decimal literal");
    let message = MessageNode::new("M")
        .with_field("floatFAILED", TypedValue::Float(1.001))
        .with_field("floatDouPASSED", TypedValue::Float(1.001))
        .with_field("doubleSysPASSED", 1.001)
        .with_field("bigDecimalFAILED", dec("1.001"))
        .with_field("bigDecimalDouPASSED", dec("1.001"))
        .with_field("bigDecimalSysPASSED", dec("1.001"));
    let filter = FilterNode::new("M")
        .with_field("floatFAILED", TypedValue::Float(1.002))
        .with_field("floatDouPASSED", TypedValue::Float(1.002))
        .with_field("doubleSysPASSED", 1.0012)
        .with_field("bigDecimalFAILED", dec("1.002"))
        .with_field("bigDecimalDouPASSED", dec("1.002"))
        .with_field("bigDecimalSysPASSED", dec("1.0012"));
    let settings = ComparatorSettings::new().with_root(
        FieldSettings::new()
            .with_double_tolerance("floatDouPASSED", 0.01)
            .with_system_tolerance("floatFAILED_other", 0.5)
            .with_system_tolerance("doubleSysPASSED", 0.00025)
            .with_double_tolerance("bigDecimalDouPASSED", 0.01)
            .with_system_tolerance("bigDecimalSysPASSED", 0.00025),
    );
    let r = run(&message, &filter, &settings);
    for node in r.children.iter() {
        let expected = if node.name.ends_with("PASSED") {
            StatusType::Passed
        } else {
            StatusType::Failed
        };
        assert_eq!(node.status, expected, "{}", node.name);
    }
}

#[test]
fn tolerance_on_large_longs_is_exact() {
    let message = MessageNode::new("M").with_field("Qty", TypedValue::Long(9_007_199_254_740_993));
    let filter = FilterNode::new("M").with_field("Qty", TypedValue::Long(9_007_199_254_740_992));

    let zero = ComparatorSettings::new()
        .with_root(FieldSettings::new().with_system_tolerance("Qty", 0.0));
    assert_eq!(status_at(&run(&message, &filter, &zero), &["Qty"]), StatusType::Failed);

    let one = ComparatorSettings::new()
        .with_root(FieldSettings::new().with_system_tolerance("Qty", 1.0));
    assert_eq!(status_at(&run(&message, &filter, &one), &["Qty"]), StatusType::Passed);
}

#[test]
fn decimal_difference_out_of_range_fails_with_a_diagnostic() {
    let message = MessageNode::new("M").with_field("Px", TypedValue::Decimal(Decimal::MAX));
    let filter = FilterNode::new("M").with_field("Px", TypedValue::Decimal(Decimal::MIN));
    let settings = ComparatorSettings::new()
        .with_root(FieldSettings::new().with_double_tolerance("Px", 0.01));

    let r = run(&message, &filter, &settings);
    let px = r.child("Px").expect("Px result");
    assert_eq!(px.status, StatusType::Failed);
    assert_eq!(px.diagnostic.as_deref(), Some("difference is out of numeric range"));
}

#[test]
fn numeric_widths_compare_by_magnitude() {
    let message = MessageNode::new("M")
        .with_field("Qty", TypedValue::Long(100))
        .with_field("Side", 'B');
    let filter = FilterNode::new("M")
        .with_field("Qty", 100)
        .with_field("Side", "B");
    let r = run(&message, &filter, &ComparatorSettings::new());
    assert_eq!(counts(&r), (2, 0, 0));
}

#[test]
fn negative_override_inverts_exact_equality() {
    let message = MessageNode::new("M")
        .with_field("Same", 1)
        .with_field("Different", 1);
    let filter = FilterNode::new("M")
        .with_field("Same", 1)
        .with_field("Different", 2);
    let settings = ComparatorSettings::new()
        .with_negative("Same", true)
        .with_negative("Different", true);
    let r = run(&message, &filter, &settings);
    assert_eq!(status_at(&r, &["Same"]), StatusType::Failed);
    assert_eq!(status_at(&r, &["Different"]), StatusType::Passed);

    let off = ComparatorSettings::new().with_negative("Different", false);
    let r = run(&message, &filter, &off);
    assert_eq!(status_at(&r, &["Different"]), StatusType::Failed);
}

#[test]
fn ignored_and_unchecked_fields_are_na() {
    let message = int_message("M", &[("MsgSeqNum", 1), ("CheckSum", 10), ("Qty", 5)]);
    let filter = int_filter("M", &[("MsgSeqNum", 2), ("CheckSum", 11), ("Qty", 5)]);
    let settings = ComparatorSettings::new()
        .ignore("MsgSeqNum")
        .uncheck("CheckSum");
    let r = run(&message, &filter, &settings);
    assert_eq!(counts(&r), (1, 0, 2));
    let seq = r.child("MsgSeqNum").expect("MsgSeqNum result");
    assert_eq!(seq.actual, Some(ReportedValue::Value(TypedValue::Int(1))));
    assert_eq!(seq.expected, Some(ReportedValue::Value(TypedValue::Int(2))));
}

#[test]
fn enum_aliases_are_translated_on_both_sides() {
    let dict = MapDictionary::new().with("Side", "1", "Buy");
    let message = MessageNode::new("Order").with_field("Side", '1');
    let filter = FilterNode::new("Order").with_field("Side", "Buy");

    let plain = ComparatorSettings::new();
    let r = Comparator::new(&plain)
        .with_dictionary(&dict)
        .compare(&message, &filter)
        .expect("valid")
        .expect("match");
    assert_eq!(r.status, StatusType::Failed);

    let translating = ComparatorSettings::new().with_translate_enums(true);
    let r = Comparator::new(&translating)
        .with_dictionary(&dict)
        .compare(&message, &filter)
        .expect("valid")
        .expect("match");
    assert_eq!(r.status, StatusType::Passed);
    assert_eq!(
        r.child("Side").and_then(|n| n.actual.clone()),
        Some(ReportedValue::Value(TypedValue::from("Buy")))
    );
}

#[test]
fn translation_without_dictionary_is_a_contract_error() {
    let settings = ComparatorSettings::new().with_translate_enums(true);
    let err = compare(&MessageNode::new("M"), &FilterNode::new("M"), &settings)
        .expect_err("dictionary is required");
    assert_eq!(err, CompareError::MissingDictionary);
}

#[test]
fn malformed_predicate_fails_only_its_field() {
    let message = MessageNode::new("M")
        .with_field("Text", "abc")
        .with_field("Qty", 5);
    let filter = FilterNode::new("M")
        .with_field(
            "Text",
            FieldMatcher::Predicate(PredicateRule::Regex("[".into())),
        )
        .with_field(
            "Qty",
            FieldMatcher::Predicate(PredicateRule::Range {
                min: Some(TypedValue::Int(1)),
                max: Some(TypedValue::Int(10)),
            }),
        );
    let r = run(&message, &filter, &ComparatorSettings::new());
    assert_eq!(status_at(&r, &["Text"]), StatusType::Failed);
    assert!(
        r.child("Text")
            .and_then(|n| n.diagnostic.as_deref())
            .is_some_and(|d| d.contains("invalid pattern"))
    );
    assert_eq!(status_at(&r, &["Qty"]), StatusType::Passed);
}

#[test]
fn presence_matchers_on_containers() {
    let message = MessageNode::new("M")
        .with_field("Parties", FieldValue::group_of_scalars(["A", "B", "C"]))
        .with_field("Header", MessageNode::new("Hdr"));
    let filter = FilterNode::new("M")
        .with_field("Parties", FieldMatcher::IsNotNull)
        .with_field("Header", FieldMatcher::ConventionPresent)
        .with_field("Legs", FieldMatcher::ConventionMissing);
    let r = run(&message, &filter, &ComparatorSettings::new());
    assert_eq!(counts(&r), (3, 0, 0));
    let parties = r.child("Parties").expect("Parties result");
    assert!(parties.is_leaf());
    assert_eq!(
        parties.actual,
        Some(ReportedValue::Description("3 entries".to_owned()))
    );
}

#[test]
fn exact_matcher_against_a_container_fails() {
    let message = MessageNode::new("M").with_field("Header", MessageNode::new("Hdr"));
    let filter = FilterNode::new("M").with_field("Header", "x");
    let r = run(&message, &filter, &ComparatorSettings::new());
    assert_eq!(status_at(&r, &["Header"]), StatusType::Failed);
    assert_eq!(
        r.child("Header").and_then(|n| n.diagnostic.as_deref()),
        Some("expected a scalar, found message Hdr")
    );
}
