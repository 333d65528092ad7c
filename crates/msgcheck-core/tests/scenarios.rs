//! End-to-end comparisons through the public API.
//!
//! The execution-report fixtures under `tests/fixtures/` are loaded with
//! `serde_json` exactly as a test harness would supply them; the remaining
//! tests build trees in code.
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use msgcheck_core::{
    Comparator, ComparatorSettings, ComparisonResult, FieldMatcher, FieldSettings, FieldValue,
    FilterNode, FilterValue, KnownBug, MessageNode, ReportedValue, StatusType, TypedValue,
    UnexpectedPolicy, compare,
};
use serde::de::DeserializeOwned;

fn fixture<T: DeserializeOwned>(name: &str) -> T {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path).expect("fixture file should be readable");
    serde_json::from_str(&text).expect("fixture should deserialize")
}

fn execution_report() -> (MessageNode, FilterNode, ComparatorSettings) {
    (
        fixture("execution_report.json"),
        fixture("execution_report.filter.json"),
        fixture("execution_report.settings.json"),
    )
}

fn leaf_counts(result: &ComparisonResult) -> (usize, usize, usize) {
    let t = result.tally();
    (t.passed, t.failed, t.na)
}

#[test]
fn execution_report_fixture_passes() {
    let (message, filter, settings) = execution_report();
    let result = compare(&message, &filter, &settings)
        .expect("settings are valid")
        .expect("ClOrdID identifies the message");

    assert_eq!(result.status, StatusType::Passed);
    assert_eq!(result.subject_message_id, Some(17));
    assert_eq!(leaf_counts(&result), (5, 0, 3));
    assert!(result.child("ClOrdID").is_some_and(|n| n.is_key));

    let names: Vec<&str> = result.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "ClOrdID",
            "OrderQty",
            "Price",
            "Text",
            "Parties",
            "Header",
            "TransactTime"
        ]
    );
    let broker = result
        .path(&["Parties", "0", "PartyID"])
        .expect("paired party");
    assert_eq!(
        broker.actual,
        Some(ReportedValue::Value(TypedValue::from("BRK")))
    );
    assert_eq!(
        result.path(&["Parties", "1"]).map(|n| n.status),
        Some(StatusType::Na)
    );
}

#[test]
fn execution_report_for_another_order_is_not_matched() {
    let (mut message, filter, settings) = execution_report();
    message.set("ClOrdID", "ORD-2");
    let outcome = compare(&message, &filter, &settings).expect("settings are valid");
    assert!(outcome.is_none());
}

#[test]
fn known_bug_fixture_annotates_the_price_failure() {
    let (mut message, filter, settings) = execution_report();
    message.set("Price", 1025.0);
    let bugs: Vec<KnownBug> = fixture("known_bugs.json");

    let result = Comparator::new(&settings)
        .with_known_bugs(&bugs)
        .compare(&message, &filter)
        .expect("settings are valid")
        .expect("ClOrdID identifies the message");
    let price = result.child("Price").expect("Price result");
    assert_eq!(price.status, StatusType::Failed);
    assert_eq!(
        price.known_bug.as_deref(),
        Some("venue reports price in ticks")
    );
    assert_eq!(result.status, StatusType::Failed);
}

#[test]
fn settings_reject_unknown_keys() {
    let err = serde_json::from_str::<ComparatorSettings>(
        r#"{"root": {"key_field": ["ClOrdID"]}}"#,
    )
    .expect_err("misspelled key should be rejected");
    assert!(err.to_string().contains("unknown field"), "{err}");
}

#[test]
fn first_matching_filter_selects_the_expectation() {
    let message = MessageNode::new("ExecutionReport")
        .with_field("ClOrdID", "ORD-2")
        .with_field("ExecType", 'F');
    let candidates: Vec<FilterNode> = ["ORD-1", "ORD-2", "ORD-3"]
        .into_iter()
        .map(|id| {
            FilterNode::new("ExecutionReport")
                .with_field("ClOrdID", id)
                .with_field("ExecType", "F")
        })
        .collect();
    let settings = ComparatorSettings::new()
        .with_root(FieldSettings::new().with_key_fields(["ClOrdID"]));

    let matched: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter_map(|(idx, filter)| {
            compare(&message, filter, &settings)
                .expect("settings are valid")
                .map(|_| idx)
        })
        .collect();
    assert_eq!(matched, [1]);
}

#[test]
fn explicit_null_is_not_an_absent_field() {
    let message = MessageNode::new("M").with_field("X", FieldValue::Null);
    let filter = FilterNode::new("M")
        .with_field("X", FieldMatcher::IsNull)
        .with_field("Y", FieldMatcher::IsNull);
    let result = compare(&message, &filter, &ComparatorSettings::new())
        .expect("valid")
        .expect("match");
    assert_eq!(result.child("X").map(|n| n.status), Some(StatusType::Passed));
    assert_eq!(result.child("Y").map(|n| n.status), Some(StatusType::Failed));
}

#[test]
fn unordered_group_ignores_entry_order() {
    let message = MessageNode::new("M").with_field("G", FieldValue::group_of_scalars([0, 1]));
    let filter = FilterNode::new("M").with_field("G", FilterValue::group_of_scalars([1, 0]));

    let unordered = compare(&message, &filter, &ComparatorSettings::new())
        .expect("valid")
        .expect("match");
    assert_eq!(leaf_counts(&unordered), (2, 0, 0));

    let ordered = compare(
        &message,
        &filter,
        &ComparatorSettings::new().with_check_group_order(true),
    )
    .expect("valid")
    .expect("match");
    assert_eq!(leaf_counts(&ordered), (0, 2, 0));
}

#[test]
fn unexpected_field_policy() {
    let message = MessageNode::new("M").with_field("A", 1).with_field("Extra", 2);
    let filter = FilterNode::new("M").with_field("A", 1);
    let run = |policy| {
        let settings =
            ComparatorSettings::new().with_root(FieldSettings::new().with_unexpected(policy));
        compare(&message, &filter, &settings)
            .expect("valid")
            .expect("match")
    };
    assert_eq!(
        run(UnexpectedPolicy::N).child("Extra").map(|n| n.status),
        Some(StatusType::Na)
    );
    assert_eq!(
        run(UnexpectedPolicy::Y).child("Extra").map(|n| n.status),
        Some(StatusType::Failed)
    );
}

#[test]
fn rendered_tree_and_json_report() {
    let message = MessageNode::new("Order")
        .with_field("Qty", 5)
        .with_field("Px", FieldValue::Null);
    let filter = FilterNode::new("Order")
        .with_field("Qty", 6)
        .with_field("Px", FieldMatcher::IsNull);
    let result = compare(&message, &filter, &ComparatorSettings::new())
        .expect("valid")
        .expect("match");

    assert_eq!(
        result.to_string(),
        "Order: FAILED\n  Qty: FAILED (actual: 5, expected: 6)\n  Px: PASSED (actual: null, expected: is null)\n"
    );

    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["status"], "FAILED");
    assert_eq!(json["children"][0]["name"], "Qty");
    assert_eq!(json["children"][1]["status"], "PASSED");

    let visited: Vec<&str> = result.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(visited, ["Order", "Qty", "Px"]);
}
