#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod compare;
pub mod dictionary;
pub mod error;
pub mod fields;
pub mod filter;
pub mod known_bugs;
pub mod message;
pub mod result;
pub mod settings;
pub mod value;

pub use compare::{Comparator, compare};
pub use dictionary::{EnumDictionary, MapDictionary};
pub use error::CompareError;
pub use fields::Fields;
pub use filter::{
    CONV_MISSED_OBJECT, CONV_PRESENT_OBJECT, CustomPredicate, FieldMatcher, FilterEntry,
    FilterNode, FilterValue, Pattern, PredicateRule,
};
pub use known_bugs::KnownBug;
pub use message::{Entry, FieldValue, MessageNode};
pub use result::{ComparisonResult, ReportedValue, StatusTally, StatusType};
pub use settings::{
    ComparatorSettings, FieldSettings, ParsePolicyError, SettingsView, UnexpectedPolicy,
};
pub use value::{Numeric, TypedValue};

/// Returns the current version of the msgcheck-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
