/// Message comparison engine.
///
/// Compares a decoded [`MessageNode`] against a [`FilterNode`] template
/// under [`ComparatorSettings`] and produces a [`ComparisonResult`] tree.
///
/// # Algorithm
///
/// 1. Validate the settings and known-bug list; misuse is a [`CompareError`].
/// 2. At each message node, compare the key fields first. Any key field that
///    does not pass aborts the whole call with the no-match outcome
///    (`Ok(None)`), wherever in the tree it sits.
/// 3. Compare the remaining filter fields in filter order, then report the
///    message's fields the filter does not name according to the
///    unexpected-field policy.
/// 4. Repeating groups pair entries positionally or by best match (see
///    [`group`]) and report unpaired entries according to the policy.
///
/// The engine is stateless: each call allocates a fresh result tree and
/// never mutates its inputs.
mod group;
mod render;
mod scalar;
mod structural;

#[cfg(test)]
mod tests;

use crate::dictionary::EnumDictionary;
use crate::error::CompareError;
use crate::filter::FilterNode;
use crate::known_bugs::{self, KnownBug};
use crate::message::MessageNode;
use crate::result::{ComparisonResult, StatusType};
use crate::settings::{ComparatorSettings, UnexpectedPolicy};

/// Compares `actual` against `filter`.
///
/// Returns `Ok(None)` when a key field does not match, meaning the filter
/// does not identify this message.
///
/// # Errors
///
/// Returns [`CompareError`] when the settings violate the call contract,
/// for example enum translation without a dictionary.
pub fn compare(
    actual: &MessageNode,
    filter: &FilterNode,
    settings: &ComparatorSettings,
) -> Result<Option<ComparisonResult>, CompareError> {
    Comparator::new(settings).compare(actual, filter)
}

/// Reusable comparison entry point with optional collaborators.
#[derive(Clone, Copy)]
pub struct Comparator<'a> {
    settings: &'a ComparatorSettings,
    dictionary: Option<&'a dyn EnumDictionary>,
    known_bugs: &'a [KnownBug],
}

impl std::fmt::Debug for Comparator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparator")
            .field("settings", self.settings)
            .field("dictionary", &self.dictionary.is_some())
            .field("known_bugs", &self.known_bugs)
            .finish()
    }
}

impl<'a> Comparator<'a> {
    /// Creates a comparator without a dictionary or known bugs.
    pub fn new(settings: &'a ComparatorSettings) -> Self {
        Self {
            settings,
            dictionary: None,
            known_bugs: &[],
        }
    }

    /// Supplies the enum dictionary used when `translate_enums` is set.
    #[must_use]
    pub fn with_dictionary(mut self, dictionary: &'a dyn EnumDictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Supplies known bugs used to annotate failures.
    #[must_use]
    pub fn with_known_bugs(mut self, known_bugs: &'a [KnownBug]) -> Self {
        self.known_bugs = known_bugs;
        self
    }

    /// Compares `actual` against `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError`] before any comparison runs when the settings
    /// or known-bug list violate the call contract.
    pub fn compare(
        &self,
        actual: &MessageNode,
        filter: &FilterNode,
    ) -> Result<Option<ComparisonResult>, CompareError> {
        self.settings.validate(self.dictionary.is_some())?;
        known_bugs::validate(self.known_bugs)?;

        let mut walk = Walk {
            dictionary: self.dictionary.filter(|_| self.settings.translate_enums),
            known_bugs: self.known_bugs,
            path: Vec::new(),
        };
        let view = self.settings.view();
        match walk.message(&view, &actual.name, Some(actual), filter) {
            Ok(mut result) => {
                result.subject_message_id = actual.id;
                Ok(Some(result))
            }
            Err(NoMatch) => Ok(None),
        }
    }
}

/// A key field did not pass; the filter does not identify the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NoMatch;

type Verdict = Result<ComparisonResult, NoMatch>;

/// State carried through one comparison call.
struct Walk<'a> {
    dictionary: Option<&'a dyn EnumDictionary>,
    known_bugs: &'a [KnownBug],
    /// Field names from the root to the current field, group indices
    /// omitted.
    path: Vec<String>,
}

impl Walk<'_> {
    /// Runs `f` with `field` pushed onto the field path.
    fn within<T>(&mut self, field: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(field.to_owned());
        let out = f(self);
        self.path.pop();
        out
    }

    fn path_string(&self) -> String {
        self.path.join(".")
    }

    /// Tags a failed field with the first matching known bug.
    fn annotate(&self, result: &mut ComparisonResult) {
        if result.status != StatusType::Failed {
            return;
        }
        if let Some(bug) = known_bugs::find(self.known_bugs, &self.path, result.actual.as_ref()) {
            result.known_bug = Some(bug.description.clone());
        }
    }
}

/// Verdict for an entry or field present on one side only.
///
/// `position` is the entry's occurrence number in its group (zero based, 0
/// for a plain field). Under policy `A` it is
/// `NA` inside the declared occurrence count and `FAILED` beyond it; with no
/// declared count `A` behaves like `Y`.
fn unpaired_status(policy: UnexpectedPolicy, position: usize, expected: Option<usize>) -> StatusType {
    match policy {
        UnexpectedPolicy::N => StatusType::Na,
        UnexpectedPolicy::Y => StatusType::Failed,
        UnexpectedPolicy::A => match expected {
            Some(count) if position < count => StatusType::Na,
            Some(_) | None => StatusType::Failed,
        },
    }
}
