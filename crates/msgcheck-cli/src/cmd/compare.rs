//! Implementation of `msgcheck compare --message <file> --filter <file>`.
//!
//! Loads a decoded message, a filter and optional settings, known bugs and
//! enum dictionary, applies command-line overrides to the settings, runs
//! the comparison and prints the verdict tree.
//!
//! Exit codes:
//! - 0 = the verdict is `PASSED` or `NA`
//! - 1 = the verdict is `FAILED`
//! - 2 = an input could not be read or parsed, or the settings are invalid
//! - 3 = the key fields differ, so the filter does not identify the message
use msgcheck_core::{
    Comparator, ComparatorSettings, ComparisonResult, FilterNode, KnownBug, MapDictionary,
    MessageNode, StatusType,
};
use tracing::{debug, info};

use crate::error::CliError;
use crate::format::{FormatterConfig, write_no_match, write_report, write_verdict};
use crate::io::load;
use crate::{CompareArgs, OutputFormat, PathOrStdin};

/// Everything a comparison needs, loaded from disk or stdin.
#[derive(Debug)]
struct Inputs {
    message: MessageNode,
    filter: FilterNode,
    settings: ComparatorSettings,
    known_bugs: Vec<KnownBug>,
    dictionary: Option<MapDictionary>,
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Runs the `compare` command.
///
/// The report is written to stdout and the verdict line to stderr.
///
/// # Errors
///
/// - [`CliError::InvalidArguments`] when stdin is named by more than one
///   input.
/// - Any input failure from [`crate::io::load`] (exit code 2).
/// - [`CliError::InvalidSettings`] when the engine rejects the settings.
/// - [`CliError::NoMatch`] when a key field differs.
/// - [`CliError::ComparisonFailed`] when the verdict is `FAILED`.
pub fn run(
    args: &CompareArgs,
    format: OutputFormat,
    config: &FormatterConfig,
    max_size: u64,
) -> Result<(), CliError> {
    check_single_stdin(args)?;
    let mut inputs = load_inputs(args, max_size)?;
    apply_overrides(&mut inputs.settings, args);

    let outcome = {
        let mut comparator =
            Comparator::new(&inputs.settings).with_known_bugs(&inputs.known_bugs);
        if let Some(dictionary) = &inputs.dictionary {
            comparator = comparator.with_dictionary(dictionary);
        }
        comparator.compare(&inputs.message, &inputs.filter)?
    };

    let Some(result) = outcome else {
        info!(message = %inputs.message.name, "key fields differ");
        write_no_match(&mut std::io::stderr().lock(), format, config)
            .map_err(|e| output_error("stderr", &e))?;
        return Err(CliError::NoMatch);
    };

    emit(&result, format, config)?;

    let tally = result.tally();
    info!(
        message = %inputs.message.name,
        status = %result.status,
        passed = tally.passed,
        failed = tally.failed,
        na = tally.na,
        "comparison finished"
    );
    match result.status {
        StatusType::Failed => Err(CliError::ComparisonFailed {
            failed: tally.failed,
        }),
        StatusType::Passed | StatusType::Na => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

fn check_single_stdin(args: &CompareArgs) -> Result<(), CliError> {
    let sources = [
        Some(&args.message),
        Some(&args.filter),
        args.settings.as_ref(),
        args.known_bugs.as_ref(),
        args.dictionary.as_ref(),
    ];
    let stdin_count = sources
        .into_iter()
        .flatten()
        .filter(|s| matches!(s, PathOrStdin::Stdin))
        .count();
    if stdin_count > 1 {
        return Err(CliError::InvalidArguments {
            detail: "stdin (`-`) can be used for only one input".to_owned(),
        });
    }
    Ok(())
}

fn load_inputs(args: &CompareArgs, max_size: u64) -> Result<Inputs, CliError> {
    let message: MessageNode = load(&args.message, max_size)?;
    let filter: FilterNode = load(&args.filter, max_size)?;
    let settings: ComparatorSettings = match &args.settings {
        Some(source) => load(source, max_size)?,
        None => ComparatorSettings::default(),
    };
    let known_bugs: Vec<KnownBug> = match &args.known_bugs {
        Some(source) => load(source, max_size)?,
        None => Vec::new(),
    };
    let dictionary: Option<MapDictionary> = match &args.dictionary {
        Some(source) => Some(load(source, max_size)?),
        None => None,
    };
    debug!(
        message = %message.name,
        known_bugs = known_bugs.len(),
        dictionary = dictionary.is_some(),
        "inputs loaded"
    );
    Ok(Inputs {
        message,
        filter,
        settings,
        known_bugs,
        dictionary,
    })
}

/// Layers command-line flags over the loaded settings.
fn apply_overrides(settings: &mut ComparatorSettings, args: &CompareArgs) {
    if args.check_group_order {
        settings.check_group_order = true;
    }
    if let Some(policy) = args.fail_unexpected {
        settings.root.unexpected = Some(policy);
    }
    settings.ignored_fields.extend(args.ignore.iter().cloned());
    settings
        .unchecked_fields
        .extend(args.unchecked.iter().cloned());
    if args.translate_enums {
        settings.translate_enums = true;
    }
    debug!(?settings, "effective settings");
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn emit(
    result: &ComparisonResult,
    format: OutputFormat,
    config: &FormatterConfig,
) -> Result<(), CliError> {
    write_report(&mut std::io::stdout().lock(), result, format, config)
        .map_err(|e| output_error("stdout", &e))?;
    write_verdict(&mut std::io::stderr().lock(), result, format, config)
        .map_err(|e| output_error("stderr", &e))
}

fn output_error(stream: &str, e: &std::io::Error) -> CliError {
    CliError::IoError {
        source: stream.to_owned(),
        detail: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
