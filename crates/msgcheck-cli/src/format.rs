/// Report formatting: human-readable and JSON modes.
///
/// The comparison report goes to stdout and the one-line verdict to stderr,
/// so `msgcheck compare ... > report.json` captures only the tree.
///
/// - **Human mode** (default): the result tree, one node per line, indented
///   by depth, with the status word color-coded. Colors are disabled when
///   `--no-color` is set, the `NO_COLOR` environment variable is present
///   (per <https://no-color.org>), or the stream is not a TTY.
/// - **JSON mode**: the result tree as one pretty-printed JSON document, and
///   the verdict as a single-line JSON object.
use std::io::{IsTerminal as _, Write};

use msgcheck_core::{ComparisonResult, StatusType};

use crate::OutputFormat;

// ---------------------------------------------------------------------------
// Color support detection
// ---------------------------------------------------------------------------

/// Returns `true` if ANSI color codes should be emitted to stdout.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

const ANSI_RED: &str = "\x1b[31m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// FormatterConfig
// ---------------------------------------------------------------------------

/// Configuration for the report formatter, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Whether ANSI colors are enabled.
    pub colors: bool,
    /// Suppress the verdict line.
    pub quiet: bool,
}

impl FormatterConfig {
    /// Constructs a [`FormatterConfig`] from the raw CLI flags.
    pub fn from_flags(no_color_flag: bool, quiet: bool) -> Self {
        Self {
            colors: colors_enabled(no_color_flag),
            quiet,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Writes the result tree in the requested format.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_report<W: Write>(
    writer: &mut W,
    result: &ComparisonResult,
    format: OutputFormat,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Human => write_node_human(writer, result, 0, config),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, result)?;
            writeln!(writer)
        }
    }
}

fn write_node_human<W: Write>(
    writer: &mut W,
    node: &ComparisonResult,
    depth: usize,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    write!(
        writer,
        "{:indent$}{}: {}",
        "",
        node.name,
        status_word(node.status, config),
        indent = depth * 2
    )?;
    if node.is_key {
        write!(writer, " [key]")?;
    }
    if node.is_leaf() {
        let actual = node
            .actual
            .as_ref()
            .map_or_else(|| "<absent>".to_owned(), ToString::to_string);
        let expected = node
            .expected
            .as_ref()
            .map_or_else(|| "<none>".to_owned(), ToString::to_string);
        write!(writer, " (actual: {actual}, expected: {expected})")?;
    }
    if let Some(diagnostic) = &node.diagnostic {
        write!(writer, " -- {diagnostic}")?;
    }
    if let Some(bug) = &node.known_bug {
        write!(writer, " [known bug: {bug}]")?;
    }
    writeln!(writer)?;
    for child in &node.children {
        write_node_human(writer, child, depth + 1, config)?;
    }
    Ok(())
}

fn status_word(status: StatusType, config: &FormatterConfig) -> String {
    if !config.colors {
        return status.to_string();
    }
    let color = match status {
        StatusType::Passed => ANSI_GREEN,
        StatusType::Failed => ANSI_RED,
        StatusType::Na => ANSI_YELLOW,
    };
    format!("{color}{status}{ANSI_RESET}")
}

// ---------------------------------------------------------------------------
// Verdict line
// ---------------------------------------------------------------------------

/// Writes the one-line verdict for a finished comparison.
///
/// Human format: `FAILED: 5 passed, 1 failed, 3 n/a (message 17)`. JSON
/// format: `{"verdict":{"status":"FAILED","passed":5,...}}`. Suppressed in
/// quiet mode.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_verdict<W: Write>(
    writer: &mut W,
    result: &ComparisonResult,
    format: OutputFormat,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    let tally = result.tally();
    match format {
        OutputFormat::Human => {
            write!(writer, "{}: {tally}", result.status)?;
            if let Some(id) = result.subject_message_id {
                write!(writer, " (message {id})")?;
            }
            let known = result
                .iter()
                .filter(|n| n.known_bug.is_some() && n.status == StatusType::Failed)
                .count();
            if known > 0 {
                write!(writer, ", {known} known bug(s)")?;
            }
            writeln!(writer)
        }
        OutputFormat::Json => {
            let line = serde_json::json!({
                "verdict": {
                    "status": result.status,
                    "passed": tally.passed,
                    "failed": tally.failed,
                    "na": tally.na,
                    "subject_message_id": result.subject_message_id,
                }
            });
            writeln!(writer, "{line}")
        }
    }
}

/// Writes the verdict line for the no-match outcome.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_no_match<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match format {
        OutputFormat::Human => writeln!(writer, "NO MATCH: key fields differ"),
        OutputFormat::Json => writeln!(writer, r#"{{"verdict":{{"status":"NO_MATCH"}}}}"#),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
