/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `msgcheck` binary. Every
/// variant maps to a stable exit code via [`CliError::exit_code`]:
///
/// - Exit code **2**: input failure. The tool could not read or parse an
///   input, or the settings violate the engine's contract. Nothing was
///   compared.
/// - Exit code **1**: the comparison ran and at least one field failed.
/// - Exit code **3**: the filter's key fields did not match, so the filter
///   does not describe this message at all.
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions that the `msgcheck` CLI can produce.
///
/// Use [`CliError::exit_code`] to obtain the exit code associated with each
/// variant. [`CliError::message`] returns the human-readable error string
/// that should be printed to stderr before exiting.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument could not be found on the filesystem.
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The process lacks permission to read a file.
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// The input exceeds the configured `--max-file-size` limit.
    FileTooLarge {
        /// A human-readable label for the source (`"-"` for stdin, or the
        /// filesystem path).
        source: String,
        /// The configured size limit in bytes.
        limit: u64,
        /// The actual size in bytes, if known (disk files only).
        actual: Option<u64>,
    },

    /// The input bytes are not valid UTF-8.
    InvalidUtf8 {
        /// A human-readable label for the source.
        source: String,
        /// The byte offset of the first invalid byte sequence.
        byte_offset: usize,
    },

    /// An I/O error occurred while reading from stdin.
    StdinReadError {
        /// The underlying I/O error message.
        detail: String,
    },

    /// A generic I/O error not covered by the more specific variants above.
    IoError {
        /// A human-readable label for the source.
        source: String,
        /// The underlying I/O error message.
        detail: String,
    },

    /// An input document is not valid JSON/YAML for the expected type.
    ParseFailed {
        /// A human-readable label for the source.
        source: String,
        /// Parser error, including the location when known.
        detail: String,
    },

    /// The command-line arguments are inconsistent.
    InvalidArguments {
        /// What is wrong with them.
        detail: String,
    },

    /// The engine rejected the settings before comparing.
    InvalidSettings {
        /// The engine's error message.
        detail: String,
    },

    // --- Exit code 1: failed verdict ---
    /// The comparison finished with a `FAILED` verdict.
    ///
    /// The report has already been printed; this variant exists so `main`
    /// can exit with the right code.
    ComparisonFailed {
        /// Number of failed leaves.
        failed: usize,
    },

    // --- Exit code 3: no match ---
    /// A key field did not match; the filter does not identify the message.
    NoMatch,
}

impl CliError {
    /// Returns the process exit code for this error.
    ///
    /// - `2`: input failure (file not found, parse error, bad settings).
    /// - `1`: the verdict is `FAILED`.
    /// - `3`: the filter does not identify the message.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::FileTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::StdinReadError { .. }
            | Self::IoError { .. }
            | Self::ParseFailed { .. }
            | Self::InvalidArguments { .. }
            | Self::InvalidSettings { .. } => 2,

            Self::ComparisonFailed { .. } => 1,

            Self::NoMatch => 3,
        }
    }

    /// Returns a human-readable error message suitable for printing to stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("error: file not found: {}", path.display())
            }
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: Some(actual),
            } => {
                format!("error: file too large: {source} is {actual} bytes, limit is {limit} bytes")
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: None,
            } => {
                format!("error: file too large: {source} exceeded limit of {limit} bytes")
            }
            Self::InvalidUtf8 {
                source,
                byte_offset,
            } => {
                format!(
                    "error: invalid UTF-8 in {source}: first invalid byte at offset {byte_offset}"
                )
            }
            Self::StdinReadError { detail } => {
                format!("error: failed to read stdin: {detail}")
            }
            Self::IoError { source, detail } => {
                format!("error: I/O error reading {source}: {detail}")
            }
            Self::ParseFailed { source, detail } => {
                format!("error: failed to parse {source}: {detail}")
            }
            Self::InvalidArguments { detail } => format!("error: {detail}"),
            Self::InvalidSettings { detail } => format!("error: invalid settings: {detail}"),
            Self::ComparisonFailed { failed } => {
                format!("error: comparison failed with {failed} failed field(s)")
            }
            Self::NoMatch => {
                "error: no match: key fields differ, the filter does not identify this message"
                    .to_owned()
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

impl From<msgcheck_core::CompareError> for CliError {
    fn from(e: msgcheck_core::CompareError) -> Self {
        Self::InvalidSettings {
            detail: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
