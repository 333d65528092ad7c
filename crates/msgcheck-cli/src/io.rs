/// Input loading: size-capped reads, UTF-8 validation, and JSON/YAML
/// decoding of messages, filters, settings and side tables.
///
/// This module is the single entry point for all input I/O in the
/// `msgcheck` binary. `msgcheck-core` never touches the filesystem.
///
/// Key behaviours:
/// - Disk files: size checked via `std::fs::metadata` before any read.
/// - Stdin: buffered with a `Read::take` cap so allocation is bounded.
/// - Documents ending in `.yaml`/`.yml` are decoded with `serde_yaml`;
///   everything else, stdin included, with `serde_json`.
/// - All failures are converted to [`CliError`] variants with exit code 2.
use std::io::Read as _;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::PathOrStdin;
use crate::error::CliError;

/// Encoding of an input document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON, via `serde_json`.
    Json,
    /// YAML, via `serde_yaml`.
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from the file extension; stdin is always JSON.
    pub fn for_source(source: &PathOrStdin) -> Self {
        let PathOrStdin::Path(path) = source else {
            return Self::Json;
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            Some(_) | None => Self::Json,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reads and decodes one document from `source`.
///
/// # Errors
///
/// Any [`read_input`] failure, or [`CliError::ParseFailed`] when the text
/// does not decode as `T`.
pub fn load<T: DeserializeOwned>(source: &PathOrStdin, max_size: u64) -> Result<T, CliError> {
    let text = read_input(source, max_size)?;
    let format = DocumentFormat::for_source(source);
    debug!(source = %source.label(), ?format, bytes = text.len(), "loaded input");
    parse_document(&text, format, &source.label())
}

/// Decodes `text` as `T`.
///
/// # Errors
///
/// [`CliError::ParseFailed`] naming `label` and the parser's location.
pub fn parse_document<T: DeserializeOwned>(
    text: &str,
    format: DocumentFormat,
    label: &str,
) -> Result<T, CliError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| CliError::ParseFailed {
            source: label.to_owned(),
            detail: format!("line {}, column {}: {e}", e.line(), e.column()),
        }),
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| CliError::ParseFailed {
            source: label.to_owned(),
            detail: e.to_string(),
        }),
    }
}

/// Reads the entire contents of `source` into a `String`.
///
/// For disk files the file length is checked against `max_size` via
/// `std::fs::metadata` before any bytes are read. For stdin a capped reader
/// (`Read::take`) is used so that the allocation is bounded.
///
/// # Errors
///
/// Returns [`CliError`] (exit code 2) for:
/// - file not found
/// - permission denied
/// - file or stdin stream exceeds `max_size`
/// - any other I/O error
/// - invalid UTF-8 (includes byte offset of the first bad sequence)
pub fn read_input(source: &PathOrStdin, max_size: u64) -> Result<String, CliError> {
    match source {
        PathOrStdin::Path(path) => read_file(path, max_size),
        PathOrStdin::Stdin => read_stdin(max_size),
    }
}

// ---------------------------------------------------------------------------
// Disk file reading
// ---------------------------------------------------------------------------

fn read_file(path: &Path, max_size: u64) -> Result<String, CliError> {
    let file_size = std::fs::metadata(path)
        .map_err(|e| io_error_to_cli(&e, path))?
        .len();

    if file_size > max_size {
        return Err(CliError::FileTooLarge {
            source: path.display().to_string(),
            limit: max_size,
            actual: Some(file_size),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| io_error_to_cli(&e, path))?;
    bytes_to_string(&bytes, &path.display().to_string())
}

/// Maps a `std::io::Error` arising from a disk-file operation to a [`CliError`].
fn io_error_to_cli(e: &std::io::Error, path: &Path) -> CliError {
    let kind = e.kind();
    if kind == std::io::ErrorKind::NotFound {
        CliError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else if kind == std::io::ErrorKind::PermissionDenied {
        CliError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stdin reading
// ---------------------------------------------------------------------------

/// Reads the entire stdin stream, capped at `max_size` bytes.
///
/// If the stream produces exactly `max_size` bytes one more byte is probed
/// to tell "at the limit" from "over the limit".
fn read_stdin(max_size: u64) -> Result<String, CliError> {
    let stdin_err = |e: std::io::Error| CliError::StdinReadError {
        detail: e.to_string(),
    };
    let mut handle = std::io::stdin().lock();
    let mut buf: Vec<u8> = Vec::new();
    (&mut handle)
        .take(max_size)
        .read_to_end(&mut buf)
        .map_err(stdin_err)?;

    if buf.len() as u64 == max_size {
        let mut probe = [0u8; 1];
        if handle.read(&mut probe).map_err(stdin_err)? > 0 {
            return Err(CliError::FileTooLarge {
                source: "-".to_owned(),
                limit: max_size,
                actual: None,
            });
        }
    }

    bytes_to_string(&buf, "-")
}

// ---------------------------------------------------------------------------
// UTF-8 conversion
// ---------------------------------------------------------------------------

fn bytes_to_string(bytes: &[u8], source_label: &str) -> Result<String, CliError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_owned()),
        Err(e) => Err(CliError::InvalidUtf8 {
            source: source_label.to_owned(),
            byte_offset: e.valid_up_to(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
