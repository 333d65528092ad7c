//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use msgcheck_core::UnexpectedPolicy;

/// A CLI argument that is either a filesystem path or the stdin sentinel `"-"`.
///
/// Parsing `"-"` yields [`PathOrStdin::Stdin`]; anything else yields
/// [`PathOrStdin::Path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

impl PathOrStdin {
    /// Label used in error messages: the path, or `-` for stdin.
    pub fn label(&self) -> String {
        match self {
            Self::Stdin => "-".to_owned(),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

/// Output format for the comparison report.
///
/// `Human` prints the indented result tree to stdout and a one-line verdict
/// to stderr. `Json` prints the result tree as a JSON document to stdout and
/// the verdict as a single-line JSON object to stderr.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, optionally colored output (default).
    Human,
    /// Structured JSON output.
    Json,
}

/// Arguments of `msgcheck compare`.
#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Decoded message (JSON, or YAML by extension), or `-` for stdin.
    #[arg(long, value_name = "FILE")]
    pub message: PathOrStdin,

    /// Expected template, or `-` for stdin.
    #[arg(long, value_name = "FILE")]
    pub filter: PathOrStdin,

    /// Comparator settings; defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathOrStdin>,

    /// List of known bugs used to annotate failures.
    #[arg(long, value_name = "FILE")]
    pub known_bugs: Option<PathOrStdin>,

    /// Enum dictionary mapping field values to aliases.
    #[arg(long, value_name = "FILE")]
    pub dictionary: Option<PathOrStdin>,

    /// Pair repeating-group entries by position instead of by best match.
    #[arg(long)]
    pub check_group_order: bool,

    /// Policy for fields and entries present on one side only.
    #[arg(long, value_name = "N|Y|A")]
    pub fail_unexpected: Option<UnexpectedPolicy>,

    /// Report this field as NA wherever it occurs (repeatable).
    #[arg(long, value_name = "FIELD")]
    pub ignore: Vec<String>,

    /// Treat this field as unchecked bookkeeping, reported NA (repeatable).
    #[arg(long, value_name = "FIELD")]
    pub unchecked: Vec<String>,

    /// Translate enum codes through the dictionary before comparing.
    #[arg(long, requires = "dictionary")]
    pub translate_enums: bool,
}

/// All top-level subcommands exposed by the `msgcheck` binary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare a decoded message against an expected template.
    Compare(CompareArgs),

    /// Print the msgcheck-core library version.
    Version,
}

/// Root CLI struct for the `msgcheck` binary.
///
/// All global flags are defined here and marked `global = true` so that clap
/// propagates them to every subcommand.
#[derive(Parser, Debug)]
#[command(
    name = "msgcheck",
    version,
    about = "Compare decoded protocol messages against expected templates",
    long_about = "Compares a decoded message tree against an expected template under\n\
                  per-field settings (key fields, tolerances, group ordering and\n\
                  unexpected-field policy) and reports a PASSED/FAILED/NA verdict tree."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format: human (default) or json.
    #[arg(long, short = 'f', default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Suppress the verdict line on stderr (incompatible with `--verbose`).
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log engine decisions to stderr at debug level (incompatible with
    /// `--quiet`). `RUST_LOG` takes precedence when set.
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Maximum input file size in bytes.
    ///
    /// Can also be set via the `MSGCHECK_MAX_FILE_SIZE` environment variable.
    /// The CLI flag takes precedence over the environment variable.
    /// Default: 67108864 (64 MB).
    #[arg(
        long,
        global = true,
        env = "MSGCHECK_MAX_FILE_SIZE",
        default_value = "67108864"
    )]
    pub max_file_size: u64,

    /// Disable ANSI color codes in human output.
    ///
    /// Also respects the `NO_COLOR` environment variable per
    /// <https://no-color.org>.
    #[arg(long, global = true, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,
}
