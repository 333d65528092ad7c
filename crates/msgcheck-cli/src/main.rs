//! `msgcheck`: compare decoded protocol messages against expected templates.
use clap::Parser as _;
use tracing_subscriber::EnvFilter;

mod cli;
mod cmd;
mod error;
mod format;
mod io;

pub use cli::{Cli, Command, CompareArgs, OutputFormat, PathOrStdin};

use error::CliError;
use format::FormatterConfig;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

/// Logs go to stderr so stdout carries only the report. `RUST_LOG` wins
/// over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Compare(args) => {
            let config = FormatterConfig::from_flags(cli.no_color, cli.quiet);
            cmd::compare::run(args, cli.format, &config, cli.max_file_size)
        }
        Command::Version => {
            println!("{}", msgcheck_core::version());
            Ok(())
        }
    }
}
