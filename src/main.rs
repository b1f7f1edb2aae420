//! Vaultcloze - cloze flashcards from a markdown vault
//!
//! Turns `<c>…</c>` markers in vault notes into question/answer artifacts
//! for a flashcard collection, regenerating only what changed.

mod cli;
mod commands;

use std::env;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use cli::{Cli, OutputFormat};
use vaultcloze_core::error::{ClozeError, ExitCode as ClozeExitCode};
use vaultcloze_core::logging;

fn main() -> ExitCode {
    let start = Instant::now();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if argv_requests_json() => return parse_failure_as_json(err),
        Err(err) => err.exit(),
    };

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("warning: logging disabled: {}", e);
    }
    tracing::debug!(elapsed = ?start.elapsed(), "arguments parsed");

    let code = match commands::dispatch::run(&cli, start) {
        Ok(()) => ClozeExitCode::Success,
        Err(e) => {
            report_error(&cli, &e);
            e.exit_code()
        }
    };
    ExitCode::from(code as u8)
}

/// Print a clap failure as the JSON error envelope.
///
/// Help and version output is not an error and goes through clap.
fn parse_failure_as_json(err: clap::Error) -> ExitCode {
    use clap::error::ErrorKind as ClapKind;

    let error = match err.kind() {
        ClapKind::DisplayHelp | ClapKind::DisplayVersion => err.exit(),
        ClapKind::InvalidSubcommand
        | ClapKind::UnknownArgument
        | ClapKind::InvalidValue
        | ClapKind::ValueValidation
        | ClapKind::MissingRequiredArgument
        | ClapKind::ArgumentConflict => ClozeError::UsageError(err.to_string()),
        _ => ClozeError::Other(err.to_string()),
    };
    eprintln!("{}", error.to_json());
    ExitCode::from(error.exit_code() as u8)
}

fn report_error(cli: &Cli, e: &ClozeError) {
    match cli.format {
        OutputFormat::Json => eprintln!("{}", e.to_json()),
        OutputFormat::Human if !cli.quiet => eprintln!("error: {}", e),
        OutputFormat::Human => {}
    }
}

/// Whether argv asks for JSON output, checked before clap has parsed it
fn argv_requests_json() -> bool {
    let args: Vec<String> = env::args().skip(1).collect();
    args.iter().any(|a| a == "--format=json")
        || args.windows(2).any(|w| w[0] == "--format" && w[1] == "json")
}
