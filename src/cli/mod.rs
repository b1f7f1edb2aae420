//! CLI argument parsing for vaultcloze
//!
//! Global flags: --vault, --collection, --config, --format, --quiet,
//! --verbose, --log-level, --log-json

pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

/// Vaultcloze - incremental cloze flashcards from a markdown vault
#[derive(Parser, Debug)]
#[command(name = "vaultcloze")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root of the markdown vault (defaults to the current directory)
    #[arg(long, global = true, env = "VAULTCLOZE_VAULT")]
    pub vault: Option<PathBuf>,

    /// Root of the flashcard collection receiving artifacts
    #[arg(long, global = true, env = "VAULTCLOZE_COLLECTION")]
    pub collection: Option<PathBuf>,

    /// Explicit config file instead of <vault>/.vaultcloze.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. `info`, `vaultcloze_core=trace`)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default .vaultcloze.toml into the vault
    Init,

    /// Regenerate artifacts for documents changed since the last run
    Regen {
        /// Process every document, ignoring the ledger
        #[arg(long)]
        force: bool,
    },

    /// Show stale documents and orphaned folders without writing anything
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_regen_with_globals() {
        let cli = Cli::try_parse_from([
            "vaultcloze",
            "regen",
            "--force",
            "--vault",
            "/v",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Regen { force: true })));
        assert_eq!(cli.vault, Some(PathBuf::from("/v")));
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
