//! Command dispatch logic for vaultcloze

use std::time::Instant;

use tracing::debug;
use vaultcloze_core::error::Result;

use crate::cli::{Cli, Commands};

mod command;

pub use command::{Command, CommandContext, NoCommand};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let ctx = CommandContext::new(cli, start);
    debug!(elapsed = ?start.elapsed(), "resolve_context");

    match &cli.command {
        None => NoCommand.execute(&ctx),
        Some(cmd) => cmd.execute(&ctx),
    }
}

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Commands::Init => crate::commands::init::execute(ctx),
            Commands::Regen { force } => crate::commands::regen::execute(ctx, *force),
            Commands::Status => crate::commands::status::execute(ctx),
        }
    }
}
