//! Command trait and context for dispatching commands

use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use vaultcloze_core::config::{Config, CONFIG_FILE};
use vaultcloze_core::error::{ClozeError, Result};
use vaultcloze_core::vault::Vault;

use crate::cli::Cli;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub start: Instant,
}

/// Configuration and resolved roots for commands that touch the vault
pub struct Workspace {
    pub config: Config,
    pub vault: Vault,
    pub collection_root: PathBuf,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, start: Instant) -> Self {
        Self { cli, start }
    }

    /// Directory the vault is looked up in: `--vault` or the current directory
    pub fn vault_dir(&self) -> PathBuf {
        self.cli
            .vault
            .clone()
            .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Load the config file and apply command-line overrides
    pub fn config(&self) -> Result<Config> {
        let base = self.vault_dir();
        let mut config = match &self.cli.config {
            Some(path) => Config::load(path)?,
            None => Config::discover(&base)?,
        };

        if config.vault_root.is_none() && base.join(CONFIG_FILE).is_file() {
            config.vault_root = Some(base);
        }

        Ok(config.with_overrides(self.cli.vault.clone(), self.cli.collection.clone()))
    }

    /// Resolve config, vault and collection, requiring both roots to exist
    pub fn workspace(&self) -> Result<Workspace> {
        let config = self.config()?;
        let (vault_root, collection_root) = config.require_roots()?;
        let vault_root = canonical(&vault_root)?;
        let collection_root = canonical(&collection_root)?;

        let name = config.vault_name_for(&vault_root);
        tracing::debug!(
            vault = %vault_root.display(),
            collection = %collection_root.display(),
            elapsed = ?self.start.elapsed(),
            "resolved roots"
        );

        Ok(Workspace {
            vault: Vault::new(vault_root, name),
            collection_root,
            config,
        })
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .map_err(|e| ClozeError::io("resolve", path, e))
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("vaultcloze {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Incremental cloze flashcards from a markdown vault.");
        println!();
        println!("Run `vaultcloze --help` for usage information.");
        Ok(())
    }
}
