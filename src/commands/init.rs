//! `vaultcloze init` - write a default config into the vault
//!
//! Idempotent: an existing config file is left untouched.

use vaultcloze_core::config::{Config, CONFIG_FILE};
use vaultcloze_core::error::{ClozeError, Result};

use crate::cli::OutputFormat;
use crate::commands::dispatch::CommandContext;

/// Execute the init command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let vault_dir = ctx.vault_dir();
    if !vault_dir.is_dir() {
        return Err(ClozeError::VaultNotFound { path: vault_dir });
    }

    let path = vault_dir.join(CONFIG_FILE);
    let created = !path.exists();
    if created {
        let config = Config {
            collection_root: ctx.cli.collection.clone(),
            ..Config::default()
        };
        config.save(&path)?;
        tracing::info!(path = %path.display(), "wrote default config");
    }

    match ctx.cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "config": path.display().to_string(),
                "created": created,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if ctx.cli.quiet {
                return Ok(());
            }
            if created {
                println!("Initialized vaultcloze config at {}", path.display());
            } else {
                println!("Config already exists at {}", path.display());
            }
        }
    }
    Ok(())
}
