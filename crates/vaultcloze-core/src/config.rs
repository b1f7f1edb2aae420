//! Vault configuration for vaultcloze
//!
//! Configuration is read from `.vaultcloze.toml` at the vault root, with
//! command-line flags taking precedence over file values.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ClozeError, Result};

pub use types::{Config, CONFIG_FILE, CONFIG_FORMAT_VERSION};

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| ClozeError::io("read config", path, e))?;
        let config: Config = toml::from_str(&content).map_err(|e| ClozeError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if config.version > CONFIG_FORMAT_VERSION {
            tracing::warn!(
                version = config.version,
                supported = CONFIG_FORMAT_VERSION,
                "config written by a newer vaultcloze"
            );
        }

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClozeError::Other(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content).map_err(|e| ClozeError::io("write config", path, e))?;
        Ok(())
    }

    /// Load `.vaultcloze.toml` from the vault root, or defaults if absent
    pub fn discover(vault_root: &Path) -> Result<Self> {
        let path = vault_root.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading vault config");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply command-line overrides on top of file values
    pub fn with_overrides(mut self, vault_root: Option<PathBuf>, collection_root: Option<PathBuf>) -> Self {
        if vault_root.is_some() {
            self.vault_root = vault_root;
        }
        if collection_root.is_some() {
            self.collection_root = collection_root;
        }
        self
    }

    /// Vault and collection roots, both required to exist on disk
    pub fn require_roots(&self) -> Result<(PathBuf, PathBuf)> {
        let vault = self
            .vault_root
            .clone()
            .ok_or_else(|| ClozeError::UsageError("no vault root given (use --vault)".into()))?;
        let collection = self.collection_root.clone().ok_or_else(|| {
            ClozeError::UsageError("no collection root given (use --collection)".into())
        })?;

        if !vault.is_dir() {
            return Err(ClozeError::VaultNotFound { path: vault });
        }
        if !collection.is_dir() {
            return Err(ClozeError::CollectionNotFound { path: collection });
        }

        Ok((vault, collection))
    }

    /// Name shown in reference source labels
    pub fn vault_name_for(&self, vault_root: &Path) -> String {
        self.vault_name.clone().unwrap_or_else(|| {
            vault_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}
