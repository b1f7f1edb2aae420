//! Configuration type definitions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Name of the per-vault config file
pub const CONFIG_FILE: &str = ".vaultcloze.toml";

/// Vault and collection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config format version for compatibility checking
    #[serde(default = "default_version")]
    pub version: u32,

    /// Root of the markdown vault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_root: Option<PathBuf>,

    /// Root of the flashcard collection that receives artifacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_root: Option<PathBuf>,

    /// Display name of the vault (defaults to the vault directory name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_name: Option<String>,

    /// Prefix of the deep link written into cloze references
    #[serde(default = "default_link_prefix")]
    pub link_prefix: String,

    /// Prefix of the source label written into cloze references
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,

    /// Directory names skipped while enumerating documents
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// Document file extension
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Extension of generated math images, cleared before re-rendering
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
}

fn default_version() -> u32 {
    CONFIG_FORMAT_VERSION
}

fn default_link_prefix() -> String {
    "obsidian://open?path=".to_string()
}

fn default_source_prefix() -> String {
    "Obsidian Vault: ".to_string()
}

fn default_ignore_dirs() -> Vec<String> {
    vec![
        ".obsidian".to_string(),
        ".trash".to_string(),
        ".git".to_string(),
    ]
}

fn default_extension() -> String {
    "md".to_string()
}

fn default_image_extension() -> String {
    "jpg".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: default_version(),
            vault_root: None,
            collection_root: None,
            vault_name: None,
            link_prefix: default_link_prefix(),
            source_prefix: default_source_prefix(),
            ignore_dirs: default_ignore_dirs(),
            extension: default_extension(),
            image_extension: default_image_extension(),
        }
    }
}
