//! Vaultcloze Core Library
//!
//! Identity resolution and incremental regeneration of cloze flashcard
//! artifacts from a markdown vault.

pub mod blockref;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod frontmatter;
pub mod layout;
pub mod logging;
pub mod markers;
pub mod registry;
pub mod render;
pub mod report;
pub mod status;
pub mod store;
pub mod tracker;
pub mod vault;
pub mod writer;
