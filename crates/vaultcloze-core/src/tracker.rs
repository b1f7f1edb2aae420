//! Incremental regeneration tracking
//!
//! The ledger maps every processed document to the time it was last
//! processed. A document is stale when it, or any document it embeds a
//! block from, changed after that time.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::blockref::BlockReferenceResolver;
use crate::error::Result;
use crate::layout::{path_hash, ArtifactLayout, PATH_HASH_LEN};
use crate::store::ContentStore;
use crate::vault::{DocumentPath, Vault};

/// Persisted last-processed time per document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationLedger {
    entries: BTreeMap<DocumentPath, i64>,
}

impl RegenerationLedger {
    /// Load the ledger stored at `path`.
    ///
    /// A missing or corrupt ledger is treated as empty, which makes every
    /// document stale.
    pub fn load(store: &dyn ContentStore, path: &Path) -> Self {
        let text = match store.read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %path.display(), "no ledger yet");
                return Self::default();
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable ledger, starting fresh");
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(entries) => RegenerationLedger { entries },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt ledger, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn ContentStore, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        store.write(path, json.as_bytes())
    }

    pub fn last_processed(&self, doc: &DocumentPath) -> Option<i64> {
        self.entries.get(doc).copied()
    }

    pub fn mark_processed(&mut self, doc: &DocumentPath, timestamp: i64) {
        self.entries.insert(doc.clone(), timestamp);
    }
}

/// Why a document needs processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "reference", rename_all = "snake_case")]
pub enum Staleness {
    /// Processed since its last change
    Fresh,
    /// Not in the ledger
    NeverProcessed,
    /// Changed after it was last processed
    Modified,
    /// A document it embeds a block from changed
    ReferenceModified(DocumentPath),
    /// Processing requested regardless of the ledger
    Forced,
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        !matches!(self, Staleness::Fresh)
    }
}

/// Decides staleness and finds orphaned artifact folders
pub struct ChangeTracker<'a> {
    store: &'a dyn ContentStore,
    vault: &'a Vault,
    layout: &'a ArtifactLayout,
    resolver: &'a BlockReferenceResolver<'a>,
}

impl<'a> ChangeTracker<'a> {
    pub fn new(
        store: &'a dyn ContentStore,
        vault: &'a Vault,
        layout: &'a ArtifactLayout,
        resolver: &'a BlockReferenceResolver<'a>,
    ) -> Self {
        ChangeTracker {
            store,
            vault,
            layout,
            resolver,
        }
    }

    /// Evaluate whether `doc` must be processed
    pub fn evaluate(&self, ledger: &RegenerationLedger, doc: &DocumentPath) -> Result<Staleness> {
        let Some(last) = ledger.last_processed(doc) else {
            return Ok(Staleness::NeverProcessed);
        };

        let abs = self.vault.absolute(doc);
        if self.store.modified(&abs)? > last {
            return Ok(Staleness::Modified);
        }

        let content = self.store.read_to_string(&abs)?;
        for referenced in self.resolver.referenced_documents(doc, &content) {
            let modified = self.store.modified(&self.vault.absolute(&referenced))?;
            if modified > last {
                tracing::debug!(document = %doc, reference = %referenced, "embedded document changed");
                return Ok(Staleness::ReferenceModified(referenced));
            }
        }

        Ok(Staleness::Fresh)
    }

    /// Cloze folders under `doc` that the current pass did not bind.
    ///
    /// `referenced` maps each origin document to the folder numbers bound
    /// for it while processing `doc`.
    pub fn orphaned_folders(
        &self,
        doc: &DocumentPath,
        referenced: &BTreeMap<DocumentPath, BTreeSet<u32>>,
    ) -> Vec<PathBuf> {
        let doc_root = self.layout.document_root(doc);
        let by_hash: BTreeMap<String, &BTreeSet<u32>> = referenced
            .iter()
            .map(|(origin, ids)| (path_hash(origin), ids))
            .collect();

        let mut orphans = Vec::new();
        for origin_hash in self.list_dirs_or_empty(&doc_root) {
            let origin_root = doc_root.join(&origin_hash);
            let bound = by_hash.get(&origin_hash);
            for name in self.list_dirs_or_empty(&origin_root) {
                let Ok(id) = name.parse::<u32>() else { continue };
                if !bound.is_some_and(|ids| ids.contains(&id)) {
                    orphans.push(origin_root.join(&name));
                }
            }
        }

        for folder in &orphans {
            tracing::info!(document = %doc, folder = %folder.display(), "orphaned cloze folder");
        }
        orphans
    }

    /// Document folders whose source document no longer exists
    pub fn orphaned_documents(&self, documents: &[DocumentPath]) -> Vec<PathBuf> {
        let live: HashSet<String> = documents.iter().map(path_hash).collect();
        let orphans: Vec<PathBuf> = self
            .list_dirs_or_empty(self.layout.math_root())
            .into_iter()
            .filter(|name| is_path_hash(name) && !live.contains(name))
            .map(|name| self.layout.math_root().join(name))
            .collect();

        for folder in &orphans {
            tracing::info!(folder = %folder.display(), "orphaned document folder");
        }
        orphans
    }

    fn list_dirs_or_empty(&self, dir: &Path) -> Vec<String> {
        match self.store.list_dirs(dir) {
            Ok(names) => names,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot list folder");
                Vec::new()
            }
        }
    }
}

fn is_path_hash(name: &str) -> bool {
    name.len() == PATH_HASH_LEN && name.bytes().all(|b| b.is_ascii_hexdigit())
}
