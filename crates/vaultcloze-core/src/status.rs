//! Read-only view of what the next regeneration would do
//!
//! Status needs the ledger, the vault listing and block references for
//! transitive staleness, but never renders or writes.

use std::path::{Path, PathBuf};

use crate::blockref::BlockReferenceResolver;
use crate::config::Config;
use crate::error::{Issue, Result};
use crate::layout::ArtifactLayout;
use crate::report::{StaleDocument, StatusReport};
use crate::store::ContentStore;
use crate::tracker::{ChangeTracker, RegenerationLedger};
use crate::vault::Vault;

pub struct StatusScanner<'a> {
    store: &'a dyn ContentStore,
    config: &'a Config,
    vault: Vault,
    layout: ArtifactLayout,
    collection_root: PathBuf,
}

impl<'a> StatusScanner<'a> {
    pub fn new(
        store: &'a dyn ContentStore,
        config: &'a Config,
        vault: Vault,
        collection_root: &Path,
    ) -> Self {
        StatusScanner {
            store,
            config,
            vault,
            layout: ArtifactLayout::new(collection_root),
            collection_root: collection_root.to_path_buf(),
        }
    }

    /// Report stale documents and orphaned document folders
    #[tracing::instrument(skip(self), fields(vault = %self.vault.root().display()))]
    pub fn scan(&self) -> Result<StatusReport> {
        let documents = self.vault.documents(
            self.store,
            self.config,
            Some(self.collection_root.as_path()),
        )?;
        let resolver = BlockReferenceResolver::new(self.store, &self.vault, &self.config.extension);
        let tracker = ChangeTracker::new(self.store, &self.vault, &self.layout, &resolver);
        let ledger = RegenerationLedger::load(self.store, &self.layout.ledger_path());

        let mut report = StatusReport {
            documents: documents.len(),
            ..StatusReport::default()
        };
        for doc in &documents {
            match tracker.evaluate(&ledger, doc) {
                Ok(staleness) if staleness.is_stale() => report.stale.push(StaleDocument {
                    document: doc.clone(),
                    staleness,
                }),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(document = %doc, error = %e, "cannot evaluate document");
                    report.issues.push(Issue::from(e));
                }
            }
        }
        report.orphaned_documents = tracker.orphaned_documents(&documents);
        Ok(report)
    }
}
