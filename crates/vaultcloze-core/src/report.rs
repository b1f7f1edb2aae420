//! Run results
//!
//! Per-document problems never abort a run; they are collected here and
//! reported by the caller.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{ErrorKind, Issue};
use crate::registry::ClozeState;
use crate::tracker::Staleness;
use crate::vault::DocumentPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Processed,
    NoClozes,
    Failed,
}

/// One cloze written during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClozeOutcome {
    pub origin: DocumentPath,
    pub folder_id: u32,
    pub state: ClozeState,
}

/// Result of processing one stale document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub document: DocumentPath,
    pub status: DocumentStatus,
    pub clozes: Vec<ClozeOutcome>,
    pub issues: Vec<Issue>,
    /// Cloze folders of this document that no marker bound this run
    pub orphans: Vec<PathBuf>,
}

impl DocumentOutcome {
    pub fn new(document: DocumentPath) -> Self {
        DocumentOutcome {
            document,
            status: DocumentStatus::Processed,
            clozes: Vec::new(),
            issues: Vec::new(),
            orphans: Vec::new(),
        }
    }

    pub fn failed(document: DocumentPath, issue: Issue) -> Self {
        DocumentOutcome {
            status: DocumentStatus::Failed,
            issues: vec![issue],
            ..Self::new(document)
        }
    }

    /// Whether the ledger may record this document as processed.
    ///
    /// Reference and count problems are content problems; rerunning would
    /// give the same result. I/O failures are retried next run.
    pub fn checkpointable(&self) -> bool {
        self.status != DocumentStatus::Failed
            && !self.issues.iter().any(|i| i.kind == ErrorKind::IoFailure)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub documents: usize,
    pub fresh: usize,
    pub processed: usize,
    pub no_clozes: usize,
    pub failed: usize,
    pub clozes: usize,
    pub issues: usize,
    pub orphans: usize,
}

/// Aggregated result of a regeneration run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<DocumentOutcome>,
    /// Document folders whose source document no longer exists
    pub orphaned_documents: Vec<PathBuf>,
    pub interrupted: bool,
    pub counts: RunCounts,
}

impl RunReport {
    pub fn record(&mut self, outcome: DocumentOutcome) {
        match outcome.status {
            DocumentStatus::Processed => self.counts.processed += 1,
            DocumentStatus::NoClozes => self.counts.no_clozes += 1,
            DocumentStatus::Failed => self.counts.failed += 1,
        }
        self.counts.clozes += outcome.clozes.len();
        self.counts.issues += outcome.issues.len();
        self.counts.orphans += outcome.orphans.len();
        self.outcomes.push(outcome);
    }

    pub fn skip_fresh(&mut self) {
        self.counts.fresh += 1;
    }

    pub fn set_orphaned_documents(&mut self, folders: Vec<PathBuf>) {
        self.counts.orphans += folders.len();
        self.orphaned_documents = folders;
    }

    pub fn outcome(&self, document: &DocumentPath) -> Option<&DocumentOutcome> {
        self.outcomes.iter().find(|o| &o.document == document)
    }

    pub fn has_issues(&self) -> bool {
        self.counts.issues > 0 || self.counts.failed > 0
    }
}

/// A document that would be processed by the next run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleDocument {
    pub document: DocumentPath,
    #[serde(flatten)]
    pub staleness: Staleness,
}

/// Read-only view of what the next run would do
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub documents: usize,
    pub stale: Vec<StaleDocument>,
    pub issues: Vec<Issue>,
    pub orphaned_documents: Vec<PathBuf>,
}
