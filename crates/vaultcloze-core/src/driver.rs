//! Regeneration driver
//!
//! Walks the vault, asks the [`ChangeTracker`] which documents are stale and
//! runs each stale document through block-reference resolution, rendering,
//! extraction, identity resolution and artifact persistence. Every
//! per-document problem ends up in the [`RunReport`]; only failing to list
//! the vault aborts a run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::blockref::BlockReferenceResolver;
use crate::config::Config;
use crate::error::{ClozeError, Issue, Result};
use crate::extract::{self, ClozeMarker};
use crate::frontmatter;
use crate::layout::ArtifactLayout;
use crate::markers;
use crate::registry::{ClozeRegistry, ResolvedCloze};
use crate::render::RenderPipeline;
use crate::report::{ClozeOutcome, DocumentOutcome, DocumentStatus, RunReport};
use crate::store::ContentStore;
use crate::tracker::{ChangeTracker, RegenerationLedger, Staleness};
use crate::vault::{Document, DocumentPath, Vault};
use crate::writer::ArtifactWriter;

/// Mutable state threaded through one run and checkpointed per document
struct RunContext<'r> {
    ledger: RegenerationLedger,
    registry: ClozeRegistry<'r>,
}

/// Collaborators borrowed for the duration of a run
struct Stages<'r> {
    resolver: &'r BlockReferenceResolver<'r>,
    tracker: &'r ChangeTracker<'r>,
}

pub struct RegenerationDriver<'a> {
    store: &'a dyn ContentStore,
    config: &'a Config,
    vault: Vault,
    layout: ArtifactLayout,
    collection_root: PathBuf,
    pipeline: RenderPipeline<'a>,
    force: bool,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a> RegenerationDriver<'a> {
    pub fn new(
        store: &'a dyn ContentStore,
        config: &'a Config,
        vault: Vault,
        collection_root: &Path,
        pipeline: RenderPipeline<'a>,
    ) -> Self {
        RegenerationDriver {
            store,
            config,
            vault,
            layout: ArtifactLayout::new(collection_root),
            collection_root: collection_root.to_path_buf(),
            pipeline,
            force: false,
            interrupt: None,
        }
    }

    /// Process every document regardless of the ledger
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Stop between documents once `flag` is set
    pub fn interrupt_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn documents(&self) -> Result<Vec<DocumentPath>> {
        self.vault
            .documents(self.store, self.config, Some(self.collection_root.as_path()))
    }

    /// Regenerate every stale document
    #[tracing::instrument(skip(self), fields(vault = %self.vault.root().display(), force = self.force))]
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let documents = self.documents()?;
        let resolver = BlockReferenceResolver::new(self.store, &self.vault, &self.config.extension);
        let tracker = ChangeTracker::new(self.store, &self.vault, &self.layout, &resolver);
        let stages = Stages {
            resolver: &resolver,
            tracker: &tracker,
        };
        let mut ctx = RunContext {
            ledger: RegenerationLedger::load(self.store, &self.layout.ledger_path()),
            registry: ClozeRegistry::new(self.store, &self.layout, &self.vault, self.config),
        };

        let mut report = RunReport::default();
        report.counts.documents = documents.len();

        for doc in &documents {
            if self.interrupted() {
                tracing::warn!(document = %doc, "interrupted, stopping before document");
                report.interrupted = true;
                break;
            }

            let staleness = if self.force {
                Staleness::Forced
            } else {
                match tracker.evaluate(&ctx.ledger, doc) {
                    Ok(staleness) => staleness,
                    Err(e) => {
                        tracing::warn!(document = %doc, error = %e, "cannot evaluate document");
                        report.record(DocumentOutcome::failed(doc.clone(), Issue::from(e)));
                        continue;
                    }
                }
            };
            if !staleness.is_stale() {
                report.skip_fresh();
                continue;
            }

            tracing::debug!(document = %doc, staleness = ?staleness, "processing document");
            let mut outcome = self.process_document(&mut ctx, &stages, doc);
            if outcome.checkpointable() {
                if let Err(e) = self.checkpoint(&mut ctx.ledger, doc) {
                    tracing::warn!(document = %doc, error = %e, "failed to save ledger");
                    outcome.issues.push(Issue::from(e));
                }
            } else {
                tracing::warn!(document = %doc, "document not checkpointed, will retry next run");
            }
            report.record(outcome);
        }

        report.set_orphaned_documents(tracker.orphaned_documents(&documents));
        crate::trace_time!(start, "regeneration run");
        tracing::info!(
            processed = report.counts.processed,
            fresh = report.counts.fresh,
            failed = report.counts.failed,
            "regeneration finished"
        );
        Ok(report)
    }

    fn checkpoint(&self, ledger: &mut RegenerationLedger, doc: &DocumentPath) -> Result<()> {
        let modified = self
            .store
            .modified(&self.vault.absolute(doc))
            .unwrap_or(i64::MIN);
        ledger.mark_processed(doc, self.store.now().max(modified));
        ledger.save(self.store, &self.layout.ledger_path())
    }

    /// Run one document through the full pipeline
    #[tracing::instrument(skip(self, ctx, stages, doc), fields(document = %doc))]
    fn process_document(
        &self,
        ctx: &mut RunContext<'_>,
        stages: &Stages<'_>,
        doc: &DocumentPath,
    ) -> DocumentOutcome {
        let start = Instant::now();
        let document = match self.vault.load(self.store, doc) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read document");
                return DocumentOutcome::failed(doc.clone(), Issue::from(e));
            }
        };

        let mut outcome = DocumentOutcome::new(doc.clone());
        let resolution = stages.resolver.resolve(doc, &document.content);
        outcome.issues.extend(resolution.issues);

        if !markers::has_markers(&resolution.text) {
            outcome.status = DocumentStatus::NoClozes;
            outcome.orphans = stages.tracker.orphaned_folders(doc, &BTreeMap::new());
            return outcome;
        }

        for digits in markers::out_of_range_ids(&resolution.text) {
            let err = ClozeError::MarkerIdOutOfRange { digits };
            tracing::warn!(error = %err, "marker number ignored");
            outcome.issues.push(Issue::from(err));
        }

        let html = self.render(doc, &resolution.text, &mut outcome.issues);
        let found = extract::extract(&html, doc);
        let resolved = ctx.registry.resolve_all(doc, &found, &mut outcome.issues);

        let writer = ArtifactWriter::new(self.store);
        for (cloze, marker) in resolved.iter().zip(&found) {
            outcome.issues.extend(writer.persist(cloze, marker));
            outcome.clozes.push(ClozeOutcome {
                origin: cloze.namespace.origin.clone(),
                folder_id: cloze.folder_id,
                state: cloze.state,
            });
        }

        self.rewrite_source(&document, &found, &resolved, &mut outcome.issues);
        outcome.orphans = stages
            .tracker
            .orphaned_folders(doc, &ctx.registry.referenced_for(doc));

        crate::trace_time!(start, "process document", clozes = outcome.clozes.len());
        outcome
    }

    fn render(&self, doc: &DocumentPath, text: &str, issues: &mut Vec<Issue>) -> String {
        let doc_root = self.layout.document_root(doc);
        let writer = ArtifactWriter::new(self.store);
        issues.extend(writer.clear_images(&doc_root, &self.config.image_extension));

        let (_, body) = frontmatter::split(text);
        let (html, render_issues) = self.pipeline.render(body, &doc_root);
        issues.extend(render_issues);
        html
    }

    /// Write resolved folder numbers back into the document's own markers
    fn rewrite_source(
        &self,
        document: &Document,
        found: &[ClozeMarker],
        resolved: &[ResolvedCloze],
        issues: &mut Vec<Issue>,
    ) {
        let ids: Vec<u32> = found
            .iter()
            .zip(resolved)
            .filter(|(marker, _)| marker.is_from(&document.path))
            .map(|(_, cloze)| cloze.folder_id)
            .collect();

        let in_source = markers::scan(&document.content).len();
        if in_source != ids.len() {
            let err = ClozeError::InconsistentCount {
                expected: ids.len(),
                found: in_source,
            };
            tracing::warn!(document = %document.path, error = %err, "pairing markers best-effort");
            issues.push(Issue::from(err));
        }

        let rewritten = markers::rewrite_ids(&document.content, &ids);
        if rewritten == document.content {
            return;
        }

        let abs = self.vault.absolute(&document.path);
        if let Err(e) = self.store.write(&abs, rewritten.as_bytes()) {
            tracing::warn!(document = %document.path, error = %e, "failed to rewrite markers");
            issues.push(Issue::from(e));
        }
    }
}
