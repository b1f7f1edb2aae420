//! Cloze identity resolution
//!
//! Every cloze lives in a numbered folder inside its namespace (processed
//! document, origin document). A marker written as `c<n>` always maps to
//! folder `n`. A bare `c` takes the smallest positive number not claimed by
//! any other marker of the same namespace in the current pass, so numbers
//! freed by deleted markers are reused. When an explicit number repeats
//! within a namespace the first marker keeps it and the repeats are
//! allocated as if unassigned.

mod record;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{ClozeError, Issue};
use crate::extract::ClozeMarker;
use crate::frontmatter;
use crate::layout::{ArtifactLayout, Namespace};
use crate::markers::MarkerId;
use crate::store::ContentStore;
use crate::vault::{DocumentPath, Vault};
use crate::writer::carries_ownership_marker;

pub use record::{ClozeRecord, References};

/// Lifecycle of a cloze's artifacts as found at the start of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClozeState {
    /// No usable metadata existed
    New,
    /// Metadata existed but the collection has not imported it yet
    Pending,
    /// Imported and both artifacts are intact
    Imported,
    /// Recorded as imported but an artifact was deleted or edited
    Reverted,
}

/// A cloze bound to its folder, with metadata ready to persist
#[derive(Debug, Clone)]
pub struct ResolvedCloze {
    pub namespace: Namespace,
    pub folder_id: u32,
    pub folder: PathBuf,
    pub record: ClozeRecord,
    pub state: ClozeState,
}

/// Folder numbers for the markers of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderAllocation {
    /// One folder number per marker, in marker order
    pub ids: Vec<u32>,
    /// Positions of markers whose explicit number was already taken
    pub duplicates: Vec<usize>,
}

/// Assign a folder number to every marker of one document, in order.
///
/// The first marker carrying an explicit number keeps it. Unassigned
/// markers, and later markers repeating a number, take the smallest
/// positive number not used by another marker of their namespace.
pub fn allocate_folder_ids(markers: &[ClozeMarker]) -> FolderAllocation {
    let mut in_use: HashMap<&DocumentPath, BTreeSet<u32>> = HashMap::new();
    let mut duplicates = Vec::new();
    for (i, marker) in markers.iter().enumerate() {
        if let MarkerId::Numbered(n) = marker.id {
            if !in_use.entry(&marker.origin).or_default().insert(n) {
                duplicates.push(i);
            }
        }
    }

    let ids = markers
        .iter()
        .enumerate()
        .map(|(i, marker)| match marker.id {
            MarkerId::Numbered(n) if duplicates.binary_search(&i).is_err() => n,
            _ => {
                let used = in_use.entry(&marker.origin).or_default();
                let next = smallest_unused(used);
                used.insert(next);
                next
            }
        })
        .collect();

    FolderAllocation { ids, duplicates }
}

fn smallest_unused(used: &BTreeSet<u32>) -> u32 {
    let mut candidate = 1;
    for &n in used.range(1..) {
        if n != candidate {
            break;
        }
        candidate += 1;
    }
    candidate
}

/// Resolves marker identities and prior artifact state for a run
pub struct ClozeRegistry<'a> {
    store: &'a dyn ContentStore,
    layout: &'a ArtifactLayout,
    vault: &'a Vault,
    config: &'a Config,
    references: HashMap<DocumentPath, References>,
    referenced: BTreeMap<Namespace, BTreeSet<u32>>,
}

impl<'a> ClozeRegistry<'a> {
    pub fn new(
        store: &'a dyn ContentStore,
        layout: &'a ArtifactLayout,
        vault: &'a Vault,
        config: &'a Config,
    ) -> Self {
        ClozeRegistry {
            store,
            layout,
            vault,
            config,
            references: HashMap::new(),
            referenced: BTreeMap::new(),
        }
    }

    /// Resolve every marker found while processing `document`.
    ///
    /// Repeated explicit numbers are reported to `issues`.
    #[tracing::instrument(skip(self, document, markers, issues), fields(document = %document, markers = markers.len()))]
    pub fn resolve_all(
        &mut self,
        document: &DocumentPath,
        markers: &[ClozeMarker],
        issues: &mut Vec<Issue>,
    ) -> Vec<ResolvedCloze> {
        let allocation = allocate_folder_ids(markers);
        for &i in &allocation.duplicates {
            let marker = &markers[i];
            if let MarkerId::Numbered(id) = marker.id {
                let err = ClozeError::DuplicateMarkerId {
                    id,
                    origin: marker.origin.to_string(),
                    reassigned: allocation.ids[i],
                };
                tracing::warn!(error = %err, "repeated cloze id");
                issues.push(Issue::from(err));
            }
        }

        allocation
            .ids
            .into_iter()
            .zip(markers)
            .map(|(folder_id, marker)| {
                let ns = Namespace::new(document.clone(), marker.origin.clone());
                self.resolve(ns, folder_id)
            })
            .collect()
    }

    /// Bind one cloze to `folder_id` in `ns`, validating prior metadata
    pub fn resolve(&mut self, ns: Namespace, folder_id: u32) -> ResolvedCloze {
        let folder = self.layout.cloze_folder(&ns, folder_id);
        let (mut record, state) = self.validate(&folder);
        record.folder = folder.clone();
        record.references = self.references_for(&ns.origin);

        self.referenced
            .entry(ns.clone())
            .or_default()
            .insert(folder_id);

        tracing::debug!(folder_id, state = ?state, origin = %ns.origin, "resolved cloze");
        ResolvedCloze {
            namespace: ns,
            folder_id,
            folder,
            record,
            state,
        }
    }

    fn validate(&self, folder: &std::path::Path) -> (ClozeRecord, ClozeState) {
        let Some(prior) = ClozeRecord::load(self.store, folder) else {
            return (ClozeRecord::fresh(folder), ClozeState::New);
        };

        if !prior.imported {
            return (ClozeRecord::fresh(folder), ClozeState::Pending);
        }

        let intact = carries_ownership_marker(self.store, &prior.question_path)
            && carries_ownership_marker(self.store, &prior.answer_path);
        if intact {
            (prior, ClozeState::Imported)
        } else {
            tracing::info!(
                folder = %folder.display(),
                "imported artifacts were deleted or edited, regenerating"
            );
            (ClozeRecord::fresh(folder), ClozeState::Reverted)
        }
    }

    /// Reference metadata for clozes that came from `origin`
    pub fn references_for(&mut self, origin: &DocumentPath) -> References {
        if let Some(cached) = self.references.get(origin) {
            return cached.clone();
        }

        let abs = self.vault.absolute(origin);
        let title = self
            .store
            .read_to_string(&abs)
            .ok()
            .and_then(|content| frontmatter::title(&content))
            .unwrap_or_else(|| origin.breadcrumb().join(": "));

        let references = References {
            link: format!(
                "{}{}",
                self.config.link_prefix,
                urlencoding::encode(&abs.to_string_lossy())
            ),
            title,
            source: format!("{}{}", self.config.source_prefix, self.vault.name()),
        };
        self.references.insert(origin.clone(), references.clone());
        references
    }

    /// Folder numbers bound for namespaces of `document`
    pub fn referenced_for(&self, document: &DocumentPath) -> BTreeMap<DocumentPath, BTreeSet<u32>> {
        self.referenced
            .iter()
            .filter(|(ns, _)| &ns.document == document)
            .map(|(ns, ids)| (ns.origin.clone(), ids.clone()))
            .collect()
    }
}
