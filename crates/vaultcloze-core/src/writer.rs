//! Artifact persistence
//!
//! Each cloze folder holds `question.html`, `answer.html` and `data.json`.
//! Both HTML files open with [`OWNERSHIP_MARKER`] so later runs can tell that
//! a file is still the one vaultcloze wrote.

use std::path::Path;

use crate::error::{ClozeError, Issue};
use crate::extract::ClozeMarker;
use crate::layout::ArtifactLayout;
use crate::registry::ResolvedCloze;
use crate::store::ContentStore;

/// Sentinel that opens every generated artifact file
pub const OWNERSHIP_MARKER: &str = "<!-- vaultcloze:generated -->";

/// Whether `path` exists and still carries the ownership marker
pub fn carries_ownership_marker(store: &dyn ContentStore, path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    match store.read_to_string(path) {
        Ok(content) => content.contains(OWNERSHIP_MARKER),
        Err(_) => false,
    }
}

/// Content of an artifact file as written to disk
pub fn with_ownership_marker(content: &str) -> String {
    format!("{}\n{}", OWNERSHIP_MARKER, content)
}

/// Writes cloze artifacts and metadata
pub struct ArtifactWriter<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> ArtifactWriter<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        ArtifactWriter { store }
    }

    /// Persist question, answer and metadata for one resolved cloze.
    ///
    /// A folder that cannot be created skips this cloze entirely; otherwise
    /// each file is attempted independently and failures are returned.
    #[tracing::instrument(skip_all, fields(folder = %cloze.folder.display()))]
    pub fn persist(&self, cloze: &ResolvedCloze, marker: &ClozeMarker) -> Vec<Issue> {
        if let Err(e) = self.store.create_dir(&cloze.folder) {
            tracing::warn!(error = %e, "cannot create cloze folder, skipping cloze");
            return vec![Issue::from(e)];
        }

        let mut issues = Vec::new();
        let record = &cloze.record;

        let files = [
            (&record.question_path, with_ownership_marker(&marker.question)),
            (&record.answer_path, with_ownership_marker(&marker.answer)),
        ];
        for (path, content) in files {
            if let Err(e) = self.store.write(path, content.as_bytes()) {
                tracing::warn!(path = %path.display(), error = %e, "failed to write artifact");
                issues.push(Issue::from(e));
            }
        }

        let metadata_path = ArtifactLayout::metadata_path(&cloze.folder);
        let written = serde_json::to_string_pretty(record)
            .map_err(ClozeError::from)
            .and_then(|json| self.store.write(&metadata_path, json.as_bytes()));
        if let Err(e) = written {
            tracing::warn!(path = %metadata_path.display(), error = %e, "failed to write metadata");
            issues.push(Issue::from(e));
        }

        issues
    }

    /// Remove previously rendered images directly inside `folder`
    pub fn clear_images(&self, folder: &Path, extension: &str) -> Vec<Issue> {
        let files = match self.store.list_files(folder) {
            Ok(files) => files,
            Err(e) if e.is_not_found() => return Vec::new(),
            Err(e) => return vec![Issue::from(e)],
        };

        files
            .iter()
            .filter(|p| p.parent() == Some(folder))
            .filter(|p| p.extension().is_some_and(|e| e == extension))
            .filter_map(|p| {
                tracing::debug!(path = %p.display(), "removing stale image");
                self.store.remove(p).err().map(Issue::from)
            })
            .collect()
    }
}
