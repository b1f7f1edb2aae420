//! Documents and the vault that contains them

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::store::ContentStore;

/// Vault-relative identity of a document, always using `/` separators.
///
/// Ledger keys, namespace hashes and `data-path` attributes are all derived
/// from this value, so it stays stable when the vault directory moves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath(String);

impl DocumentPath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path.as_ref().replace('\\', "/");
        DocumentPath(normalized.trim_start_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory part of the path (empty for top-level documents)
    pub fn parent(&self) -> &str {
        self.0.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// Path segments with the file extension removed from the last one
    pub fn breadcrumb(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self.0.split('/').filter(|s| !s.is_empty()).collect();
        if let Some(last) = segments.last_mut() {
            if let Some((stem, _)) = last.rsplit_once('.') {
                if !stem.is_empty() {
                    *last = stem;
                }
            }
        }
        segments
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as read for one run
#[derive(Debug, Clone)]
pub struct Document {
    pub path: DocumentPath,
    pub content: String,
}

/// The markdown vault being scanned
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    name: String,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Vault {
            root: root.into(),
            name: name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute location of a document
    pub fn absolute(&self, doc: &DocumentPath) -> PathBuf {
        doc.as_str()
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |acc, seg| acc.join(seg))
    }

    /// Vault-relative identity of an absolute path, if it lies inside the vault
    pub fn relative(&self, path: &Path) -> Option<DocumentPath> {
        let rest = path.strip_prefix(&self.root).ok()?;
        let mut segments = Vec::new();
        for component in rest.components() {
            match component {
                Component::Normal(seg) => segments.push(seg.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    segments.pop()?;
                }
                _ => return None,
            }
        }
        if segments.is_empty() {
            return None;
        }
        Some(DocumentPath::new(segments.join("/")))
    }

    /// Load a document's current content
    pub fn load(&self, store: &dyn ContentStore, doc: &DocumentPath) -> Result<Document> {
        let content = store.read_to_string(&self.absolute(doc))?;
        Ok(Document {
            path: doc.clone(),
            content,
        })
    }

    /// All documents in the vault, sorted, skipping ignored directories and
    /// anything below `exclude` (the collection root when nested in the vault)
    #[tracing::instrument(skip_all, fields(vault = %self.root.display()))]
    pub fn documents(
        &self,
        store: &dyn ContentStore,
        config: &Config,
        exclude: Option<&Path>,
    ) -> Result<Vec<DocumentPath>> {
        let files = store.list_files(&self.root)?;
        let docs: Vec<DocumentPath> = files
            .iter()
            .filter(|p| !exclude.is_some_and(|ex| p.starts_with(ex)))
            .filter(|p| p.extension().is_some_and(|e| e == config.extension.as_str()))
            .filter_map(|p| self.relative(p))
            .filter(|doc| !is_ignored(doc, &config.ignore_dirs))
            .collect();
        tracing::debug!(count = docs.len(), "enumerated documents");
        Ok(docs)
    }
}

fn is_ignored(doc: &DocumentPath, ignore_dirs: &[String]) -> bool {
    let segments: Vec<&str> = doc.as_str().split('/').collect();
    let dirs = &segments[..segments.len().saturating_sub(1)];
    dirs.iter().any(|d| ignore_dirs.iter().any(|i| i == d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_document_path_normalizes_separators() {
        let doc = DocumentPath::new("\\Math\\Algebra\\Groups.md");
        assert_eq!(doc.as_str(), "Math/Algebra/Groups.md");
        assert_eq!(doc.parent(), "Math/Algebra");
    }

    #[test]
    fn test_breadcrumb_strips_extension() {
        let doc = DocumentPath::new("Math/Algebra/Groups.md");
        assert_eq!(doc.breadcrumb(), vec!["Math", "Algebra", "Groups"]);
    }

    #[test]
    fn test_breadcrumb_keeps_dotted_stems() {
        let doc = DocumentPath::new("Notes/v1.2 release.md");
        assert_eq!(doc.breadcrumb(), vec!["Notes", "v1.2 release"]);
    }

    #[test]
    fn test_absolute_and_relative_round_trip() {
        let vault = Vault::new("/vault", "vault");
        let doc = DocumentPath::new("a/b.md");
        let abs = vault.absolute(&doc);
        assert_eq!(abs, PathBuf::from("/vault/a/b.md"));
        assert_eq!(vault.relative(&abs), Some(doc));
    }

    #[test]
    fn test_relative_outside_vault() {
        let vault = Vault::new("/vault", "vault");
        assert_eq!(vault.relative(Path::new("/elsewhere/b.md")), None);
        assert_eq!(vault.relative(Path::new("/vault/../b.md")), None);
    }

    #[test]
    fn test_documents_skip_ignored_and_excluded() {
        let store = MemoryStore::new();
        store.insert("/vault/a.md", "", 1);
        store.insert("/vault/sub/b.md", "", 1);
        store.insert("/vault/.obsidian/c.md", "", 1);
        store.insert("/vault/cards/math/x.md", "", 1);
        store.insert("/vault/img.png", "", 1);

        let vault = Vault::new("/vault", "vault");
        let docs = vault
            .documents(&store, &Config::default(), Some(Path::new("/vault/cards")))
            .unwrap();
        let names: Vec<&str> = docs.iter().map(DocumentPath::as_str).collect();
        assert_eq!(names, vec!["a.md", "sub/b.md"]);
    }
}
