//! Artifact folder layout inside the flashcard collection
//!
//! ```text
//! <collection>/math/
//!   history.json                      regeneration ledger
//!   <hash(document)>/                 one per processed document
//!     *.jpg                           rendered math snippets
//!     <hash(origin)>/                 one per origin document
//!       <n>/                          one per cloze
//!         question.html
//!         answer.html
//!         data.json
//! ```

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::vault::DocumentPath;

pub const MATH_DIR: &str = "math";
pub const LEDGER_FILE: &str = "history.json";
pub const METADATA_FILE: &str = "data.json";
pub const QUESTION_FILE: &str = "question.html";
pub const ANSWER_FILE: &str = "answer.html";

/// Length of the hex hash naming per-document folders
pub const PATH_HASH_LEN: usize = 15;

/// Stable folder name for a document path
pub fn path_hash(doc: &DocumentPath) -> String {
    let mut hasher = Sha256::new();
    hasher.update(doc.as_str().as_bytes());
    let full_hex = hex::encode(hasher.finalize());
    full_hex[..PATH_HASH_LEN].to_string()
}

/// The scope within which folder identities are unique: the document being
/// processed and the document a marker originally came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace {
    pub document: DocumentPath,
    pub origin: DocumentPath,
}

impl Namespace {
    pub fn new(document: DocumentPath, origin: DocumentPath) -> Self {
        Namespace { document, origin }
    }
}

/// Path builder for everything under `<collection>/math`
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    math_root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(collection_root: &Path) -> Self {
        ArtifactLayout {
            math_root: collection_root.join(MATH_DIR),
        }
    }

    pub fn math_root(&self) -> &Path {
        &self.math_root
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.math_root.join(LEDGER_FILE)
    }

    pub fn document_root(&self, doc: &DocumentPath) -> PathBuf {
        self.math_root.join(path_hash(doc))
    }

    pub fn namespace_root(&self, ns: &Namespace) -> PathBuf {
        self.document_root(&ns.document).join(path_hash(&ns.origin))
    }

    pub fn cloze_folder(&self, ns: &Namespace, folder_id: u32) -> PathBuf {
        self.namespace_root(ns).join(folder_id.to_string())
    }

    pub fn question_path(folder: &Path) -> PathBuf {
        folder.join(QUESTION_FILE)
    }

    pub fn answer_path(folder: &Path) -> PathBuf {
        folder.join(ANSWER_FILE)
    }

    pub fn metadata_path(folder: &Path) -> PathBuf {
        folder.join(METADATA_FILE)
    }
}
