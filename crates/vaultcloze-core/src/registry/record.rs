//! Persisted per-cloze metadata (`data.json`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout::ArtifactLayout;
use crate::store::ContentStore;

/// Where a cloze came from, as shown by the flashcard collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct References {
    #[serde(rename = "Link", default)]
    pub link: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Source", default)]
    pub source: String,
}

/// Metadata stored in every cloze folder.
///
/// `imported` is flipped to true by the flashcard collection once it has
/// taken the artifacts in; vaultcloze only ever resets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClozeRecord {
    #[serde(default)]
    pub imported: bool,
    #[serde(default)]
    pub question_path: PathBuf,
    #[serde(default)]
    pub answer_path: PathBuf,
    #[serde(default)]
    pub folder: PathBuf,
    #[serde(default)]
    pub references: References,
}

impl ClozeRecord {
    /// A fresh record pointing at the standard artifact files of `folder`
    pub fn fresh(folder: &Path) -> Self {
        ClozeRecord {
            imported: false,
            question_path: ArtifactLayout::question_path(folder),
            answer_path: ArtifactLayout::answer_path(folder),
            folder: folder.to_path_buf(),
            references: References::default(),
        }
    }

    /// Load the record stored in `folder`.
    ///
    /// A missing or unparseable file yields `None`; neither is an error.
    pub fn load(store: &dyn ContentStore, folder: &Path) -> Option<Self> {
        let path = ArtifactLayout::metadata_path(folder);
        let text = match store.read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.is_not_found() => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cloze metadata");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cloze metadata");
                None
            }
        }
    }
}
