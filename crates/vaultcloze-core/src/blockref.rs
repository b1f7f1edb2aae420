//! Block reference resolution
//!
//! A block reference `![label](path/to/Note.md#^abc123)` embeds the single
//! line of `Note.md` that ends with the anchor ` ^abc123`. Resolution is
//! single pass: references introduced by a substituted line are left as-is.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{ClozeError, Issue};
use crate::markers;
use crate::store::ContentStore;
use crate::vault::{DocumentPath, Vault};

static BLOCK_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[.*?\]\(([=a-zA-Z0-9_/?&%+#.\-]+)#\^([=a-zA-Z0-9\-]+)\)")
        .expect("block reference regex")
});

static BLOCK_HASH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(.*\S)[ \t]+\^[=a-zA-Z0-9\-]+[ \t]*(\r?)$").expect("block hash regex")
});

/// One embed-style reference found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReference {
    /// The full reference text as written
    pub raw: String,
    /// Target path as written (percent-encoded, possibly without extension)
    pub target: String,
    /// Anchor hash without the leading `^`
    pub hash: String,
}

impl BlockReference {
    fn from_captures(cap: &Captures<'_>) -> Self {
        BlockReference {
            raw: cap[0].to_string(),
            target: cap[1].to_string(),
            hash: cap[2].to_string(),
        }
    }
}

/// Every block reference in `text`, in order
pub fn references(text: &str) -> Vec<BlockReference> {
    BLOCK_REF_REGEX
        .captures_iter(text)
        .map(|cap| BlockReference::from_captures(&cap))
        .collect()
}

/// Remove trailing ` ^hash` anchors from every line
pub fn strip_block_hashes(text: &str) -> String {
    BLOCK_HASH_REGEX.replace_all(text, "${1}${2}").into_owned()
}

/// The text of the line in `content` anchored by `^hash`, anchor removed
pub fn find_block(content: &str, hash: &str) -> Option<String> {
    let anchor = format!("^{}", hash);
    content.lines().find_map(|line| {
        let before = line.trim_end().strip_suffix(anchor.as_str())?;
        if !before.ends_with([' ', '\t']) {
            return None;
        }
        let text = before.trim_end();
        (!text.is_empty()).then(|| text.to_string())
    })
}

/// Result of inlining the block references of one document
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Document text with references substituted and anchors stripped
    pub text: String,
    /// References that resolved to empty text
    pub issues: Vec<Issue>,
}

/// Inlines block references using documents from the vault
pub struct BlockReferenceResolver<'a> {
    store: &'a dyn ContentStore,
    vault: &'a Vault,
    extension: &'a str,
}

impl<'a> BlockReferenceResolver<'a> {
    pub fn new(store: &'a dyn ContentStore, vault: &'a Vault, extension: &'a str) -> Self {
        BlockReferenceResolver {
            store,
            vault,
            extension,
        }
    }

    /// Find the existing document a reference target points at.
    ///
    /// Targets resolve against the vault root first, then against the
    /// including document's directory; a missing extension is appended.
    pub fn locate(
        &self,
        including: &DocumentPath,
        target: &str,
    ) -> Result<DocumentPath, ClozeError> {
        let decoded = urlencoding::decode(target)
            .map_err(|e| ClozeError::malformed_reference(target, e))?;
        let decoded = decoded.trim_start_matches('/');

        let mut candidates = vec![decoded.to_string()];
        if !including.parent().is_empty() {
            candidates.push(format!("{}/{}", including.parent(), decoded));
        }
        let has_extension = decoded
            .rsplit('/')
            .next()
            .is_some_and(|name| name.contains('.'));
        if !has_extension {
            let with_ext: Vec<String> = candidates
                .iter()
                .map(|c| format!("{}.{}", c, self.extension))
                .collect();
            candidates.extend(with_ext);
        }

        candidates
            .iter()
            .filter_map(|c| self.vault.relative(&self.vault.root().join(c)))
            .find(|doc| self.store.exists(&self.vault.absolute(doc)))
            .ok_or_else(|| ClozeError::NotFound {
                path: self.vault.root().join(decoded),
            })
    }

    /// Documents referenced by `text` that currently exist
    pub fn referenced_documents(&self, including: &DocumentPath, text: &str) -> Vec<DocumentPath> {
        let mut docs: Vec<DocumentPath> = references(text)
            .iter()
            .filter_map(|r| self.locate(including, &r.target).ok())
            .collect();
        docs.sort();
        docs.dedup();
        docs
    }

    /// Substitute every block reference in `text`, then strip anchors.
    ///
    /// Markers inside substituted lines are tagged with the document they
    /// came from. Failures substitute empty text and are recorded as issues.
    #[tracing::instrument(skip(self, text), fields(document = %including))]
    pub fn resolve(&self, including: &DocumentPath, text: &str) -> Resolution {
        let mut resolution = Resolution::default();
        let mut cache: HashMap<DocumentPath, String> = HashMap::new();
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        for cap in BLOCK_REF_REGEX.captures_iter(text) {
            let Some(whole) = cap.get(0) else { continue };
            let reference = BlockReference::from_captures(&cap);
            out.push_str(&text[cursor..whole.start()]);
            cursor = whole.end();

            match self.substitute(including, &reference, &mut cache) {
                Ok(block) => out.push_str(&block),
                Err(err) => {
                    tracing::warn!(reference = %reference.raw, error = %err, "block reference not resolved");
                    resolution.issues.push(Issue::from(&err));
                }
            }
        }
        out.push_str(&text[cursor..]);

        resolution.text = strip_block_hashes(&out);
        resolution
    }

    fn substitute(
        &self,
        including: &DocumentPath,
        reference: &BlockReference,
        cache: &mut HashMap<DocumentPath, String>,
    ) -> Result<String, ClozeError> {
        let doc = self.locate(including, &reference.target)?;
        if !cache.contains_key(&doc) {
            let content = self.store.read_to_string(&self.vault.absolute(&doc))?;
            cache.insert(doc.clone(), content);
        }
        let content = cache.get(&doc).map(String::as_str).unwrap_or_default();

        let block = find_block(content, &reference.hash).ok_or_else(|| {
            ClozeError::malformed_reference(
                &reference.raw,
                format!("no block ^{} in {}", reference.hash, doc),
            )
        })?;
        Ok(markers::annotate_origin(&block, &doc))
    }
}
