//! Cloze extraction from rendered content

use crate::markers::{self, MarkerId};
use crate::vault::DocumentPath;

/// Markup that replaces the masked cloze in a question
pub const CLOZE_PLACEHOLDER: &str = r#"<span class="cloze">[...]</span>"#;

/// One cloze occurrence found in a rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClozeMarker {
    /// Folder identity written in the marker, if any
    pub id: MarkerId,
    /// Document the marker was written in
    pub origin: DocumentPath,
    /// The masked content
    pub answer: String,
    /// The whole document with this cloze masked and all others revealed
    pub question: String,
}

impl ClozeMarker {
    /// Whether the marker was written in `doc` itself rather than inlined
    pub fn is_from(&self, doc: &DocumentPath) -> bool {
        &self.origin == doc
    }
}

/// Extract every cloze in `html`, in document order.
///
/// Markers without a `data-path` attribute are attributed to `document`.
pub fn extract(html: &str, document: &DocumentPath) -> Vec<ClozeMarker> {
    let spans = markers::scan(html);
    spans
        .iter()
        .enumerate()
        .map(|(i, span)| ClozeMarker {
            id: span.id,
            origin: span
                .origin
                .as_deref()
                .map(DocumentPath::new)
                .unwrap_or_else(|| document.clone()),
            answer: markers::unwrap_markers(&html[span.inner()]),
            question: markers::mask(html, &spans, i, CLOZE_PLACEHOLDER),
        })
        .collect()
}
