//! Cloze marker scanning and rewriting
//!
//! Markers are inline tags in document content: `<c>…</c>` for a cloze
//! without a folder yet, `<c7>…</c7>` for a cloze bound to folder 7. During
//! a processing pass markers carry a `data-path` attribute naming the
//! document they came from.
//!
//! The same scanner works on raw markdown and on rendered HTML.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::vault::DocumentPath;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)c(\d*)(\s[^<>]*)?>").expect("marker tag regex"));

static ORIGIN_ATTR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-path\s*=\s*"([^"]*)""#).expect("origin attr regex"));

pub const ORIGIN_ATTR: &str = "data-path";

/// Folder identity encoded in a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerId {
    Unassigned,
    Numbered(u32),
}

impl MarkerId {
    /// Parse the digits following `c`.
    ///
    /// `c`, `c0` and numbers too large for a folder identity are unassigned;
    /// see [`out_of_range_ids`] for reporting the latter.
    pub fn from_digits(digits: &str) -> Self {
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => MarkerId::Numbered(n),
            _ => MarkerId::Unassigned,
        }
    }
}

/// One paired marker occurrence in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSpan {
    pub id: MarkerId,
    /// Byte range of the opening tag
    pub open: Range<usize>,
    /// Byte range of the closing tag
    pub close: Range<usize>,
    /// Decoded `data-path` attribute, if present
    pub origin: Option<String>,
}

impl MarkerSpan {
    /// Content between the tags
    pub fn inner(&self) -> Range<usize> {
        self.open.end..self.close.start
    }

    /// The whole marker including both tags
    pub fn outer(&self) -> Range<usize> {
        self.open.start..self.close.end
    }

    fn contains(&self, other: &MarkerSpan) -> bool {
        self.open.start <= other.open.start && other.close.end <= self.close.end
    }
}

struct OpenTag {
    digits: String,
    range: Range<usize>,
    origin: Option<String>,
}

/// Find every paired marker in `text`, ordered by opening position.
///
/// Closing tags pair with the nearest unclosed opening tag of the same name,
/// so nested markers are handled; unmatched tags are ignored.
pub fn scan(text: &str) -> Vec<MarkerSpan> {
    let mut stack: Vec<OpenTag> = Vec::new();
    let mut spans = Vec::new();

    for cap in TAG_REGEX.captures_iter(text) {
        let Some(whole) = cap.get(0) else { continue };
        let closing = cap.get(1).is_some_and(|m| !m.as_str().is_empty());
        let digits = cap.get(2).map(|m| m.as_str()).unwrap_or("");
        let attrs = cap.get(3).map(|m| m.as_str()).unwrap_or("");

        if !closing {
            if attrs.trim_end().ends_with('/') {
                continue;
            }
            stack.push(OpenTag {
                digits: digits.to_string(),
                range: whole.range(),
                origin: parse_origin(attrs),
            });
            continue;
        }

        if let Some(pos) = stack.iter().rposition(|t| t.digits == digits) {
            let open = stack.remove(pos);
            stack.truncate(pos);
            spans.push(MarkerSpan {
                id: MarkerId::from_digits(&open.digits),
                open: open.range,
                close: whole.range(),
                origin: open.origin,
            });
        }
    }

    spans.sort_by_key(|s| s.open.start);
    spans
}

/// Digits of opening tags whose number is too large to be a folder identity
pub fn out_of_range_ids(text: &str) -> Vec<String> {
    TAG_REGEX
        .captures_iter(text)
        .filter(|cap| cap.get(1).is_some_and(|m| m.as_str().is_empty()))
        .filter_map(|cap| cap.get(2))
        .map(|m| m.as_str())
        .filter(|digits| !digits.is_empty() && digits.parse::<u32>().is_err())
        .map(str::to_string)
        .collect()
}

/// Whether `text` contains at least one paired marker
pub fn has_markers(text: &str) -> bool {
    !scan(text).is_empty()
}

fn parse_origin(attrs: &str) -> Option<String> {
    ORIGIN_ATTR_REGEX
        .captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
}

/// Apply non-overlapping replacements to `text`
fn apply_edits(text: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        if range.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Tag every marker lacking a `data-path` attribute with `origin`
pub fn annotate_origin(text: &str, origin: &DocumentPath) -> String {
    let encoded = html_escape::encode_double_quoted_attribute(origin.as_str());
    let edits = scan(text)
        .into_iter()
        .filter(|span| span.origin.is_none())
        .map(|span| {
            let name = &text[span.open.start..span.open.end - 1];
            (
                span.open,
                format!("{} {}=\"{}\">", name, ORIGIN_ATTR, encoded),
            )
        })
        .collect();
    apply_edits(text, edits)
}

/// Rename the first `ids.len()` markers to `c<id>`, dropping their attributes
pub fn rewrite_ids(text: &str, ids: &[u32]) -> String {
    let edits = scan(text)
        .into_iter()
        .zip(ids)
        .flat_map(|(span, id)| [(span.open, format!("<c{}>", id)), (span.close, format!("</c{}>", id))])
        .collect();
    apply_edits(text, edits)
}

/// Replace every marker with its content
pub fn unwrap_markers(text: &str) -> String {
    let edits = scan(text)
        .into_iter()
        .flat_map(|span| [(span.open, String::new()), (span.close, String::new())])
        .collect();
    apply_edits(text, edits)
}

/// Replace the marker at `target` with `placeholder` and unwrap all others
pub fn mask(text: &str, spans: &[MarkerSpan], target: usize, placeholder: &str) -> String {
    let Some(masked) = spans.get(target) else {
        return unwrap_markers(text);
    };

    let mut edits = vec![(masked.outer(), placeholder.to_string())];
    for (i, span) in spans.iter().enumerate() {
        if i == target || masked.contains(span) {
            continue;
        }
        edits.push((span.open.clone(), String::new()));
        edits.push((span.close.clone(), String::new()));
    }
    apply_edits(text, edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_id_parsing() {
        assert_eq!(MarkerId::from_digits(""), MarkerId::Unassigned);
        assert_eq!(MarkerId::from_digits("0"), MarkerId::Unassigned);
        assert_eq!(MarkerId::from_digits("12"), MarkerId::Numbered(12));
        assert_eq!(MarkerId::from_digits("007"), MarkerId::Numbered(7));
    }

    #[test]
    fn test_out_of_range_ids() {
        let text = "<c99999999999>a</c99999999999> <c4>b</c4> <c0>c</c0> <c>d</c>";
        assert_eq!(out_of_range_ids(text), vec!["99999999999"]);
        assert_eq!(scan(text)[0].id, MarkerId::Unassigned);
        assert!(out_of_range_ids("<c1>x</c1>").is_empty());
    }

    #[test]
    fn test_scan_finds_markers_in_order() {
        let text = "a <c>one</c> b <c3>two</c3> c";
        let spans = scan(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].id, MarkerId::Unassigned);
        assert_eq!(&text[spans[0].inner()], "one");
        assert_eq!(spans[1].id, MarkerId::Numbered(3));
        assert_eq!(&text[spans[1].inner()], "two");
    }

    #[test]
    fn test_scan_ignores_other_tags() {
        let text = "<code>x</code> <cite>y</cite> <c/> <c>z</c>";
        let spans = scan(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].inner()], "z");
    }

    #[test]
    fn test_scan_nested_and_unmatched() {
        let text = "<c1>outer <c2>inner</c2> end</c1> <c5>dangling";
        let spans = scan(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].id, MarkerId::Numbered(1));
        assert_eq!(&text[spans[1].inner()], "inner");
    }

    #[test]
    fn test_annotate_and_read_origin() {
        let doc = DocumentPath::new("dir/My \"Note\".md");
        let text = annotate_origin("x <c>a</c> <c2>b</c2>", &doc);
        let spans = scan(&text);
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.origin.as_deref() == Some(doc.as_str())));
        assert_eq!(spans[1].id, MarkerId::Numbered(2));
    }

    #[test]
    fn test_annotate_keeps_existing_origin() {
        let text = r#"<c data-path="b.md">a</c>"#;
        let out = annotate_origin(text, &DocumentPath::new("a.md"));
        assert_eq!(out, text);
    }

    #[test]
    fn test_rewrite_ids_normalizes_tags() {
        let text = r#"<c data-path="a.md">x</c> and <c9>y</c9>"#;
        assert_eq!(rewrite_ids(text, &[1, 9]), "<c1>x</c1> and <c9>y</c9>");
    }

    #[test]
    fn test_rewrite_ids_fewer_ids_than_markers() {
        assert_eq!(rewrite_ids("<c>x</c><c>y</c>", &[4]), "<c4>x</c4><c>y</c>");
    }

    #[test]
    fn test_mask_target_and_unwrap_others() {
        let text = "<p><c1>a</c1> + <c2>b</c2></p>";
        let spans = scan(text);
        let q = mask(text, &spans, 1, "[...]");
        assert_eq!(q, "<p>a + [...]</p>");
    }

    #[test]
    fn test_mask_inside_outer_marker() {
        let text = "<c1>x <c2>y</c2> z</c1>";
        let spans = scan(text);
        assert_eq!(mask(text, &spans, 1, "_"), "x _ z");
        assert_eq!(mask(text, &spans, 0, "_"), "_");
    }

    #[test]
    fn test_unwrap_markers() {
        assert_eq!(unwrap_markers("a <c>b <c3>c</c3></c>"), "a b c");
    }
}
