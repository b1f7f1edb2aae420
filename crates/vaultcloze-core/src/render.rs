//! Markdown and math rendering
//!
//! Both are collaborators behind traits: [`Renderer`] turns markdown into
//! HTML and [`MathImager`] turns one TeX snippet into an HTML fragment
//! (typically an `<img>` of a rendered image). Math is lifted out before
//! markdown rendering so TeX is never mangled by emphasis or escaping rules.

use std::ops::Range;
use std::path::Path;

use pulldown_cmark::{html, Options, Parser};

use crate::error::{Issue, Result};

const PLACEHOLDER_OPEN: char = '\u{F8F0}';
const PLACEHOLDER_CLOSE: char = '\u{F8F1}';

/// Converts markdown to HTML
pub trait Renderer {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark renderer; inline cloze tags pass through as inline HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_FOOTNOTES);

        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Produces the HTML for one math snippet.
///
/// Called synchronously for every snippet of a document; `folder` is the
/// document's artifact folder where generated images may be stored.
pub trait MathImager {
    fn image(&self, snippet: &str, folder: &Path) -> Result<String>;
}

/// Keeps TeX as text for client-side rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineMath;

impl MathImager for InlineMath {
    fn image(&self, snippet: &str, _folder: &Path) -> Result<String> {
        Ok(inline_math_html(snippet))
    }
}

fn inline_math_html(snippet: &str) -> String {
    format!(
        "<span class=\"math\">{}</span>",
        html_escape::encode_text(snippet)
    )
}

/// Byte ranges of `$…$` and `$$…$$` snippets.
///
/// A `$` preceded by a backslash does not open a snippet, and snippets do
/// not span lines.
pub fn find_math(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' || (i > 0 && bytes[i - 1] == b'\\') {
            i += 1;
            continue;
        }
        let delim = if bytes.get(i + 1) == Some(&b'$') { "$$" } else { "$" };
        let content_start = i + delim.len();

        match find_closing(text, content_start, delim) {
            Some(close) => {
                found.push(i..close + delim.len());
                i = close + delim.len();
            }
            None => i = content_start,
        }
    }

    found
}

fn find_closing(text: &str, content_start: usize, delim: &str) -> Option<usize> {
    let line_end = text[content_start..]
        .find('\n')
        .map(|p| content_start + p)
        .unwrap_or(text.len());
    if content_start >= line_end {
        return None;
    }
    // content must be non-empty; step over one whole char
    let search_from = content_start
        + text[content_start..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
    if search_from > line_end {
        return None;
    }
    text[search_from..line_end]
        .find(delim)
        .map(|p| search_from + p)
}

/// Renders documents with math protection
pub struct RenderPipeline<'a> {
    renderer: &'a dyn Renderer,
    imager: &'a dyn MathImager,
}

impl<'a> RenderPipeline<'a> {
    pub fn new(renderer: &'a dyn Renderer, imager: &'a dyn MathImager) -> Self {
        RenderPipeline { renderer, imager }
    }

    /// Render `markdown` to HTML, imaging each math snippet into `folder`.
    ///
    /// A snippet the imager fails on is kept as inline TeX and reported.
    pub fn render(&self, markdown: &str, folder: &Path) -> (String, Vec<Issue>) {
        let snippets = find_math(markdown);
        let mut protected = String::with_capacity(markdown.len());
        let mut cursor = 0;
        for (n, range) in snippets.iter().enumerate() {
            protected.push_str(&markdown[cursor..range.start]);
            protected.push(PLACEHOLDER_OPEN);
            protected.push_str(&n.to_string());
            protected.push(PLACEHOLDER_CLOSE);
            cursor = range.end;
        }
        protected.push_str(&markdown[cursor..]);

        let mut html = self.renderer.render(&protected);
        let mut issues = Vec::new();

        for (n, range) in snippets.iter().enumerate() {
            let snippet = &markdown[range.clone()];
            let fragment = self.imager.image(snippet, folder).unwrap_or_else(|e| {
                tracing::warn!(snippet, error = %e, "math imaging failed");
                issues.push(Issue::from(&e));
                inline_math_html(snippet)
            });
            let placeholder = format!("{}{}{}", PLACEHOLDER_OPEN, n, PLACEHOLDER_CLOSE);
            html = html.replacen(&placeholder, &fragment, 1);
        }

        (html, issues)
    }
}
