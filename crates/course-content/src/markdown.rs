//! Markdown to HTML rendering

use pulldown_cmark::{Options, Parser, html};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::frontmatter::FrontMatter;

/// A rendered document: HTML body plus the metadata from its front matter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rendered {
    pub html: String,
    pub meta: Map<String, Value>,
}

impl Rendered {
    /// String value of a metadata field, if present and non-empty.
    pub fn meta_str(&self, key: &str) -> Option<String> {
        self.meta
            .get(key)
            .and_then(crate::yaml::scalar_string)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Turns authored Markdown into the HTML sent to the LMS.
///
/// Sync code only depends on this trait so tests can plug in a trivial
/// renderer and assert on exact payloads.
pub trait Renderer: Send + Sync {
    /// Render a Markdown fragment (no front matter) to HTML.
    fn render_fragment(&self, markdown: &str) -> String;

    /// Render a whole document, splitting off its front matter first.
    fn render_document(&self, source: &str) -> Result<Rendered> {
        let doc = FrontMatter::parse(source)?;
        Ok(Rendered {
            html: self.render_fragment(&doc.body),
            meta: doc.meta,
        })
    }
}

/// CommonMark renderer with the GitHub-flavoured extensions course authors
/// rely on: tables, footnotes, strikethrough and task lists.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for MarkdownRenderer {
    fn render_fragment(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_heading() {
        let html = MarkdownRenderer::new().render_fragment("# Welcome");
        assert_eq!(html, "<h1>Welcome</h1>\n");
    }

    #[test]
    fn renders_tables() {
        let html = MarkdownRenderer::new().render_fragment("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn document_meta_is_split_from_body() {
        let rendered = MarkdownRenderer::new()
            .render_document("---\ntitle: Syllabus\n---\n# Welcome\n")
            .unwrap();
        assert_eq!(rendered.meta_str("title").as_deref(), Some("Syllabus"));
        assert_eq!(rendered.html, "<h1>Welcome</h1>\n");
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let source = "Some *text* with `code` and a [link](http://x).";
        assert_eq!(renderer.render_fragment(source), renderer.render_fragment(source));
    }
}
