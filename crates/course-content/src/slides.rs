//! remark.js slide decks
//!
//! A slide source is remark-flavoured Markdown. It is wrapped into a
//! standalone HTML deck for upload, and a companion page links to the
//! uploaded deck.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

static SLIDE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s(?P<title>\S.*)$").expect("static regex"));

const REMARK_JS: &str = "https://remarkjs.com/downloads/remark-latest.min.js";

/// First level-one heading of a slide source.
pub fn slide_title(markdown: &str) -> Option<String> {
    SLIDE_TITLE
        .captures(markdown)
        .and_then(|c| c.name("title"))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Wrap slide Markdown into a standalone remark HTML deck.
pub fn render_deck(markdown: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
      body {{ font-family: sans-serif; }}
      .remark-code, .remark-inline-code {{ font-family: monospace; }}
    </style>
  </head>
  <body>
    <textarea id="source">
{source}
    </textarea>
    <script src="{script}"></script>
    <script>var slideshow = remark.create({{ highlightLines: true }});</script>
  </body>
</html>
"#,
        title = escape_html(title),
        source = escape_html(markdown),
        script = REMARK_JS,
    )
}

/// Markdown for the page that links to an uploaded deck.
pub fn companion_page(title: &str, deck_url: &str, deck_filename: &str) -> Result<String> {
    let mut meta = Map::new();
    meta.insert("title".into(), Value::String(format!("Slides: {title}")));
    let front = serde_yaml::to_string(&meta).map_err(|e| Error::parse("YAML", e.to_string()))?;

    Ok(format!(
        "---\n{front}---\n\n[{title}]({deck_url}) (`{deck_filename}`)\n",
        title = title,
        deck_url = deck_url,
        deck_filename = deck_filename,
    ))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::FrontMatter;

    #[test]
    fn title_is_first_h1() {
        let md = "class: center\n\n# Recursion\n\n---\n\n# Second\n";
        assert_eq!(slide_title(md).as_deref(), Some("Recursion"));
    }

    #[test]
    fn no_h1_means_no_title() {
        assert_eq!(slide_title("## Only h2\n"), None);
        assert_eq!(slide_title("#NoSpace\n"), None);
    }

    #[test]
    fn deck_escapes_source() {
        let html = render_deck("# A </textarea> trick", "A");
        assert!(html.contains("&lt;/textarea&gt;"));
        assert!(html.contains("remark.create"));
    }

    #[test]
    fn companion_page_has_title_front_matter() {
        let page = companion_page("Recursion: part 1", "https://lms/files/9/download", "slide-01.html")
            .unwrap();
        let doc = FrontMatter::parse(&page).unwrap();
        assert_eq!(doc.get_str("title").as_deref(), Some("Slides: Recursion: part 1"));
        assert!(doc.body.contains("https://lms/files/9/download"));
    }
}
