//! YAML front matter for Markdown documents
//!
//! A document may open with a metadata block fenced by `---` lines. The
//! closing fence may also be `...`.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::yaml;

/// A Markdown document split into metadata and body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrontMatter {
    pub meta: Map<String, Value>,
    pub body: String,
}

impl FrontMatter {
    /// Split `source` into its front matter and Markdown body.
    ///
    /// A document without a metadata block has empty `meta`. A block that is
    /// not a YAML mapping is an error.
    pub fn parse(source: &str) -> Result<Self> {
        let Some((block, body)) = split(source) else {
            return Ok(Self {
                meta: Map::new(),
                body: source.to_string(),
            });
        };

        let meta = if block.trim().is_empty() {
            Map::new()
        } else {
            match yaml::parse(block)? {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => {
                    return Err(Error::parse(
                        "front matter",
                        format!("expected a mapping, found {}", kind_name(&other)),
                    ));
                }
            }
        };

        Ok(Self {
            meta,
            body: body.to_string(),
        })
    }

    /// String value of a metadata field, if present and non-empty.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.meta
            .get(key)
            .and_then(yaml::scalar_string)
            .filter(|s| !s.trim().is_empty())
    }
}

fn split(source: &str) -> Option<(&str, &str)> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let rest = source
        .strip_prefix("---\r\n")
        .or_else(|| source.strip_prefix("---\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "---" || trimmed == "..." {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((block, body));
        }
        offset += line.len();
    }
    None
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn splits_meta_and_body() {
        let doc = FrontMatter::parse("---\ntitle: Syllabus\n---\n# Welcome\n").unwrap();
        assert_eq!(doc.meta.get("title"), Some(&json!("Syllabus")));
        assert_eq!(doc.body, "# Welcome\n");
    }

    #[test]
    fn no_front_matter_keeps_everything_as_body() {
        let doc = FrontMatter::parse("# Just a body\n").unwrap();
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, "# Just a body\n");
    }

    #[test]
    fn unterminated_block_is_body() {
        let doc = FrontMatter::parse("---\ntitle: x\n# never closed\n").unwrap();
        assert!(doc.meta.is_empty());
    }

    #[test]
    fn dots_close_the_block() {
        let doc = FrontMatter::parse("---\nname: HW 01\n...\nbody").unwrap();
        assert_eq!(doc.get_str("name").as_deref(), Some("HW 01"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn crlf_line_endings() {
        let doc = FrontMatter::parse("---\r\ntitle: A\r\n---\r\nText").unwrap();
        assert_eq!(doc.get_str("title").as_deref(), Some("A"));
        assert_eq!(doc.body, "Text");
    }

    #[test]
    fn non_mapping_block_is_an_error() {
        assert!(FrontMatter::parse("---\n- a\n- b\n---\nbody").is_err());
    }

    #[test]
    fn blank_values_are_treated_as_missing() {
        let doc = FrontMatter::parse("---\ntitle: ''\n---\n").unwrap();
        assert_eq!(doc.get_str("title"), None);
    }
}
