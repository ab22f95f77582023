//! Page and assignment documents
//!
//! Both are Markdown with front matter. Pages are keyed by `title`,
//! assignments by `name`.

use serde_json::{Map, Value, json};

use crate::aliases;
use crate::error::{Error, Result};
use crate::markdown::Renderer;
use crate::yaml::scalar_string;

/// A wiki page rendered from `pages/page-*.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDoc {
    pub title: String,
    pub body: String,
}

impl PageDoc {
    pub fn from_source(source: &str, renderer: &dyn Renderer) -> Result<Self> {
        let rendered = renderer.render_document(source)?;
        let title = rendered
            .meta_str("title")
            .ok_or_else(|| Error::missing("page", "title"))?;
        Ok(Self {
            title,
            body: rendered.html,
        })
    }

    /// Field values the remote page should end up with.
    pub fn desired(&self) -> Value {
        json!({"title": self.title, "body": self.body})
    }
}

/// An assignment rendered from `assignments/assign-*.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDoc {
    pub name: String,
    /// Front-matter fields with the rendered body as `description`.
    pub fields: Map<String, Value>,
    /// Name prefix of the assignment group, resolved remotely.
    pub assignment_group: Option<String>,
}

impl AssignmentDoc {
    pub fn from_source(source: &str, renderer: &dyn Renderer) -> Result<Self> {
        let rendered = renderer.render_document(source)?;
        let name = rendered
            .meta_str("name")
            .ok_or_else(|| Error::missing("assignment", "name"))?;

        let mut fields = rendered.meta;
        let assignment_group = fields
            .remove("assignment_group")
            .and_then(|v| scalar_string(&v));
        aliases::translate_submission_types(&mut fields);
        fields.insert("description".into(), Value::String(rendered.html));

        Ok(Self {
            name,
            fields,
            assignment_group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownRenderer;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_desired_state() {
        let page = PageDoc::from_source("---\ntitle: Syllabus\n---\n# Welcome\n", &MarkdownRenderer::new())
            .unwrap();
        assert_eq!(
            page.desired(),
            json!({"title": "Syllabus", "body": "<h1>Welcome</h1>\n"})
        );
    }

    #[test]
    fn page_without_title_fails() {
        let err = PageDoc::from_source("# No meta\n", &MarkdownRenderer::new()).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "title"));
    }

    #[test]
    fn assignment_fields() {
        let source = "---\nname: HW 01\npoints_possible: 10\nsubmission_types: [upload]\nassignment_group: home\n---\nDo it.\n";
        let doc = AssignmentDoc::from_source(source, &MarkdownRenderer::new()).unwrap();

        assert_eq!(doc.name, "HW 01");
        assert_eq!(doc.assignment_group.as_deref(), Some("home"));
        assert_eq!(
            Value::Object(doc.fields),
            json!({
                "name": "HW 01",
                "points_possible": 10,
                "submission_types": ["online_upload"],
                "description": "<p>Do it.</p>\n",
            })
        );
    }

    #[test]
    fn assignment_without_name_fails() {
        let err = AssignmentDoc::from_source("---\ntitle: wrong key\n---\n", &MarkdownRenderer::new())
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "name"));
    }
}
