//! Module documents (`modules.yml`)
//!
//! ```yaml
//! - name: Week 1
//!   items:
//!     - page: Intro and Setup
//!     - assign: HW 00
//!       indent: 1
//!     - subheader: Readings
//! ```
//!
//! Each item's first key is a type tag and its value a search string. The
//! document's own mapping order decides which key is first.

use serde_json::{Map, Value};
use serde_yaml::Value as YamlValue;

use crate::error::{Error, Result};
use crate::yaml::{self, scalar_string};

/// Module item types understood by the LMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    File,
    Page,
    Discussion,
    Assignment,
    Quiz,
    SubHeader,
    ExternalUrl,
    ExternalTool,
}

impl ItemKind {
    pub const ALL: [ItemKind; 8] = [
        ItemKind::File,
        ItemKind::Page,
        ItemKind::Discussion,
        ItemKind::Assignment,
        ItemKind::Quiz,
        ItemKind::SubHeader,
        ItemKind::ExternalUrl,
        ItemKind::ExternalTool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::File => "File",
            ItemKind::Page => "Page",
            ItemKind::Discussion => "Discussion",
            ItemKind::Assignment => "Assignment",
            ItemKind::Quiz => "Quiz",
            ItemKind::SubHeader => "SubHeader",
            ItemKind::ExternalUrl => "ExternalUrl",
            ItemKind::ExternalTool => "ExternalTool",
        }
    }

    /// Match a type tag against the known kinds: the first kind whose name
    /// contains the tag, ignoring case. `assign` selects `Assignment`.
    pub fn from_tag(tag: &str) -> Option<ItemKind> {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().to_lowercase().contains(&tag))
    }

    /// Whether items of this kind point at existing course content that
    /// has to be looked up before the item can be created.
    pub fn references_content(self) -> bool {
        matches!(
            self,
            ItemKind::File | ItemKind::Page | ItemKind::Assignment | ItemKind::Quiz
        )
    }
}

/// One entry of a module's `items` list.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItemDoc {
    /// `<tag>: <search>` followed by pass-through fields.
    Typed {
        kind: ItemKind,
        search: String,
        extra: Map<String, Value>,
    },
    /// An item whose first key is not a type tag; sent as written.
    Raw(Map<String, Value>),
}

impl ModuleItemDoc {
    /// Title used to find this item among existing module items before it
    /// has been resolved against course content.
    pub fn raw_title(&self) -> Option<String> {
        match self {
            ModuleItemDoc::Typed { search, .. } => Some(search.clone()),
            ModuleItemDoc::Raw(map) => map.get("title").and_then(scalar_string),
        }
    }
}

/// One module of `modules.yml`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDoc {
    pub name: String,
    /// Module fields other than `name` and `items` (e.g. `published`).
    pub fields: Map<String, Value>,
    pub items: Vec<ModuleItemDoc>,
}

/// Parse `modules.yml` source.
pub fn parse_modules(source: &str) -> Result<Vec<ModuleDoc>> {
    let doc = yaml::parse_ordered(source)?;
    let modules = match doc {
        YamlValue::Sequence(modules) => modules,
        YamlValue::Null => return Ok(Vec::new()),
        _ => return Err(Error::invalid("modules", "document is not a list")),
    };

    modules
        .iter()
        .enumerate()
        .map(|(i, m)| parse_module(m, i + 1))
        .collect()
}

fn parse_module(value: &YamlValue, index: usize) -> Result<ModuleDoc> {
    let YamlValue::Mapping(map) = value else {
        return Err(Error::invalid(format!("module {index}"), "not a mapping"));
    };

    let mut name = None;
    let mut fields = Map::new();
    let mut items = Vec::new();

    for (key, value) in map {
        match yaml::key_string(key).as_str() {
            "name" => name = scalar_string(&yaml::to_json(value)),
            "items" => {
                let YamlValue::Sequence(entries) = value else {
                    return Err(Error::invalid(format!("module {index}"), "items is not a list"));
                };
                items = entries
                    .iter()
                    .enumerate()
                    .map(|(j, e)| parse_item(e, index, j + 1))
                    .collect::<Result<_>>()?;
            }
            other => {
                fields.insert(other.to_string(), yaml::to_json(value));
            }
        }
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| Error::missing(format!("module {index}"), "name"))?;

    Ok(ModuleDoc { name, fields, items })
}

fn parse_item(value: &YamlValue, module: usize, index: usize) -> Result<ModuleItemDoc> {
    let YamlValue::Mapping(map) = value else {
        return Err(Error::invalid(
            format!("item {index} of module {module}"),
            "not a mapping",
        ));
    };

    let mut entries = map.iter();
    let Some((first_key, first_value)) = entries.next() else {
        return Err(Error::invalid(format!("item {index} of module {module}"), "empty item"));
    };

    let kind = ItemKind::from_tag(&yaml::key_string(first_key));
    let search = scalar_string(&yaml::to_json(first_value));

    match (kind, search) {
        (Some(kind), Some(search)) => {
            let extra = entries
                .map(|(k, v)| (yaml::key_string(k), yaml::to_json(v)))
                .collect();
            Ok(ModuleItemDoc::Typed { kind, search, extra })
        }
        _ => {
            let raw = map
                .iter()
                .map(|(k, v)| (yaml::key_string(k), yaml::to_json(v)))
                .collect();
            Ok(ModuleItemDoc::Raw(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("page", Some(ItemKind::Page))]
    #[case("assign", Some(ItemKind::Assignment))]
    #[case("Quiz", Some(ItemKind::Quiz))]
    #[case("subheader", Some(ItemKind::SubHeader))]
    #[case("url", Some(ItemKind::ExternalUrl))]
    #[case("file", Some(ItemKind::File))]
    #[case("indent", None)]
    #[case("", None)]
    fn tags_match_case_insensitively(#[case] tag: &str, #[case] expected: Option<ItemKind>) {
        assert_eq!(ItemKind::from_tag(tag), expected);
    }

    #[test]
    fn parses_modules_in_order() {
        let source = "\
- name: Learn Python
  published: true
  items:
    - page: Intro and Setup
    - assign: HW 00
      indent: 1
- name: Final Project
  items:
    - assign: HW 11
";
        let modules = parse_modules(source).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "Learn Python");
        assert_eq!(modules[0].fields.get("published"), Some(&json!(true)));
        assert_eq!(
            modules[0].items[1],
            ModuleItemDoc::Typed {
                kind: ItemKind::Assignment,
                search: "HW 00".into(),
                extra: json!({"indent": 1}).as_object().cloned().unwrap(),
            }
        );
        assert_eq!(modules[1].items.len(), 1);
    }

    #[test]
    fn first_key_decides_the_type_even_when_not_alphabetical() {
        let modules = parse_modules("- name: M\n  items:\n    - quiz: Quiz 1\n    - indent: 2\n      page: P\n").unwrap();
        assert!(matches!(modules[0].items[0], ModuleItemDoc::Typed { kind: ItemKind::Quiz, .. }));
        assert!(matches!(modules[0].items[1], ModuleItemDoc::Raw(_)));
    }

    #[test]
    fn module_without_name_fails() {
        let err = parse_modules("- items: []\n").unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn empty_document_has_no_modules() {
        assert!(parse_modules("").unwrap().is_empty());
    }
}
