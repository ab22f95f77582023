//! Assignment group documents (`assignment_groups.yml`)
//!
//! ```yaml
//! assignment:
//!   - n: Homework
//!     w: 40
//!     rules:
//!       l: 1
//!   - name: Exams
//!     weight: 60
//! ```

use serde_json::{Map, Value};

use crate::aliases::{self, GROUP_KEYS, GROUP_RULE_KEYS};
use crate::error::{Error, Result};
use crate::yaml::{self, scalar_string};

/// One processed assignment group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDoc {
    pub name: String,
    /// Full desired field set, including `name` and `position`.
    pub fields: Map<String, Value>,
}

/// Parse assignment group source.
///
/// Groups are numbered from 1 in document order; the position is part of the
/// desired state so moving a group in the file is a content change.
pub fn parse_groups(source: &str) -> Result<Vec<GroupDoc>> {
    let doc = yaml::parse(source)?;
    let groups = match doc.get("assignment") {
        Some(Value::Array(groups)) => groups.clone(),
        Some(_) => return Err(Error::invalid("assignment groups", "`assignment` is not a list")),
        None => return Err(Error::missing("assignment groups", "assignment")),
    };

    groups
        .into_iter()
        .enumerate()
        .map(|(i, g)| process_group(g, i + 1))
        .collect()
}

fn process_group(group: Value, position: usize) -> Result<GroupDoc> {
    let item = format!("assignment group {position}");
    let Value::Object(group) = group else {
        return Err(Error::invalid(item, "not a mapping"));
    };

    let mut fields = aliases::rename_keys(group, GROUP_KEYS);
    fields.insert("position".into(), Value::from(position));

    if let Some(Value::Object(rules)) = fields.remove("rules")
        && !rules.is_empty()
    {
        fields.insert(
            "rules".into(),
            Value::Object(aliases::rename_keys(rules, GROUP_RULE_KEYS)),
        );
    }

    let name = fields
        .get("name")
        .and_then(scalar_string)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| Error::missing(item, "name"))?;

    Ok(GroupDoc { name, fields })
}
