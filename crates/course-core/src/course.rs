//! Courses: discovery from local descriptors and metadata extraction
//!
//! A course directory holds a `course.yml` descriptor naming the remote
//! course id. Institution-specific metadata (catalog code, section, term)
//! is pulled out of the remote course record with configured regexes.

use std::path::{Path, PathBuf};

use course_fs::{ConfigStore, find_course_files};
use course_remote::{Api, Collection, RemoteResource, ResourceKind, ResourcePath};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{Error, Result};

/// One metadata extraction rule: run `regex` against the course field at
/// `keys` (a path into nested objects).
#[derive(Debug, Clone)]
pub struct RegexRule {
    pub keys: Vec<String>,
    pub regex: Regex,
}

impl RegexRule {
    pub fn new(keys: Vec<String>, pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            keys,
            regex: Regex::new(pattern)?,
        })
    }

    /// Validate a configured rule, collecting every problem with it.
    pub fn from_value(value: &Value) -> std::result::Result<Self, Vec<String>> {
        let mut reasons = Vec::new();
        let mut keys = Vec::new();

        match (value.get("key"), value.get("keys")) {
            (None, None) => reasons.push("Doesn't have either \"key\" or \"keys\"".to_string()),
            (Some(Value::String(key)), _) => keys.push(key.clone()),
            (Some(_), _) => reasons.push("\"key\" is not a string".to_string()),
            (None, Some(Value::Array(items))) => {
                for item in items {
                    match item {
                        Value::String(k) => keys.push(k.clone()),
                        other => reasons.push(format!("\"keys\" entry is not a string: {other}")),
                    }
                }
            }
            (None, Some(_)) => reasons.push(
                "\"keys\" is not a sequence; use \"key\" for a single key".to_string(),
            ),
        }

        let regex = match value.get("regex") {
            None => {
                reasons.push("Missing \"regex\"".to_string());
                None
            }
            Some(Value::String(pattern)) => match Regex::new(pattern.trim()) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    reasons.push(format!("Error compiling regex: {e}"));
                    None
                }
            },
            Some(other) => {
                reasons.push(format!("Must provide a regular expression: {other}"));
                None
            }
        };

        match regex {
            Some(regex) if reasons.is_empty() => Ok(Self { keys, regex }),
            _ => Err(reasons),
        }
    }

    /// The string this rule inspects in `course`, if present.
    fn target<'a>(&self, course: &'a Value) -> Option<&'a str> {
        self.keys
            .iter()
            .try_fold(course, |value, key| value.get(key))
            .and_then(Value::as_str)
    }
}

/// Institution metadata of one course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl CourseMetadata {
    /// Whether every field needed to place the course on disk is known.
    pub fn is_complete(&self) -> bool {
        self.code.is_some() && self.year.is_some() && self.period.is_some() && self.section.is_some()
    }

    fn fill(&mut self, field: &str, value: &str) {
        match field {
            "code" => fill_str(&mut self.code, value),
            "name" => fill_str(&mut self.name, value),
            "section" => fill_str(&mut self.section, value),
            "period" => fill_str(&mut self.period, value),
            "year" if self.year.is_none() => self.year = value.trim().parse().ok(),
            _ => {}
        }
    }
}

fn fill_str(slot: &mut Option<String>, value: &str) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

/// Extract course metadata from a remote course record. Earlier rules take
/// precedence over later ones for the same field.
pub fn parse_course_metadata(course: &Value, rules: &[RegexRule]) -> CourseMetadata {
    let mut metadata = CourseMetadata::default();
    for rule in rules {
        let Some(target) = rule.target(course) else {
            continue;
        };
        let Some(captures) = rule.regex.captures(target) else {
            continue;
        };
        for field in rule.regex.capture_names().flatten() {
            if let Some(value) = captures.name(field) {
                metadata.fill(field, value.as_str());
            }
        }
    }
    metadata
}

/// A remote course together with the local descriptor that named it.
#[derive(Debug, Clone)]
pub struct Course {
    pub id: u64,
    pub resource: RemoteResource,
    /// The `course.yml` this course was discovered from.
    pub descriptor: PathBuf,
}

impl Course {
    pub fn path(&self) -> &ResourcePath {
        &self.resource.path
    }

    pub fn name(&self) -> &str {
        self.resource.title().unwrap_or_default()
    }

    /// Directory holding the course descriptor.
    pub fn dir(&self) -> &Path {
        self.descriptor.parent().unwrap_or(Path::new("."))
    }

    /// Seed for per-course deterministic choices (quiz shuffling).
    pub fn seed(&self) -> u64 {
        self.id
    }
}

/// Read the remote course id from a `course.yml`.
pub fn read_course_id(descriptor: &Path) -> Result<u64> {
    let data: Value = ConfigStore::new().load(descriptor)?;
    let item = descriptor.display().to_string();
    match data.get("id") {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| Error::invalid(item, "`id` is not a course id")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| Error::invalid(item, format!("`id` is not a course id: {s}"))),
        _ => Err(Error::missing(item, "id")),
    }
}

/// Find every `course.yml` under `path` and fetch the courses they name.
///
/// Descriptors naming the same course are collapsed into the first one.
///
/// # Errors
///
/// Returns [`Error::NoCourses`] if no descriptor is found, and the first
/// read or fetch error otherwise.
pub fn courses_from_path(api: &Api, path: &Path) -> Result<Vec<Course>> {
    let descriptors = find_course_files(path)?;
    let collection = Collection::top(ResourceKind::Course);

    let mut courses: Vec<Course> = Vec::new();
    for descriptor in descriptors {
        let id = read_course_id(&descriptor)?;
        if courses.iter().any(|c| c.id == id) {
            debug!(id, descriptor = %descriptor.display(), "Course already discovered");
            continue;
        }
        let resource = api.get(&collection, id)?;
        courses.push(Course {
            id,
            resource,
            descriptor,
        });
    }

    if courses.is_empty() {
        return Err(Error::NoCourses {
            path: path.to_path_buf(),
        });
    }
    info!(
        count = courses.len(),
        names = %courses.iter().map(Course::name).collect::<Vec<_>>().join(", "),
        "Courses found"
    );
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn rule(keys: &[&str], pattern: &str) -> RegexRule {
        RegexRule::new(keys.iter().map(|k| k.to_string()).collect(), pattern).unwrap()
    }

    fn default_rules() -> Vec<RegexRule> {
        vec![
            rule(&["name"], r"^(?P<code>\S+) (?P<name>.*?) (?P<section>\S+)$"),
            rule(&["name"], r"^(?P<name>.*)$"),
            rule(&["term", "name"], r"^(?P<year>\d+)\s+(?P<period>.*)$"),
            rule(&["term", "name"], r"^(?P<period>\D*?)\s+(?P<year>\d+)$"),
            rule(&["term", "created_at"], r"^(?P<year>\d{4})-.*$"),
        ]
    }

    #[test]
    fn metadata_from_name_and_term() {
        let course = json!({
            "name": "CSC101 Intro to Computing 01",
            "term": {"name": "2024 Fall", "created_at": "2023-05-01T00:00:00Z"},
        });

        let metadata = parse_course_metadata(&course, &default_rules());

        assert_eq!(
            metadata,
            CourseMetadata {
                code: Some("CSC101".into()),
                name: Some("Intro to Computing".into()),
                section: Some("01".into()),
                year: Some(2024),
                period: Some("Fall".into()),
            }
        );
        assert!(metadata.is_complete());
    }

    #[test]
    fn later_rules_fill_gaps_only() {
        let course = json!({
            "name": "Orientation",
            "term": {"name": "Spring 2023", "created_at": "2022-11-01T00:00:00Z"},
        });

        let metadata = parse_course_metadata(&course, &default_rules());

        assert_eq!(metadata.name.as_deref(), Some("Orientation"));
        assert_eq!(metadata.period.as_deref(), Some("Spring"));
        assert_eq!(metadata.year, Some(2023));
        assert_eq!(metadata.code, None);
        assert!(!metadata.is_complete());
    }

    #[rstest]
    #[case(json!({"key": "name", "regex": "^(?P<name>.*)$"}), true)]
    #[case(json!({"keys": ["term", "name"], "regex": "^x$"}), true)]
    #[case(json!({"regex": "^x$"}), false)]
    #[case(json!({"key": 3, "regex": "^x$"}), false)]
    #[case(json!({"keys": "term", "regex": "^x$"}), false)]
    #[case(json!({"key": "name"}), false)]
    #[case(json!({"key": "name", "regex": "(unclosed"}), false)]
    fn rule_validation(#[case] value: Value, #[case] valid: bool) {
        assert_eq!(RegexRule::from_value(&value).is_ok(), valid);
    }

    #[test]
    fn rule_reports_every_reason() {
        let reasons = RegexRule::from_value(&json!({"key": 1})).unwrap_err();
        assert_eq!(reasons.len(), 2);
    }

    #[test]
    fn course_id_from_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let numeric = dir.path().join("a.yml");
        let quoted = dir.path().join("b.yml");
        let missing = dir.path().join("c.yml");
        std::fs::write(&numeric, "id: 42\nname: x\n").unwrap();
        std::fs::write(&quoted, "id: '43'\n").unwrap();
        std::fs::write(&missing, "name: x\n").unwrap();

        assert_eq!(read_course_id(&numeric).unwrap(), 42);
        assert_eq!(read_course_id(&quoted).unwrap(), 43);
        assert!(matches!(
            read_course_id(&missing),
            Err(Error::MissingRequiredField { .. })
        ));
    }
}
