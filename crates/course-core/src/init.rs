//! Course initialization: lay out course directories for the account's
//! courses and write their `course.yml` descriptors.

use std::path::{Path, PathBuf};

use course_fs::{COURSE_FILE, ConfigStore};
use course_remote::{Api, Collection, ResourceKind};
use regex::RegexBuilder;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::Result;
use crate::course::{CourseMetadata, RegexRule, parse_course_metadata};

/// Which courses to initialize. Unset fields match every course.
///
/// Text fields are case-insensitive regexes searched in the course's
/// metadata value; `year` must match exactly.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub year: Option<i64>,
    pub section: Option<String>,
    pub period: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
}

impl CourseFilter {
    pub fn matches(&self, metadata: &CourseMetadata) -> bool {
        if let Some(year) = self.year
            && metadata.year != Some(year)
        {
            return false;
        }
        [
            (&self.section, &metadata.section),
            (&self.period, &metadata.period),
            (&self.code, &metadata.code),
            (&self.name, &metadata.name),
        ]
        .into_iter()
        .all(|(wanted, actual)| match wanted {
            None => true,
            Some(pattern) => actual.as_deref().is_some_and(|value| search(pattern, value)),
        })
    }
}

/// Case-insensitive search; a pattern that is not a valid regex is
/// matched literally.
fn search(pattern: &str, value: &str) -> bool {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => regex.is_match(value),
        Err(_) => value.to_lowercase().contains(&pattern.to_lowercase()),
    }
}

/// Directory of a course below `root`:
/// `<code without dashes>/<year>-<period>/<section>`, all lowercase.
///
/// `None` unless the metadata is complete.
pub fn course_dir(root: &Path, metadata: &CourseMetadata) -> Option<PathBuf> {
    let (Some(code), Some(year), Some(period), Some(section)) =
        (&metadata.code, metadata.year, &metadata.period, &metadata.section)
    else {
        return None;
    };
    Some(
        root.join(code.replace('-', "").to_lowercase())
            .join(format!("{year}-{}", period.to_lowercase()))
            .join(section.to_lowercase()),
    )
}

/// Write a `course.yml` for every account course that has complete
/// metadata and passes `filter`. Returns the descriptors written.
///
/// The descriptor holds the remote course record plus its derived
/// `metadata`. Existing descriptors are overwritten.
pub fn init_course(api: &Api, rules: &[RegexRule], root: &Path, filter: &CourseFilter) -> Result<Vec<PathBuf>> {
    let courses = api.list(&Collection::top(ResourceKind::Course))?;
    let store = ConfigStore::new();

    let mut written = Vec::new();
    for course in courses {
        let metadata = parse_course_metadata(&course.data, rules);
        let Some(dir) = course_dir(root, &metadata) else {
            debug!(course = course.title().unwrap_or_default(), "Course metadata incomplete; skipped");
            continue;
        };
        if !filter.matches(&metadata) {
            continue;
        }

        let mut data = course.data.clone();
        if let Value::Object(map) = &mut data {
            map.insert("metadata".into(), serde_json::to_value(&metadata).unwrap_or(Value::Null));
        }
        let descriptor = dir.join(COURSE_FILE);
        if descriptor.exists() {
            warn!(path = %descriptor.display(), "Overwriting course descriptor");
        }
        info!(course = course.title().unwrap_or_default(), path = %descriptor.display(), "Writing course descriptor");
        store.save(&descriptor, &data)?;
        written.push(descriptor);
    }

    info!(count = written.len(), root = %root.display(), "Courses initialized");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn metadata() -> CourseMetadata {
        CourseMetadata {
            code: Some("CSC-101".into()),
            name: Some("Intro to Computing".into()),
            section: Some("S01".into()),
            year: Some(2024),
            period: Some("Fall".into()),
        }
    }

    #[test]
    fn directory_layout() {
        let dir = course_dir(Path::new("/courses"), &metadata()).unwrap();
        assert_eq!(dir, PathBuf::from("/courses/csc101/2024-fall/s01"));
    }

    #[test]
    fn incomplete_metadata_has_no_directory() {
        let mut incomplete = metadata();
        incomplete.section = None;
        assert_eq!(course_dir(Path::new("/courses"), &incomplete), None);
    }

    #[rstest]
    #[case(CourseFilter::default(), true)]
    #[case(CourseFilter { year: Some(2024), ..Default::default() }, true)]
    #[case(CourseFilter { year: Some(2023), ..Default::default() }, false)]
    #[case(CourseFilter { period: Some("fall".into()), ..Default::default() }, true)]
    #[case(CourseFilter { code: Some("^csc".into()), ..Default::default() }, true)]
    #[case(CourseFilter { code: Some("MAT".into()), ..Default::default() }, false)]
    #[case(CourseFilter { section: Some("s0[12]".into()), name: Some("intro".into()), ..Default::default() }, true)]
    #[case(CourseFilter { name: Some("(unclosed".into()), ..Default::default() }, false)]
    fn filter_matching(#[case] filter: CourseFilter, #[case] expected: bool) {
        assert_eq!(filter.matches(&metadata()), expected);
    }
}
