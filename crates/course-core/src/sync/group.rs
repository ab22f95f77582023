//! Assignment groups
//!
//! Groups are synced from `assignment_groups.yml` as a whole per course.
//! Assignments and quizzes reference a group by a case-insensitive name
//! prefix.

use std::path::Path;

use course_content::parse_groups;
use course_remote::{Lookup, ResourceKind, find_by_prefix};
use serde_json::Value;
use tracing::{error, info};

use super::context::SyncContext;
use super::engine::sync_resource;
use super::report::{SyncOutcome, SyncReport};
use crate::course::Course;
use crate::{Error, Result};

/// Id of the course's assignment group whose name starts with `prefix`.
///
/// # Errors
///
/// Absent and ambiguous prefixes both block the caller:
/// [`Error::NotFound`] and [`Error::AmbiguousMatch`] respectively.
pub fn resolve_group(ctx: &SyncContext, course: &Course, prefix: &str) -> Result<Value> {
    let collection = course.path().collection(ResourceKind::AssignmentGroup);
    let groups = ctx.list(&collection)?;
    match find_by_prefix(&groups, prefix) {
        Lookup::Found(group) => Ok(group.data.get("id").cloned().unwrap_or(Value::Null)),
        Lookup::Absent => Err(Error::not_found("assignment group", prefix)),
        Lookup::Ambiguous(found) => Err(Error::ambiguous("assignment group", prefix, found.len())),
    }
}

/// Sync a course's assignment groups from `assignment_groups.yml`.
///
/// Remote groups with no local counterpart are reported as orphaned and
/// left alone.
pub fn sync_assignment_groups(ctx: &SyncContext, course: &Course, path: &Path) -> Result<SyncReport> {
    let source = course_fs::io::read_text_lossy(path)?;
    let groups = parse_groups(&source)?;
    let collection = course.path().collection(ResourceKind::AssignmentGroup);

    let mut report = SyncReport::new();
    let remote = ctx.list(&collection)?;
    for group in remote.iter() {
        let name = group.title().unwrap_or_default();
        if !groups.iter().any(|g| g.name == name) {
            error!(
                course = course.name(),
                group = name,
                "Assignment group has no local counterpart; remove it manually"
            );
            report.record(course.name(), name, SyncOutcome::Orphaned);
        }
    }

    for group in &groups {
        let desired = Value::Object(group.fields.clone());
        let outcome = match sync_resource(ctx, &collection, &group.name, &desired) {
            Ok(synced) => synced.outcome,
            Err(e) => {
                error!(course = course.name(), group = %group.name, error = %e, "Assignment group sync failed");
                SyncOutcome::Failed(e.to_string())
            }
        };
        report.record(course.name(), &group.name, outcome);
    }

    info!(course = course.name(), groups = groups.len(), "Assignment groups synced");
    Ok(report)
}
