//! Assignments from `assignments/assign-*.md`

use std::path::Path;

use course_content::AssignmentDoc;
use course_remote::ResourceKind;
use serde_json::Value;

use super::context::SyncContext;
use super::engine::{Synced, sync_resource};
use super::group::resolve_group;
use crate::Result;
use crate::course::Course;

/// Sync one assignment file into a course. Assignments are matched by
/// name; an `assignment_group` prefix is resolved to the group's id.
pub fn sync_assignment(ctx: &SyncContext, course: &Course, path: &Path) -> Result<Synced> {
    let source = course_fs::io::read_text_lossy(path)?;
    let doc = AssignmentDoc::from_source(&source, ctx.renderer.as_ref())?;

    let mut desired = doc.fields;
    if let Some(prefix) = &doc.assignment_group {
        desired.insert("assignment_group_id".into(), resolve_group(ctx, course, prefix)?);
    }

    let collection = course.path().collection(ResourceKind::Assignment);
    sync_resource(ctx, &collection, &doc.name, &Value::Object(desired))
}
