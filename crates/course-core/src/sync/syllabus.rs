//! Course syllabus from `syllabus.md` next to `course.yml`

use course_fs::{SYLLABUS_FILE, hash_dict};
use serde_json::json;
use tracing::{debug, info};

use super::context::SyncContext;
use super::engine::persist;
use super::report::SyncOutcome;
use crate::Result;
use crate::course::Course;

/// Push a course's rendered syllabus into its `syllabus_body`.
///
/// Returns `None` when the course directory has no syllabus. The hash is
/// kept in the course's own sync metadata.
pub fn sync_syllabus(ctx: &SyncContext, course: &Course) -> Result<Option<SyncOutcome>> {
    let path = course.dir().join(SYLLABUS_FILE);
    if !path.is_file() {
        debug!(course = course.name(), "No syllabus");
        return Ok(None);
    }

    let markdown = course_fs::io::read_text_lossy(&path)?;
    let desired = json!({ "syllabus_body": ctx.renderer.render_fragment(&markdown) });
    let hash = hash_dict(&desired);

    let mut metadata = if ctx.dry_run() {
        ctx.metadata.read(&course.resource)?.unwrap_or_default()
    } else {
        ctx.metadata.get(&course.resource)?
    };
    if metadata.hash.as_ref() == Some(&hash) {
        debug!(course = course.name(), "Syllabus unchanged");
        return Ok(Some(SyncOutcome::Unchanged));
    }

    if ctx.dry_run() {
        info!(course = course.name(), "[dry-run] Would update syllabus");
        return Ok(Some(SyncOutcome::Updated));
    }

    let updated = ctx.update(&course.resource, &desired)?;
    info!(course = course.name(), path = %updated.path, "Updated syllabus");
    metadata.hash = Some(hash);
    persist(ctx, &updated, &metadata);
    Ok(Some(SyncOutcome::Updated))
}
