//! Wiki pages from `pages/page-*.md`

use std::path::Path;

use course_content::PageDoc;
use course_remote::ResourceKind;

use super::context::SyncContext;
use super::engine::{Synced, sync_resource};
use crate::Result;
use crate::course::Course;

/// Sync one page file into a course. Pages are matched by title.
pub fn sync_page(ctx: &SyncContext, course: &Course, path: &Path) -> Result<Synced> {
    let source = course_fs::io::read_text_lossy(path)?;
    let page = PageDoc::from_source(&source, ctx.renderer.as_ref())?;
    let collection = course.path().collection(ResourceKind::Page);
    sync_resource(ctx, &collection, &page.title, &page.desired())
}
