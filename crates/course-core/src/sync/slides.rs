//! Slide decks from `slides/slide-*.md`
//!
//! A deck is rendered to standalone HTML next to its source, uploaded as a
//! course file and announced by a companion page source
//! (`pages/page-slide-*.md`) that links to the upload. The uploaded hash is
//! tracked per file uuid so an unchanged deck is not uploaded again.

use std::path::{Path, PathBuf};

use course_content::slides::{companion_page, render_deck, slide_title};
use course_fs::{ContentKind, ContentPaths, hash_text};
use course_remote::{RemoteResource, files_named, upload_bytes};
use tracing::{debug, info, warn};

use super::context::SyncContext;
use super::report::SyncOutcome;
use crate::course::Course;
use crate::{Error, Result};

/// A rendered slide deck.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDeck {
    pub source: PathBuf,
    pub html_path: PathBuf,
    pub title: String,
    pub html: String,
}

impl SlideDeck {
    pub fn filename(&self) -> String {
        self.html_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Render a slide source and write the HTML next to it.
///
/// The deck title is the first level-one heading, or the file stem.
pub fn render_slide(path: &Path) -> Result<SlideDeck> {
    let markdown = course_fs::io::read_text_lossy(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| Error::invalid(path.display().to_string(), "not a slide file"))?;
    let title = slide_title(&markdown).unwrap_or(stem);
    let html = render_deck(&markdown, &title);
    let html_path = path.with_extension("html");

    info!(path = %html_path.display(), bytes = html.len(), "Writing slide HTML");
    course_fs::io::write_text(&html_path, &html)?;
    Ok(SlideDeck {
        source: path.to_path_buf(),
        html_path,
        title,
        html,
    })
}

/// Path of the companion page source for a slide source.
pub fn companion_path(paths: &ContentPaths, slide: &Path) -> PathBuf {
    let name = slide
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    paths.get(ContentKind::Page).join(format!("page-{name}"))
}

/// Upload a rendered deck to a course unless the same content is already
/// there, then write its companion page source.
pub fn sync_slide(ctx: &SyncContext, course: &Course, paths: &ContentPaths, deck: &SlideDeck) -> Result<SyncOutcome> {
    let filename = deck.filename();
    let hash = hash_text(&deck.html);
    let existing = files_named(&ctx.api, &ctx.cache, course.path(), &filename)?;

    if let [file] = existing.as_slice()
        && let Some(uuid) = file.str_field("uuid")
        && ctx.metadata.file_hash(uuid)?.as_ref() == Some(&hash)
    {
        debug!(file = %filename, course = course.name(), "Slide deck unchanged");
        write_companion(paths, deck, file)?;
        return Ok(SyncOutcome::Unchanged);
    }

    let outcome = if existing.is_empty() {
        SyncOutcome::Created
    } else {
        SyncOutcome::Updated
    };
    if ctx.dry_run() {
        info!(file = %filename, course = course.name(), "[dry-run] Would upload slide deck");
        return Ok(outcome);
    }

    let file = upload_bytes(
        &ctx.api,
        &ctx.cache,
        course.path(),
        &filename,
        deck.html.clone().into_bytes(),
    )?
    .apply(&ctx.cache);
    info!(file = %filename, course = course.name(), path = %file.path, "Uploaded slide deck");

    match file.str_field("uuid") {
        Some(uuid) => {
            if !ctx.metadata.set_file_hash(uuid, &hash)? {
                let error = Error::MetadataPersistFailure {
                    target: file.path.to_string(),
                };
                warn!(error = %error, "Deck will be uploaded again next run");
            }
        }
        None => warn!(file = %filename, "Uploaded file has no uuid; its hash is not tracked"),
    }

    write_companion(paths, deck, &file)?;
    Ok(outcome)
}

fn write_companion(paths: &ContentPaths, deck: &SlideDeck, file: &RemoteResource) -> Result<()> {
    let url = file.str_field("url").unwrap_or_default();
    let page = companion_page(&deck.title, url, &deck.filename())?;
    let page_path = companion_path(paths, &deck.source);
    info!(path = %page_path.display(), "Writing slide page");
    course_fs::io::write_text(&page_path, &page)?;
    Ok(())
}
