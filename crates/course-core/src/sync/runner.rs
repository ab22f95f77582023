//! SyncEngine: one entry point per sync command
//!
//! Every command discovers the courses under a path (each `course.yml`
//! names one remote course), finds the content next to them and fans the
//! work out over the batch driver. Per-item errors are logged and recorded
//! as [`SyncOutcome::Failed`]; only discovery errors fail a whole command.

use std::path::{Path, PathBuf};

use course_fs::{ContentKind, ContentPaths};
use tracing::{error, info, warn};

use super::assignment::sync_assignment;
use super::context::SyncContext;
use super::engine::Synced;
use super::group::sync_assignment_groups;
use super::module::sync_modules;
use super::page::sync_page;
use super::quiz::{quiz_title, sync_quiz};
use super::report::{SyncOutcome, SyncReport};
use super::slides::{SlideDeck, render_slide, sync_slide};
use super::syllabus::sync_syllabus;
use crate::Result;
use crate::batch::sync_all;
use crate::course::{Course, courses_from_path};

/// Engine running sync commands against the courses under a path
pub struct SyncEngine {
    ctx: SyncContext,
}

impl SyncEngine {
    pub fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// Sync `pages/page-*.md` into every course.
    pub fn sync_pages(&self, path: &Path) -> Result<SyncReport> {
        self.sync_files(path, ContentKind::Page, sync_page)
    }

    /// Sync `assignments/assign-*.md` into every course.
    pub fn sync_assignments(&self, path: &Path) -> Result<SyncReport> {
        self.sync_files(path, ContentKind::Assignment, sync_assignment)
    }

    /// Sync `quizzes/quiz-*.yml` into every course.
    ///
    /// With `names`, only quizzes whose title is listed are synced.
    pub fn sync_quizzes(&self, path: &Path, names: &[String]) -> Result<SyncReport> {
        if names.is_empty() {
            return self.sync_files(path, ContentKind::Quiz, sync_quiz);
        }

        let courses = courses_from_path(&self.ctx.api, path)?;
        let files: Vec<PathBuf> = ContentPaths::discover(path)?
            .list(ContentKind::Quiz)?
            .into_iter()
            .filter(|file| match quiz_title(file) {
                Ok(Some(title)) => names.contains(&title),
                Ok(None) => false,
                // unreadable files are kept so the failure is reported
                Err(_) => true,
            })
            .collect();
        if files.is_empty() {
            warn!(names = %names.join(", "), "No quiz matches the requested names");
        }
        let report = self.run_files(&courses, &files, sync_quiz);
        self.finish("quizzes", &report);
        Ok(report)
    }

    /// Sync `assignment_groups.yml` into every course.
    pub fn sync_assignment_groups(&self, path: &Path) -> Result<SyncReport> {
        self.sync_document(path, ContentKind::AssignmentGroups, sync_assignment_groups)
    }

    /// Sync `modules.yml` into every course.
    pub fn sync_modules(&self, path: &Path) -> Result<SyncReport> {
        self.sync_document(path, ContentKind::Module, sync_modules)
    }

    /// Render `slides/slide-*.md`, upload the decks to every course and
    /// write their companion pages.
    pub fn sync_slides(&self, path: &Path) -> Result<SyncReport> {
        let courses = courses_from_path(&self.ctx.api, path)?;
        let paths = ContentPaths::discover(path)?;
        let sources = paths.list(ContentKind::Slide)?;

        let mut report = SyncReport::new();
        let mut decks: Vec<SlideDeck> = Vec::new();
        for source in &sources {
            match render_slide(source) {
                Ok(deck) => decks.push(deck),
                Err(e) => {
                    error!(path = %source.display(), error = %e, "Slide deck not rendered");
                    for course in &courses {
                        report.record(course.name(), file_label(source), SyncOutcome::Failed(e.to_string()));
                    }
                }
            }
        }

        let jobs: Vec<(&Course, &SlideDeck)> = courses
            .iter()
            .flat_map(|course| decks.iter().map(move |deck| (course, deck)))
            .collect();
        let outcomes = sync_all(&jobs, self.ctx.options.workers, |(course, deck)| {
            sync_slide(&self.ctx, course, &paths, deck).unwrap_or_else(|e| {
                error!(course = course.name(), deck = %deck.filename(), error = %e, "Slide sync failed");
                SyncOutcome::Failed(e.to_string())
            })
        });
        for ((course, deck), outcome) in jobs.iter().zip(outcomes) {
            report.record(course.name(), file_label(&deck.source), outcome);
        }
        self.finish("slides", &report);
        Ok(report)
    }

    /// Push `syllabus.md` into every course that has one.
    pub fn sync_syllabus(&self, path: &Path) -> Result<SyncReport> {
        let courses = courses_from_path(&self.ctx.api, path)?;
        let outcomes = sync_all(&courses, self.ctx.options.workers, |course| {
            sync_syllabus(&self.ctx, course).unwrap_or_else(|e| {
                error!(course = course.name(), error = %e, "Syllabus sync failed");
                Some(SyncOutcome::Failed(e.to_string()))
            })
        });

        let mut report = SyncReport::new();
        for (course, outcome) in courses.iter().zip(outcomes) {
            if let Some(outcome) = outcome {
                report.record(course.name(), course_fs::SYLLABUS_FILE, outcome);
            }
        }
        self.finish("syllabus", &report);
        Ok(report)
    }

    fn sync_files<F>(&self, path: &Path, kind: ContentKind, op: F) -> Result<SyncReport>
    where
        F: Fn(&SyncContext, &Course, &Path) -> Result<Synced> + Sync,
    {
        let courses = courses_from_path(&self.ctx.api, path)?;
        let files = ContentPaths::discover(path)?.list(kind)?;
        if files.is_empty() {
            warn!(kind = kind.location(), "No content files found");
        }
        let report = self.run_files(&courses, &files, op);
        self.finish(kind.location(), &report);
        Ok(report)
    }

    /// Sync every file into every course, in parallel.
    fn run_files<F>(&self, courses: &[Course], files: &[PathBuf], op: F) -> SyncReport
    where
        F: Fn(&SyncContext, &Course, &Path) -> Result<Synced> + Sync,
    {
        let jobs: Vec<(&Course, &PathBuf)> = courses
            .iter()
            .flat_map(|course| files.iter().map(move |file| (course, file)))
            .collect();

        let outcomes = sync_all(&jobs, self.ctx.options.workers, |(course, file)| {
            match op(&self.ctx, course, file) {
                Ok(synced) => synced.outcome,
                Err(e) => {
                    error!(course = course.name(), file = %file.display(), error = %e, "Sync failed");
                    SyncOutcome::Failed(e.to_string())
                }
            }
        });

        let mut report = SyncReport::new();
        for ((course, file), outcome) in jobs.iter().zip(outcomes) {
            report.record(course.name(), file_label(file), outcome);
        }
        report
    }

    /// Sync a single per-course document (`modules.yml`,
    /// `assignment_groups.yml`), one course per worker.
    fn sync_document<F>(&self, path: &Path, kind: ContentKind, op: F) -> Result<SyncReport>
    where
        F: Fn(&SyncContext, &Course, &Path) -> Result<SyncReport> + Sync,
    {
        let courses = courses_from_path(&self.ctx.api, path)?;
        let Some(document) = ContentPaths::discover(path)?.list(kind)?.into_iter().next() else {
            warn!(file = kind.location(), "Nothing to sync");
            return Ok(SyncReport::new());
        };

        let reports = sync_all(&courses, self.ctx.options.workers, |course| {
            op(&self.ctx, course, &document).unwrap_or_else(|e| {
                error!(course = course.name(), file = %document.display(), error = %e, "Sync failed");
                let mut failed = SyncReport::new();
                failed.record(course.name(), file_label(&document), SyncOutcome::Failed(e.to_string()));
                failed
            })
        });

        let mut report = SyncReport::new();
        for course_report in reports {
            report.merge(course_report);
        }
        self.finish(kind.location(), &report);
        Ok(report)
    }

    fn finish(&self, what: &str, report: &SyncReport) {
        let counts = report.counts();
        info!(
            what,
            created = counts.created,
            updated = counts.updated,
            unchanged = counts.unchanged,
            orphaned = counts.orphaned,
            failed = counts.failed,
            dry_run = self.ctx.dry_run(),
            "Sync finished"
        );
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
