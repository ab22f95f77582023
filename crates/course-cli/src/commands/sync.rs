//! Sync command implementations
//!
//! Every sync command runs against the courses found under a directory and
//! ends with a summary of per-item outcomes.

use std::path::{Path, PathBuf};

use colored::Colorize;
use course_core::{SyncContext, SyncEngine, SyncOptions, SyncOutcome, SyncReport, ValidatedConfig};

use crate::error::Result;

/// A sync command and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    Pages(PathBuf),
    Assignments(PathBuf),
    AssignmentGroups(PathBuf),
    Quizzes(PathBuf, Vec<String>),
    Modules(PathBuf),
    Slides(PathBuf),
    Syllabus(PathBuf),
}

impl SyncCommand {
    pub fn title(&self) -> &'static str {
        match self {
            SyncCommand::Pages(_) => "pages",
            SyncCommand::Assignments(_) => "assignments",
            SyncCommand::AssignmentGroups(_) => "assignment groups",
            SyncCommand::Quizzes(..) => "quizzes",
            SyncCommand::Modules(_) => "modules",
            SyncCommand::Slides(_) => "slides",
            SyncCommand::Syllabus(_) => "syllabus",
        }
    }

    pub fn dir(&self) -> &Path {
        match self {
            SyncCommand::Pages(dir)
            | SyncCommand::Assignments(dir)
            | SyncCommand::AssignmentGroups(dir)
            | SyncCommand::Quizzes(dir, _)
            | SyncCommand::Modules(dir)
            | SyncCommand::Slides(dir)
            | SyncCommand::Syllabus(dir) => dir,
        }
    }
}

/// Run a sync command
///
/// Returns the report; item failures are in the report, not an error.
pub fn run_sync(config: &ValidatedConfig, options: SyncOptions, command: &SyncCommand) -> Result<SyncReport> {
    let dry_run = options.dry_run;
    println!(
        "{} Syncing {}{}...",
        "=>".blue().bold(),
        command.title(),
        if dry_run { " (dry run)" } else { "" }
    );

    let ctx = SyncContext::new(config.api.clone(), options).with_namespace(&config.namespace);
    let engine = SyncEngine::new(ctx);

    let report = match command {
        SyncCommand::Pages(dir) => engine.sync_pages(dir)?,
        SyncCommand::Assignments(dir) => engine.sync_assignments(dir)?,
        SyncCommand::AssignmentGroups(dir) => engine.sync_assignment_groups(dir)?,
        SyncCommand::Quizzes(dir, names) => engine.sync_quizzes(dir, names)?,
        SyncCommand::Modules(dir) => engine.sync_modules(dir)?,
        SyncCommand::Slides(dir) => engine.sync_slides(dir)?,
        SyncCommand::Syllabus(dir) => engine.sync_syllabus(dir)?,
    };

    print_report(&report, dry_run);
    Ok(report)
}

/// Print per-item outcomes, actions and totals.
pub fn print_report(report: &SyncReport, dry_run: bool) {
    for item in &report.items {
        let marker = match &item.outcome {
            SyncOutcome::Created => "+".green(),
            SyncOutcome::Updated => "~".cyan(),
            SyncOutcome::Unchanged => "=".dimmed(),
            SyncOutcome::Orphaned => "?".yellow(),
            SyncOutcome::Failed(_) => "!".red(),
        };
        let outcome = match &item.outcome {
            SyncOutcome::Failed(reason) => reason.red().to_string(),
            SyncOutcome::Orphaned => "exists only remotely; remove it manually".yellow().to_string(),
            other => other.label().dimmed().to_string(),
        };
        println!("   {} {} ({}): {}", marker, item.item.cyan(), item.course.dimmed(), outcome);
    }

    if !report.actions.is_empty() {
        println!();
        for action in &report.actions {
            println!("   {} {}", "-".blue(), action);
        }
    }

    let counts = report.counts();
    println!();
    let status = if report.success() {
        "OK".green().bold()
    } else {
        "FAILED".red().bold()
    };
    println!(
        "{} {} created, {} updated, {} unchanged, {} orphaned, {} failed{}",
        status,
        counts.created,
        counts.updated,
        counts.unchanged,
        counts.orphaned,
        counts.failed,
        if dry_run { " (dry run, nothing written)" } else { "" }
    );
}
