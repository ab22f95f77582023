//! init-course command implementation

use std::path::PathBuf;

use colored::Colorize;
use course_core::config::expand_home;
use course_core::{CourseFilter, ValidatedConfig, init_course};

use crate::error::Result;

/// Run the init-course command
///
/// Writes a course.yml for every matching course below `root_dir`, or
/// below the configured root when none is given.
pub fn run_init_course(config: &ValidatedConfig, filter: &CourseFilter, root_dir: Option<PathBuf>) -> Result<()> {
    let root = root_dir
        .map(|dir| expand_home(&dir.to_string_lossy()))
        .unwrap_or_else(|| config.root_dir.clone());
    println!(
        "{} Initializing courses under {}...",
        "=>".blue().bold(),
        root.display().to_string().cyan()
    );

    let written = init_course(&config.api, &config.rules, &root, filter)?;

    if written.is_empty() {
        println!("{} No course matched.", "WARN".yellow().bold());
        return Ok(());
    }
    for path in &written {
        println!("   {} {}", "+".green(), path.display());
    }
    println!("{} {} course(s) initialized.", "OK".green().bold(), written.len());
    Ok(())
}
