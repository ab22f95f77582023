//! coursework CLI
//!
//! Syncs course content kept in local files (pages, assignments, quizzes,
//! modules, slides, syllabi) into an LMS course.

mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use course_core::{CourseFilter, SyncOptions};

use cli::{Cli, Commands};
use commands::SyncCommand;
use error::{CliError, Result};

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    logging::init(&cli.loglevel)?;
    let config_path = cli.config_path.as_deref();

    let command = match cli.command {
        Commands::CheckConfig => {
            commands::run_check_config(config_path)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::InitCourse {
            year,
            section,
            period,
            code,
            name,
            root_dir,
        } => {
            let config = commands::load_config(config_path)?;
            let filter = CourseFilter {
                year,
                section,
                period,
                code,
                name,
            };
            commands::run_init_course(&config, &filter, root_dir)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::SyncPages { course_dir } => SyncCommand::Pages(course_dir),
        Commands::SyncAssignments { course_dir } => SyncCommand::Assignments(course_dir),
        Commands::SyncAssignmentGroups { course_dir } => SyncCommand::AssignmentGroups(course_dir),
        Commands::SyncQuizzes { course_dir, quizzes } => SyncCommand::Quizzes(course_dir, quizzes),
        Commands::SyncModules { course_dir } => SyncCommand::Modules(course_dir),
        Commands::SyncSlides { course_dir } => SyncCommand::Slides(course_dir),
        Commands::SyncSyllabus { course_dir } => SyncCommand::Syllabus(course_dir),
    };

    if !command.dir().exists() {
        return Err(CliError::user(format!(
            "Course directory does not exist: {}",
            command.dir().display()
        )));
    }

    let config = commands::load_config(config_path)?;
    let options = SyncOptions {
        dry_run: cli.dry_run,
        workers: cli.workers.unwrap_or(config.workers),
    };
    let report = commands::run_sync(&config, options, &command)?;

    // best effort by default: item failures only change the exit code on request
    if cli.fail_on_error && !report.success() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
