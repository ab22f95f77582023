//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// coursework - Sync course content from local files into the LMS
#[derive(Parser, Debug)]
#[command(name = "coursework")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub loglevel: String,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Items synced concurrently (defaults to the configured value)
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Decide every write without performing it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Exit with a non-zero status when any item fails
    #[arg(long, global = true)]
    pub fail_on_error: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Sync wiki pages from COURSE_DIR/pages/page-*.md
    ///
    /// COURSE_DIR is searched recursively for course.yml files; every
    /// course found receives the same pages.
    SyncPages {
        /// Course directory
        course_dir: PathBuf,
    },

    /// Sync assignments from COURSE_DIR/assignments/assign-*.md
    SyncAssignments {
        /// Course directory
        course_dir: PathBuf,
    },

    /// Sync assignment groups from COURSE_DIR/assignment_groups.yml
    ///
    /// Remote groups missing from the file are reported, never deleted.
    SyncAssignmentGroups {
        /// Course directory
        course_dir: PathBuf,
    },

    /// Sync quizzes and their questions from COURSE_DIR/quizzes/quiz-*.yml
    ///
    /// Examples:
    ///   coursework sync-quizzes csc101              # every quiz
    ///   coursework sync-quizzes csc101 -q "Quiz 1"  # one quiz by title
    SyncQuizzes {
        /// Course directory
        course_dir: PathBuf,

        /// Only sync quizzes with this title (repeatable)
        #[arg(short = 'q', long = "quiz")]
        quizzes: Vec<String>,
    },

    /// Sync modules and module items from COURSE_DIR/modules.yml
    ///
    /// Use --dry-run to see the creates, moves and reorders first.
    SyncModules {
        /// Course directory
        course_dir: PathBuf,
    },

    /// Render COURSE_DIR/slides/slide-*.md, upload the decks and write
    /// their companion pages
    SyncSlides {
        /// Course directory
        course_dir: PathBuf,
    },

    /// Sync each course's syllabus.md (next to its course.yml)
    SyncSyllabus {
        /// Course directory
        course_dir: PathBuf,
    },

    /// Create course directories with course.yml for the account's courses
    ///
    /// Directories are laid out as <root>/<code>/<year>-<period>/<section>.
    /// Text filters are case-insensitive regexes.
    InitCourse {
        /// Only courses offered in this year
        #[arg(short, long)]
        year: Option<i64>,

        /// Only courses whose section matches
        #[arg(short, long)]
        section: Option<String>,

        /// Only courses whose period matches
        #[arg(short, long)]
        period: Option<String>,

        /// Only courses whose code matches
        #[arg(short, long)]
        code: Option<String>,

        /// Only courses whose name matches
        #[arg(short, long)]
        name: Option<String>,

        /// Root directory (defaults to the configured root_dir)
        #[arg(long)]
        root_dir: Option<PathBuf>,
    },

    /// Validate the configuration against the LMS
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["coursework", "sync-modules", "course", "--dry-run", "--workers", "2"]);
        assert!(cli.dry_run);
        assert_eq!(cli.workers, Some(2));
        assert_eq!(
            cli.command,
            Commands::SyncModules {
                course_dir: PathBuf::from("course")
            }
        );
    }

    #[test]
    fn repeated_quiz_names() {
        let cli = Cli::parse_from(["coursework", "sync-quizzes", "c", "-q", "Quiz 1", "-q", "Quiz 2"]);
        match cli.command {
            Commands::SyncQuizzes { quizzes, .. } => assert_eq!(quizzes, vec!["Quiz 1", "Quiz 2"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn init_course_filters() {
        let cli = Cli::parse_from(["coursework", "init-course", "-y", "2024", "-c", "csc", "-p", "fall"]);
        match cli.command {
            Commands::InitCourse {
                year, code, period, section, ..
            } => {
                assert_eq!(year, Some(2024));
                assert_eq!(code.as_deref(), Some("csc"));
                assert_eq!(period.as_deref(), Some("fall"));
                assert_eq!(section, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
