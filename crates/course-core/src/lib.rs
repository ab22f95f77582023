//! Sync orchestration for coursework
//!
//! This crate ties the Layer 0 crates together:
//!
//! - **Configuration**: resolve the config file and environment, validate
//!   it against the LMS before any sync
//! - **Courses**: discover `course.yml` descriptors and derive institution
//!   metadata from remote course records
//! - **SyncEngine**: hash-guarded, idempotent sync of pages, assignments,
//!   assignment groups, quizzes, modules, slides and syllabi
//! - **Batch driver**: bounded worker pool over independent items
//!
//! # Architecture
//!
//! ```text
//!                       course-cli
//!                           |
//!                      course-core
//!                           |
//!        +------------------+------------------+
//!        |                  |                  |
//!    course-fs       course-content     course-remote
//! ```
//!
//! # Example
//!
//! ```ignore
//! use course_core::{SyncContext, SyncEngine, SyncOptions};
//!
//! let engine = SyncEngine::new(SyncContext::new(api, SyncOptions::default()));
//! let report = engine.sync_pages(Path::new("courses/csc101"))?;
//! assert!(report.success());
//! ```

pub mod batch;
pub mod config;
pub mod course;
pub mod error;
pub mod init;
pub mod sync;

pub use batch::sync_all;
pub use config::{Config, ConfigResolver, ValidatedConfig, validate};
pub use course::{Course, CourseMetadata, RegexRule, courses_from_path, parse_course_metadata};
pub use error::{Error, Result};
pub use init::{CourseFilter, course_dir, init_course};
pub use sync::{
    Counts, ItemReport, SyncContext, SyncEngine, SyncOptions, SyncOutcome, SyncReport, Synced, sync_resource,
};
