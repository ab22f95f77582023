//! Command implementations for course-cli

pub mod config;
pub mod init;
pub mod sync;

pub use config::{load_config, run_check_config};
pub use init::run_init_course;
pub use sync::{SyncCommand, print_report, run_sync};
