//! Local filesystem support for coursework
//!
//! Provides the content hasher used for change detection, course directory
//! discovery, and safe I/O operations.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;

pub use checksum::{ContentHash, canonical_json, hash_bytes, hash_dict, hash_file, hash_text};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use layout::{
    COURSE_FILE, ContentKind, ContentPaths, SYLLABUS_FILE, find_course_files, find_course_root,
    find_one_course_file, resolve_path,
};
