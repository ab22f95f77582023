//! Error types for course-fs

use std::path::PathBuf;

/// Result type for course-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in course-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config at {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("No {file} found under {path}")]
    CourseFileNotFound { file: String, path: PathBuf },

    #[error("Multiple {file} files found under {path}: {found:?}")]
    MultipleCourseFiles {
        file: String,
        path: PathBuf,
        found: Vec<PathBuf>,
    },

    #[error("Could not find a course root for {path}")]
    CourseRootNotFound { path: PathBuf },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
