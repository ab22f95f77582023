//! Error types for course-core

use std::path::PathBuf;

/// Result type for course-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur syncing a course
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A local content item lacks a field needed to sync it
    #[error("{item} has no `{field}`")]
    MissingRequiredField { item: String, field: String },

    /// More than one remote resource matches a natural key
    #[error("{count} remote {kind} match \"{key}\"")]
    AmbiguousMatch {
        kind: String,
        key: String,
        count: usize,
    },

    /// A referenced remote resource does not exist
    #[error("No remote {kind} matches \"{key}\"")]
    NotFound { kind: String, key: String },

    /// The LMS rejected a create, update or delete
    #[error("{method} {url} was rejected with {status}: {body}")]
    RemoteWriteFailure {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Sync metadata could not be written back
    #[error("Could not persist sync metadata for {target}")]
    MetadataPersistFailure { target: String },

    /// Configuration is unusable; every reason is listed
    #[error("Invalid configuration:\n  - {}", .0.join("\n  - "))]
    Configuration(Vec<String>),

    /// A local content file is malformed
    #[error("{item}: {message}")]
    InvalidContent { item: String, message: String },

    /// A directory holds no course descriptors
    #[error("No courses found under {path}")]
    NoCourses { path: PathBuf },

    #[error(transparent)]
    Fs(#[from] course_fs::Error),

    #[error(transparent)]
    Remote(course_remote::Error),
}

impl Error {
    pub fn ambiguous(kind: impl ToString, key: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousMatch {
            kind: kind.to_string(),
            key: key.into(),
            count,
        }
    }

    pub fn not_found(kind: impl ToString, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            key: key.into(),
        }
    }

    pub fn missing(item: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            item: item.into(),
            field: field.into(),
        }
    }

    pub fn invalid(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            item: item.into(),
            message: message.into(),
        }
    }
}

impl From<course_remote::Error> for Error {
    fn from(error: course_remote::Error) -> Self {
        match error {
            course_remote::Error::Status {
                method,
                url,
                status,
                body,
            } if method != "GET" => Self::RemoteWriteFailure {
                method,
                url,
                status,
                body,
            },
            course_remote::Error::Fs(e) => Self::Fs(e),
            other => Self::Remote(other),
        }
    }
}

impl From<course_content::Error> for Error {
    fn from(error: course_content::Error) -> Self {
        match error {
            course_content::Error::MissingField { item, field } => {
                Self::MissingRequiredField { item, field }
            }
            course_content::Error::ParseError { format, message } => Self::InvalidContent {
                item: format!("{format} document"),
                message,
            },
            course_content::Error::Invalid { item, message } => Self::InvalidContent { item, message },
            course_content::Error::Json(e) => Self::InvalidContent {
                item: "document".into(),
                message: e.to_string(),
            },
        }
    }
}
