//! Error types for course-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from course-core
    #[error(transparent)]
    Core(#[from] course_core::Error),

    /// Error from course-remote
    #[error(transparent)]
    Remote(#[from] course_remote::Error),

    /// Logging could not be set up
    #[error("Could not initialize logging: {0}")]
    Logging(String),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
