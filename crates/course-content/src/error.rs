//! Error types for course-content

/// Result type for course-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading local course documents
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse {format} content: {message}")]
    ParseError { format: String, message: String },

    #[error("{item} is missing required field `{field}`")]
    MissingField { item: String, field: String },

    #[error("Invalid {item}: {message}")]
    Invalid { item: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn parse(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn missing(item: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            item: item.into(),
            field: field.into(),
        }
    }

    pub fn invalid(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            item: item.into(),
            message: message.into(),
        }
    }
}
