//! Error types for geo-board

use thiserror::Error;

/// Main error type for geo-board operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range input, reported against a single field
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Point not found: {0}")]
    PointNotFound(u64),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    /// Build a validation error for `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for geo-board operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = Error::validation("radius", "must be at least 0");
        assert_eq!(err.to_string(), "Invalid radius: must be at least 0");
    }

    #[test]
    fn test_storage_error_display() {
        let err = Error::Storage("lock poisoned".to_string());
        assert_eq!(err.to_string(), "Storage error: lock poisoned");
    }
}
