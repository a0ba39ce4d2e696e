//! Error handling module for guided tours
//!
//! Provides centralized error types using thiserror. Storage failures have
//! their own type because the storage adapter never surfaces them; everything
//! that can abort building or starting a tour is a `TourError`.

use thiserror::Error;

/// Failure reported by a storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend is not available on this host
    #[error("Storage backend unsupported")]
    Unsupported,

    /// The backend rejected or failed the operation
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// IO errors from file-backed storage
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Main error type for tour construction and lifecycle
#[derive(Error, Debug)]
pub enum TourError {
    /// A step asks for highlighting but has no target element
    #[error("Step {index} highlights its target but does not name one")]
    MissingTarget { index: usize },

    /// A target selector matched nothing on the page
    #[error("Target element not found: {0}")]
    TargetNotFound(String),

    /// Engine lifecycle errors (no steps, no current step, ...)
    #[error("Engine error: {0}")]
    Engine(String),

    /// Page/element errors
    #[error("Page error: {0}")]
    Page(String),
}

/// Result type alias for tour operations
pub type Result<T> = std::result::Result<T, TourError>;

impl TourError {
    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a page error
    pub fn page(msg: impl Into<String>) -> Self {
        Self::Page(msg.into())
    }

    /// Create a target-not-found error
    pub fn target_not_found(selector: impl Into<String>) -> Self {
        Self::TargetNotFound(selector.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TourError::MissingTarget { index: 2 };
        assert_eq!(
            err.to_string(),
            "Step 2 highlights its target but does not name one"
        );

        let err = TourError::target_not_found("#menu");
        assert_eq!(err.to_string(), "Target element not found: #menu");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StorageError = io_err.into();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
