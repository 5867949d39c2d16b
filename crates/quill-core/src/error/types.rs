//! Core error types and traits for quill

use thiserror::Error;

/// Result type alias for quill operations
pub type QuillResult<T> = Result<T, QuillError>;

/// Unified error trait implemented by [`QuillError`].
///
/// Gives callers a stable code for programmatic handling and tells them
/// whether retrying with fresh input (a regenerated diff, a different id)
/// can succeed.
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> String;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Whether the caller can recover by supplying different input
    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Main error type for quill
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuillError {
    /// Diff text that does not follow the unified grammar
    #[error("Malformed diff at line {line}: {reason} (`{content}`)")]
    MalformedDiff {
        /// 1-based line number inside the diff text
        line: usize,
        /// The offending line
        content: String,
        reason: String,
    },

    /// A hunk's pre-image could not be located in the target file
    #[error("Apply conflict in {file}, hunk #{hunk}: expected\n{expected}\nfound\n{actual}")]
    ApplyConflict {
        file: String,
        /// 1-based hunk index within the patch
        hunk: usize,
        expected: String,
        actual: String,
    },

    /// A patch refused by the safety validator
    #[error("Patch rejected for {file}: {reason}")]
    PatchRejected { file: String, reason: String },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        resource_type: Option<String>,
    },

    /// Durable storage read/write failures
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        context: Option<String>,
    },

    /// IO errors outside the checkpoint store
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
    },

    /// Generic error
    #[error("Error: {message}")]
    Other { message: String },
}
