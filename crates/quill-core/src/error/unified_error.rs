//! UnifiedError trait implementation for QuillError

use super::types::{QuillError, UnifiedError};

impl UnifiedError for QuillError {
    fn error_code(&self) -> &str {
        match self {
            Self::MalformedDiff { .. } => "QUILL_MALFORMED_DIFF",
            Self::ApplyConflict { .. } => "QUILL_APPLY_CONFLICT",
            Self::PatchRejected { .. } => "QUILL_PATCH_REJECTED",
            Self::NotFound { .. } => "QUILL_NOT_FOUND",
            Self::Storage { .. } => "QUILL_STORAGE",
            Self::Io { .. } => "QUILL_IO",
            Self::Json { .. } => "QUILL_JSON",
            Self::Config { .. } => "QUILL_CONFIG",
            Self::InvalidInput { .. } => "QUILL_INVALID_INPUT",
            Self::Other { .. } => "QUILL_OTHER",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MalformedDiff { reason, .. } => reason.clone(),
            Self::ApplyConflict { file, hunk, .. } => {
                format!("hunk #{} does not match {}", hunk, file)
            }
            Self::PatchRejected { reason, .. } => reason.clone(),
            Self::NotFound { message, .. }
            | Self::Storage { message, .. }
            | Self::Io { message, .. }
            | Self::Json { message }
            | Self::Config { message, .. }
            | Self::InvalidInput { message, .. }
            | Self::Other { message } => message.clone(),
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::MalformedDiff { content, .. } => Some(content),
            Self::ApplyConflict { file, .. } | Self::PatchRejected { file, .. } => Some(file),
            Self::NotFound { resource_type, .. } => resource_type.as_deref(),
            Self::Storage { context, .. } | Self::Config { context, .. } => context.as_deref(),
            Self::Io { path, .. } => path.as_deref(),
            Self::InvalidInput { field, .. } => field.as_deref(),
            Self::Json { .. } | Self::Other { .. } => None,
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedDiff { .. } | Self::ApplyConflict { .. } | Self::PatchRejected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            QuillError::malformed_diff(3, "@@ -x +1 @@", "bad header").error_code(),
            "QUILL_MALFORMED_DIFF"
        );
        assert_eq!(QuillError::not_found("cp").error_code(), "QUILL_NOT_FOUND");
        assert_eq!(QuillError::storage("disk").error_code(), "QUILL_STORAGE");
    }

    #[test]
    fn test_recoverable_classes() {
        assert!(QuillError::apply_conflict("main.tex", 2, "a", "b").is_recoverable());
        assert!(QuillError::malformed_diff(1, "x", "y").is_recoverable());
        assert!(!QuillError::storage("disk full").is_recoverable());
        assert!(!QuillError::not_found("abc").is_recoverable());
    }

    #[test]
    fn test_conflict_display_names_file_and_hunk() {
        let err = QuillError::apply_conflict("intro.tex", 2, "old line", "other line");
        let text = err.to_string();
        assert!(text.contains("intro.tex"));
        assert!(text.contains("hunk #2"));
        assert!(text.contains("old line"));
        assert_eq!(err.context(), Some("intro.tex"));
    }
}
