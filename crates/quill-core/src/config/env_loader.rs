//! Environment variable overrides

use super::model::QuillConfig;
use crate::error::{QuillError, QuillResult};
use std::env;

/// Apply `QUILL_*` environment variables on top of a loaded configuration
pub fn apply_env_overrides(config: &mut QuillConfig) -> QuillResult<()> {
    apply_overrides_from(config, |key| env::var(key).ok())
}

pub(super) fn apply_overrides_from<F>(config: &mut QuillConfig, lookup: F) -> QuillResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(window) = lookup("QUILL_FUZZ_WINDOW") {
        config.patch.fuzz_window = window
            .trim()
            .parse()
            .map_err(|_| QuillError::config(format!("Invalid QUILL_FUZZ_WINDOW value '{}'", window)))?;
    }

    if let Some(mode) = lookup("QUILL_WHITESPACE") {
        config.patch.whitespace = mode
            .parse()
            .map_err(|e: String| QuillError::config(format!("Invalid QUILL_WHITESPACE: {}", e)))?;
    }

    if let Some(max) = lookup("QUILL_MAX_CHANGED_LINES") {
        config.safety.max_changed_lines = max.trim().parse().map_err(|_| {
            QuillError::config(format!("Invalid QUILL_MAX_CHANGED_LINES value '{}'", max))
        })?;
    }

    if let Some(level) = lookup("QUILL_LOG_LEVEL") {
        config.logging.level = level;
    }

    Ok(())
}
