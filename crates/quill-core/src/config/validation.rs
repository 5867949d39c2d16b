//! Configuration validation

use super::model::QuillConfig;
use crate::error::{QuillError, QuillResult};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a configuration before it is used
pub fn validate_config(config: &QuillConfig) -> QuillResult<()> {
    if config.safety.max_changed_lines == 0 {
        return Err(QuillError::config("safety.max_changed_lines must be greater than 0"));
    }

    if config.safety.allowlist.is_empty() {
        return Err(QuillError::config(
            "safety.allowlist is empty; no patch could ever be applied",
        ));
    }

    for pattern in config
        .safety
        .allowlist
        .iter()
        .chain(config.safety.denylist.iter())
    {
        glob::Pattern::new(pattern).map_err(|e| {
            QuillError::config_with_context(
                format!("Invalid glob pattern '{}': {}", pattern, e),
                "safety",
            )
        })?;
    }

    if config.checkpoints.tracked_extensions.is_empty() {
        return Err(QuillError::config(
            "checkpoints.tracked_extensions must name at least one extension",
        ));
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        return Err(QuillError::config(format!(
            "Unknown log level '{}'",
            config.logging.level
        )));
    }

    Ok(())
}
