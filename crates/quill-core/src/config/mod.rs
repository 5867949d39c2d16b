//! Configuration for quill
//!
//! Configuration is layered: built-in defaults, then an optional file
//! (`.toml`, `.yaml`/`.yml` or JSON), then `QUILL_*` environment variables.

mod env_loader;
mod file_loader;
mod logging_config;
mod model;
mod validation;

pub use env_loader::apply_env_overrides;
pub use file_loader::load_from_file;
pub use logging_config::{LogFormat, LoggingConfig};
pub use model::{CheckpointSettings, QuillConfig, SafetyConfig};
pub use validation::validate_config;

use crate::error::QuillResult;
use std::path::Path;

/// Name of the project-local directory holding quill state
pub const PROJECT_DIR: &str = ".quill";

/// Default configuration file, relative to the project root
pub const DEFAULT_CONFIG_FILE: &str = ".quill/config.toml";

/// Load, override and validate configuration in one step
pub fn load_config(path: &Path) -> QuillResult<QuillConfig> {
    let mut config = load_from_file(path)?;
    apply_env_overrides(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}
