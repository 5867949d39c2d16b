//! CLI commands

pub mod apply;
pub mod checkpoint;
pub mod history;

use quill_core::{CheckpointManager, CheckpointManagerConfig, QuillConfig};
use std::path::Path;

/// Checkpoint manager for `project` as configured
pub(crate) fn checkpoint_manager(project: &Path, config: &QuillConfig) -> CheckpointManager {
    CheckpointManager::new(CheckpointManagerConfig::from_settings(
        project,
        &config.checkpoints,
    ))
}
