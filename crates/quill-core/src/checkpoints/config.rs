//! Checkpoint manager configuration

use std::path::PathBuf;

use crate::config::CheckpointSettings;

/// Configuration for checkpoint manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointManagerConfig {
    /// Project root directory
    pub project_root: PathBuf,
    /// Base directory for checkpoints
    pub storage_path: PathBuf,
    /// Which files are tracked
    pub settings: CheckpointSettings,
}

impl CheckpointManagerConfig {
    /// Create config with the default settings
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self::from_settings(project_root, &CheckpointSettings::default())
    }

    /// Create config from the `[checkpoints]` section.
    ///
    /// A relative storage directory is taken relative to the project root.
    pub fn from_settings(project_root: impl Into<PathBuf>, settings: &CheckpointSettings) -> Self {
        let project_root = project_root.into();
        let storage_path = if settings.directory.is_absolute() {
            settings.directory.clone()
        } else {
            project_root.join(&settings.directory)
        };
        Self {
            project_root,
            storage_path,
            settings: settings.clone(),
        }
    }

    /// Set storage path
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }
}
