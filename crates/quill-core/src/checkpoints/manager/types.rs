//! Checkpoint manager types and construction

use crate::error::QuillResult;
use crate::lock::ProjectLock;
use std::sync::Arc;

use super::super::config::CheckpointManagerConfig;
use super::super::storage::{CheckpointStorage, FileCheckpointStorage, unknown_checkpoint};
use super::super::tracking::FileTracker;
use super::super::types::{Checkpoint, CheckpointId};

/// Checkpoint manager for creating and restoring checkpoints
pub struct CheckpointManager {
    pub(super) config: CheckpointManagerConfig,
    pub(super) storage: Arc<dyn CheckpointStorage>,
    pub(super) tracker: FileTracker,
    pub(super) lock: ProjectLock,
}

impl CheckpointManager {
    /// Create a new checkpoint manager backed by on-disk storage
    pub fn new(config: CheckpointManagerConfig) -> Self {
        let storage = Arc::new(FileCheckpointStorage::new(&config.storage_path));
        Self::with_storage(config, storage)
    }

    /// Create with custom storage
    pub fn with_storage(
        config: CheckpointManagerConfig,
        storage: Arc<dyn CheckpointStorage>,
    ) -> Self {
        let tracker = FileTracker::from_settings(&config.project_root, &config.settings);
        let lock = ProjectLock::for_root(&config.project_root);

        Self {
            config,
            storage,
            tracker,
            lock,
        }
    }

    /// Replace the file tracker, e.g. to track an explicit file list
    pub fn with_tracker(mut self, tracker: FileTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &CheckpointManagerConfig {
        &self.config
    }

    pub fn tracker(&self) -> &FileTracker {
        &self.tracker
    }

    pub(super) async fn load_checkpoint_or_error(&self, id: &CheckpointId) -> QuillResult<Checkpoint> {
        self.storage
            .load(id)
            .await?
            .ok_or_else(|| unknown_checkpoint(id))
    }
}
