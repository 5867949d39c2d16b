//! Checkpoint creation

use crate::error::QuillResult;
use tracing::info;

use super::super::types::{Checkpoint, CheckpointType};
use super::types::CheckpointManager;

impl CheckpointManager {
    /// Snapshot every tracked file as a manual checkpoint
    pub async fn create(&self, description: impl Into<String>) -> QuillResult<Checkpoint> {
        self.create_with_type(description, CheckpointType::Manual)
            .await
    }

    /// Snapshot every tracked file.
    ///
    /// Holds the project lock shared, so it never observes a half-applied
    /// patch or restore.
    pub async fn create_with_type(
        &self,
        description: impl Into<String>,
        checkpoint_type: CheckpointType,
    ) -> QuillResult<Checkpoint> {
        let _guard = self.lock.shared().await;
        self.create_unlocked(&description.into(), checkpoint_type)
            .await
    }

    /// Create without taking the lock; the caller already holds it
    pub(super) async fn create_unlocked(
        &self,
        description: &str,
        checkpoint_type: CheckpointType,
    ) -> QuillResult<Checkpoint> {
        info!("Creating {} checkpoint: {}", checkpoint_type, description);

        let snapshot = self.tracker.capture().await?;
        let checkpoint = self
            .storage
            .save(&snapshot, description, checkpoint_type)
            .await?;

        info!(
            "Created checkpoint {} with {} files",
            checkpoint.short_id(),
            checkpoint.file_count()
        );

        Ok(checkpoint)
    }
}
