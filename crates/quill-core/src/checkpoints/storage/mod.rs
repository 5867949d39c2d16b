//! Checkpoint storage implementations
//!
//! Stores are append-only: a saved checkpoint is never rewritten and there is
//! no delete. Ids are assigned by the store and stay valid forever.

use crate::error::{QuillError, QuillResult};
use async_trait::async_trait;

use super::types::{Checkpoint, CheckpointId, CheckpointType, Snapshot};

mod compression;
mod file_storage;

#[cfg(test)]
mod memory_storage;


pub use file_storage::FileCheckpointStorage;

#[cfg(test)]
pub use memory_storage::MemoryCheckpointStorage;

/// Trait for checkpoint storage backends
#[async_trait]
pub trait CheckpointStorage: Send + Sync {
    /// Persist a snapshot; returns once metadata and content are durable
    async fn save(
        &self,
        snapshot: &Snapshot,
        description: &str,
        checkpoint_type: CheckpointType,
    ) -> QuillResult<Checkpoint>;

    /// Load checkpoint metadata by ID
    async fn load(&self, id: &CheckpointId) -> QuillResult<Option<Checkpoint>>;

    /// Load the full snapshot of a checkpoint.
    ///
    /// Fails with `NotFound` for an unknown id and with a storage error if
    /// any file's content cannot be retrieved intact.
    async fn load_snapshot(&self, id: &CheckpointId) -> QuillResult<Snapshot>;

    /// List all checkpoints, newest first
    async fn list(&self) -> QuillResult<Vec<CheckpointSummary>>;

    /// Check if a checkpoint exists
    async fn exists(&self, id: &CheckpointId) -> QuillResult<bool> {
        Ok(self.load(id).await?.is_some())
    }

    /// Get the latest checkpoint
    async fn latest(&self) -> QuillResult<Option<Checkpoint>> {
        match self.list().await?.first() {
            Some(summary) => self.load(&summary.id).await,
            None => Ok(None),
        }
    }
}

/// Summary of a checkpoint for listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSummary {
    pub id: CheckpointId,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub sequence: u64,
    pub checkpoint_type: CheckpointType,
    pub file_count: usize,
}

impl From<&Checkpoint> for CheckpointSummary {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            id: checkpoint.id.clone(),
            description: checkpoint.description.clone(),
            created_at: checkpoint.created_at,
            sequence: checkpoint.sequence,
            checkpoint_type: checkpoint.checkpoint_type,
            file_count: checkpoint.files.len(),
        }
    }
}

pub(crate) fn unknown_checkpoint(id: &CheckpointId) -> QuillError {
    QuillError::not_found_resource(format!("checkpoint {}", id), "checkpoint")
}
