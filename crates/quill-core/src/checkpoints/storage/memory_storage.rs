//! In-memory checkpoint storage implementation

use crate::error::{QuillError, QuillResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;

use super::super::types::{Checkpoint, CheckpointId, CheckpointType, FileRecord, Snapshot};
use super::compression::compute_hash;
use super::{CheckpointStorage, CheckpointSummary, unknown_checkpoint};

/// In-memory checkpoint storage (for testing)
pub struct MemoryCheckpointStorage {
    entries: tokio::sync::RwLock<Vec<(Checkpoint, Snapshot)>>,
    /// Checkpoints whose snapshot reads fail, simulating lost blobs
    unreadable: tokio::sync::RwLock<HashSet<CheckpointId>>,
}

impl MemoryCheckpointStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self {
            entries: tokio::sync::RwLock::new(Vec::new()),
            unreadable: tokio::sync::RwLock::new(HashSet::new()),
        }
    }

    /// Make every later `load_snapshot` of `id` fail
    pub async fn break_snapshot(&self, id: &CheckpointId) {
        self.unreadable.write().await.insert(id.clone());
    }
}

impl Default for MemoryCheckpointStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStorage for MemoryCheckpointStorage {
    async fn save(
        &self,
        snapshot: &Snapshot,
        description: &str,
        checkpoint_type: CheckpointType,
    ) -> QuillResult<Checkpoint> {
        let mut entries = self.entries.write().await;
        let checkpoint = Checkpoint {
            id: CheckpointId::new(),
            description: description.to_string(),
            created_at: Utc::now(),
            sequence: entries.len() as u64 + 1,
            checkpoint_type,
            files: snapshot
                .iter()
                .map(|(path, content)| FileRecord {
                    path: path.clone(),
                    content_hash: compute_hash(content),
                    size: content.len() as u64,
                })
                .collect(),
        };
        entries.push((checkpoint.clone(), snapshot.clone()));
        Ok(checkpoint)
    }

    async fn load(&self, id: &CheckpointId) -> QuillResult<Option<Checkpoint>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .find(|(c, _)| &c.id == id)
            .map(|(c, _)| c.clone()))
    }

    async fn load_snapshot(&self, id: &CheckpointId) -> QuillResult<Snapshot> {
        if self.unreadable.read().await.contains(id) {
            return Err(QuillError::storage(format!("snapshot {} is unreadable", id)));
        }
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|(c, _)| &c.id == id)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| unknown_checkpoint(id))
    }

    async fn list(&self) -> QuillResult<Vec<CheckpointSummary>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .map(|(c, _)| CheckpointSummary::from(c))
            .collect())
    }
}
