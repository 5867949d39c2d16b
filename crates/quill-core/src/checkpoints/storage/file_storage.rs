//! File-based checkpoint storage implementation

use crate::error::{QuillError, QuillResult};
use crate::fsutil::{read_if_exists, write_atomic};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::super::types::{Checkpoint, CheckpointId, CheckpointType, FileRecord, Snapshot};
use super::compression::{compress_content, compute_hash, decompress_content};
use super::{CheckpointStorage, CheckpointSummary, unknown_checkpoint};

/// File-based checkpoint storage
///
/// Stores checkpoints in a directory structure:
/// ```text
/// base_path/
///   checkpoints/
///     {checkpoint_id}.json
///   blobs/
///     {sha256}.gz
/// ```
///
/// Blobs are written before the record that references them, and every
/// file goes through a synced temp file and a rename. A record on disk
/// therefore always points at complete blobs.
pub struct FileCheckpointStorage {
    base_path: PathBuf,
    /// Serializes sequence assignment within this process
    save_lock: Mutex<()>,
}

impl FileCheckpointStorage {
    /// Create a new file-based storage
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            save_lock: Mutex::new(()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the checkpoints directory
    fn checkpoints_dir(&self) -> PathBuf {
        self.base_path.join("checkpoints")
    }

    /// Get the blob directory
    fn blobs_dir(&self) -> PathBuf {
        self.base_path.join("blobs")
    }

    /// Get the path for a checkpoint record
    fn checkpoint_path(&self, id: &CheckpointId) -> PathBuf {
        self.checkpoints_dir().join(format!("{}.json", id.as_str()))
    }

    /// Get the path for a content blob
    pub(crate) fn blob_path(&self, hash: &str) -> PathBuf {
        self.blobs_dir().join(format!("{}.gz", hash))
    }

    /// Ensure directories exist
    async fn ensure_dirs(&self) -> QuillResult<()> {
        fs::create_dir_all(self.checkpoints_dir())
            .await
            .map_err(|e| {
                QuillError::storage(format!("Failed to create checkpoints directory: {}", e))
            })?;
        fs::create_dir_all(self.blobs_dir()).await.map_err(|e| {
            QuillError::storage(format!("Failed to create blob directory: {}", e))
        })?;
        Ok(())
    }

    /// Read every checkpoint record; unreadable records are skipped
    async fn read_records(&self) -> QuillResult<Vec<Checkpoint>> {
        let checkpoints_dir = self.checkpoints_dir();

        let mut entries = match fs::read_dir(&checkpoints_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(QuillError::storage(format!(
                    "Failed to read checkpoints directory: {}",
                    e
                )));
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| QuillError::storage(format!("Failed to read directory entry: {}", e)))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match read_record(&path).await {
                Ok(checkpoint) => records.push(checkpoint),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable checkpoint record"),
            }
        }

        Ok(records)
    }

    async fn store_blob(&self, content: &[u8]) -> QuillResult<String> {
        let hash = compute_hash(content);
        let path = self.blob_path(&hash);

        if fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(hash);
        }

        let compressed = compress_content(content)?;
        write_atomic(&path, &compressed)
            .await
            .map_err(|e| QuillError::storage_with_context(e.to_string(), format!("writing blob {}", hash)))?;

        debug!(
            hash = %hash,
            size = content.len(),
            compressed = compressed.len(),
            "Stored blob"
        );
        Ok(hash)
    }

    async fn load_blob(&self, record: &FileRecord) -> QuillResult<Vec<u8>> {
        let path = self.blob_path(&record.content_hash);
        let compressed = read_if_exists(&path)
            .await
            .map_err(|e| {
                QuillError::storage_with_context(e.to_string(), record.path.display().to_string())
            })?
            .ok_or_else(|| {
                QuillError::storage_with_context(
                    format!("missing content blob {}", record.content_hash),
                    record.path.display().to_string(),
                )
            })?;

        let content = decompress_content(&compressed)?;
        if content.len() as u64 != record.size || compute_hash(&content) != record.content_hash {
            return Err(QuillError::storage_with_context(
                format!("content blob {} failed verification", record.content_hash),
                record.path.display().to_string(),
            ));
        }
        Ok(content)
    }
}

async fn read_record(path: &Path) -> QuillResult<Checkpoint> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| QuillError::storage(format!("Failed to read checkpoint record: {}", e)))?;
    serde_json::from_str(&content)
        .map_err(|e| QuillError::storage(format!("Failed to deserialize checkpoint: {}", e)))
}

/// Ids are uuids; anything that could address another file is rejected
fn is_valid_id(id: &CheckpointId) -> bool {
    !id.as_str().is_empty()
        && id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[async_trait]
impl CheckpointStorage for FileCheckpointStorage {
    async fn save(
        &self,
        snapshot: &Snapshot,
        description: &str,
        checkpoint_type: CheckpointType,
    ) -> QuillResult<Checkpoint> {
        let _guard = self.save_lock.lock().await;
        self.ensure_dirs().await?;

        let sequence = self
            .read_records()
            .await?
            .iter()
            .map(|c| c.sequence)
            .max()
            .unwrap_or(0)
            + 1;

        let mut files = Vec::with_capacity(snapshot.len());
        for (path, content) in snapshot {
            let content_hash = self.store_blob(content).await?;
            files.push(FileRecord {
                path: path.clone(),
                content_hash,
                size: content.len() as u64,
            });
        }

        let checkpoint = Checkpoint {
            id: CheckpointId::new(),
            description: description.to_string(),
            created_at: Utc::now(),
            sequence,
            checkpoint_type,
            files,
        };

        let json = serde_json::to_string_pretty(&checkpoint)
            .map_err(|e| QuillError::storage(format!("Failed to serialize checkpoint: {}", e)))?;
        let path = self.checkpoint_path(&checkpoint.id);
        write_atomic(&path, json.as_bytes())
            .await
            .map_err(|e| QuillError::storage(format!("Failed to write checkpoint record: {}", e)))?;

        debug!(id = %checkpoint.id, sequence, path = %path.display(), "Saved checkpoint");
        Ok(checkpoint)
    }

    async fn load(&self, id: &CheckpointId) -> QuillResult<Option<Checkpoint>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.checkpoint_path(id);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        read_record(&path).await.map(Some)
    }

    async fn load_snapshot(&self, id: &CheckpointId) -> QuillResult<Snapshot> {
        let checkpoint = self
            .load(id)
            .await?
            .ok_or_else(|| unknown_checkpoint(id))?;

        let mut snapshot = Snapshot::new();
        for record in &checkpoint.files {
            let content = self.load_blob(record).await?;
            snapshot.insert(record.path.clone(), content);
        }
        Ok(snapshot)
    }

    async fn list(&self) -> QuillResult<Vec<CheckpointSummary>> {
        let mut summaries: Vec<CheckpointSummary> = self
            .read_records()
            .await?
            .iter()
            .map(CheckpointSummary::from)
            .collect();

        // Sort by sequence (newest first)
        summaries.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(summaries)
    }
}
