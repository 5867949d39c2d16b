//! Checkpoint type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Full content of every tracked file, keyed by project-relative path
pub type Snapshot = BTreeMap<PathBuf, Vec<u8>>;

/// Unique identifier for a checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckpointId(pub String);

impl CheckpointId {
    /// Create a new checkpoint ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, enough to resolve in practice
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl Default for CheckpointId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a checkpoint was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointType {
    /// User-requested checkpoint
    Manual,
    /// Taken before patches from a response are applied
    PreApply,
    /// Taken after patches were applied
    PostApply,
    /// Backup of the working tree taken before a restore
    PreRestore,
}

impl std::fmt::Display for CheckpointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::PreApply => write!(f, "pre-apply"),
            Self::PostApply => write!(f, "post-apply"),
            Self::PreRestore => write!(f, "pre-restore"),
        }
    }
}

/// One file recorded in a checkpoint; content lives in the blob store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the project root
    pub path: PathBuf,
    /// SHA-256 of the uncompressed content, hex encoded
    pub content_hash: String,
    /// Uncompressed size in bytes
    pub size: u64,
}

/// Checkpoint metadata.
///
/// Immutable once saved; the snapshot bytes are fetched separately with
/// [`CheckpointStorage::load_snapshot`](super::storage::CheckpointStorage::load_snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Position in the store's history, strictly increasing
    pub sequence: u64,
    pub checkpoint_type: CheckpointType,
    pub files: Vec<FileRecord>,
}

impl Checkpoint {
    /// Get short ID (first 8 characters)
    pub fn short_id(&self) -> &str {
        self.id.short()
    }

    /// Get file count
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total uncompressed size of all files
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn contains(&self, path: &std::path::Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// What a restore does to files absent from the snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreMode {
    /// Only files known to the snapshot are written; nothing is deleted
    #[default]
    Conservative,
    /// Tracked files the snapshot never knew about are removed as well
    Exact,
}

/// Restore options for reverting to a checkpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Specific files to restore (empty = all)
    pub file_filter: Vec<PathBuf>,
    /// Create a backup checkpoint before restore
    pub create_backup: bool,
    pub mode: RestoreMode,
}

impl RestoreOptions {
    /// Also delete tracked files the snapshot does not contain
    pub fn exact() -> Self {
        Self {
            mode: RestoreMode::Exact,
            ..Self::default()
        }
    }

    /// Add file filter
    pub fn with_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.file_filter.extend(files);
        self
    }

    /// Enable backup
    pub fn with_backup(mut self) -> Self {
        self.create_backup = true;
        self
    }

    /// Whether `path` passes the file filter
    pub fn includes(&self, path: &std::path::Path) -> bool {
        self.file_filter.is_empty() || self.file_filter.iter().any(|f| f == path)
    }
}

/// Result of a restore operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreResult {
    /// Checkpoint that was restored
    pub checkpoint_id: CheckpointId,
    /// Files written back from the snapshot
    pub restored_files: Vec<PathBuf>,
    /// Files removed in exact mode
    pub deleted_files: Vec<PathBuf>,
    /// Files already identical to the snapshot
    pub unchanged_files: Vec<PathBuf>,
    /// Files that failed to restore
    pub failed_files: Vec<(PathBuf, String)>,
    /// Backup checkpoint created (if any)
    pub backup_checkpoint_id: Option<CheckpointId>,
}

impl RestoreResult {
    pub(crate) fn new(checkpoint_id: CheckpointId) -> Self {
        Self {
            checkpoint_id,
            restored_files: Vec::new(),
            deleted_files: Vec::new(),
            unchanged_files: Vec::new(),
            failed_files: Vec::new(),
            backup_checkpoint_id: None,
        }
    }

    /// Check if restore was successful
    pub fn is_success(&self) -> bool {
        self.failed_files.is_empty()
    }

    /// Get count of restored files
    pub fn restored_count(&self) -> usize {
        self.restored_files.len()
    }

    /// Get count of failed files
    pub fn failed_count(&self) -> usize {
        self.failed_files.len()
    }
}
