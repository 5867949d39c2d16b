//! Checkpoint history for a project
//!
//! A checkpoint is an immutable snapshot of every tracked file, taken before
//! and after patches are applied or on request. Any checkpoint can be diffed
//! against the working tree or restored onto it.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use quill_core::checkpoints::{CheckpointManager, CheckpointManagerConfig};
//!
//! let manager = CheckpointManager::new(CheckpointManagerConfig::new("./paper"));
//!
//! let checkpoint = manager.create("Before rewriting the abstract").await?;
//!
//! // ... apply patches ...
//!
//! for (path, diff) in manager.diff(&checkpoint.id).await? {
//!     println!("{}:\n{}", path.display(), diff);
//! }
//!
//! manager.restore(&checkpoint.id).await?;
//! ```
//!
//! # Storage
//!
//! Checkpoints are stored in `.quill/checkpoints/` by default:
//! ```text
//! .quill/checkpoints/
//!   checkpoints/
//!     {checkpoint_id}.json    # Checkpoint metadata
//!   blobs/
//!     {sha256}.gz             # Compressed file content, shared between checkpoints
//! ```

pub mod config;
pub mod diff;
pub mod manager;
pub mod restore;
pub mod storage;
pub mod tracking;
pub mod types;

pub use config::CheckpointManagerConfig;
pub use diff::{CONTEXT_LINES, unified_diff};
pub use manager::CheckpointManager;
pub use restore::RestorePreview;
pub use storage::{CheckpointStorage, CheckpointSummary, FileCheckpointStorage};
pub use tracking::FileTracker;
pub use types::{
    Checkpoint, CheckpointId, CheckpointType, FileRecord, RestoreMode, RestoreOptions,
    RestoreResult, Snapshot,
};
