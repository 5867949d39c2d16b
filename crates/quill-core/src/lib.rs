//! Quill Core Library
//!
//! Patch and checkpoint engine for LLM-assisted LaTeX editing: finds unified
//! diffs in model output, applies them to project files with fuzzy hunk
//! matching, and keeps a restorable checkpoint history of the project.

pub mod checkpoints;
pub mod config;
pub mod error;
mod fsutil;
pub mod lock;
pub mod patch;
pub mod workflow;

// Re-export commonly used types
pub use checkpoints::{
    Checkpoint, CheckpointId, CheckpointManager, CheckpointManagerConfig, CheckpointType,
    RestoreMode, RestoreOptions, RestoreResult,
};
pub use config::{LogFormat, LoggingConfig, QuillConfig, load_config};
pub use error::{QuillError, QuillResult, UnifiedError};
pub use lock::ProjectLock;
pub use patch::{
    Hunk, MatchPolicy, Patch, PatchValidator, ProjectPatcher, WhitespaceMode, apply, extract,
    parse,
};
pub use workflow::{PatchWorkflow, ResponseReview, ReviewedPatch, WorkflowReport};
