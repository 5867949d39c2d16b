//! Checkpoint manager
//!
//! High-level checkpoint API over a fixed project root: creation, listing,
//! diffing against the working tree and restoring.

mod core;
mod operations;
mod types;

pub use types::CheckpointManager;
