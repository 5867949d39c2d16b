//! CLI argument definitions using clap
//!
//! - quill apply <response>             # Apply the diffs in a model response
//! - quill validate <response>          # Check a response without applying it
//! - quill checkpoint create|list       # Manage checkpoint history
//! - quill diff <id>                    # Compare a checkpoint to the working tree
//! - quill revert <id>                  # Restore a checkpoint

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Quill - apply LLM-proposed diffs to LaTeX projects with checkpoint history")]
#[command(version)]
pub struct Cli {
    /// Project root directory
    #[arg(long, short = 'C', global = true, default_value = ".")]
    pub project: PathBuf,

    /// Path to configuration file (defaults to <project>/.quill/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply every diff found in a model response ("-" reads stdin)
    Apply {
        /// File holding the response text
        response: PathBuf,
    },

    /// Extract and validate the diffs in a response without applying them
    Validate {
        /// File holding the response text
        response: PathBuf,
    },

    /// Create or list checkpoints
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },

    /// Show how the working tree differs from a checkpoint
    Diff {
        /// Checkpoint id or unique prefix
        id: String,
    },

    /// Restore the working tree to a checkpoint
    Revert {
        /// Checkpoint id or unique prefix
        id: String,

        /// Also delete tracked files the checkpoint does not contain
        #[arg(long)]
        exact: bool,

        /// Checkpoint the current state before restoring
        #[arg(long)]
        backup: bool,

        /// Only show what would change
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum CheckpointAction {
    /// Snapshot all tracked files
    Create {
        /// Description of the checkpoint
        description: String,
    },

    /// List checkpoints, newest first
    List,
}
