//! Configuration data model

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::logging_config::LoggingConfig;
use crate::patch::MatchPolicy;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    /// Hunk matching policy used by the applier
    pub patch: MatchPolicy,
    /// Limits enforced on model-produced patches
    pub safety: SafetyConfig,
    /// Checkpoint storage and tracked files
    pub checkpoints: CheckpointSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Safety limits for patches proposed by a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Maximum added + removed lines in a single patch
    pub max_changed_lines: usize,
    /// Glob patterns a patch path must match
    pub allowlist: Vec<String>,
    /// Glob patterns a patch path must not match
    pub denylist: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_changed_lines: 50,
            allowlist: ["*.tex", "*.bib", "*.sty", "*.cls"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            denylist: [".git/**", "*.pdf", "build/**"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Checkpoint storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointSettings {
    /// Storage directory, relative to the project root unless absolute
    pub directory: PathBuf,
    /// File extensions tracked by checkpoints
    pub tracked_extensions: Vec<String>,
    /// Directory names never descended into
    pub excluded_dirs: Vec<String>,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".quill/checkpoints"),
            tracked_extensions: vec!["tex".to_string(), "bib".to_string()],
            excluded_dirs: [".git", ".quill", "build", "node_modules", "_minted"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
