//! Core checkpoint management operations

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::checkpoints::diff::unified_diff;
use crate::checkpoints::restore::{RestorePreview, execute_step, plan_restore};
use crate::checkpoints::storage::CheckpointSummary;
use crate::checkpoints::types::{
    Checkpoint, CheckpointId, CheckpointType, RestoreMode, RestoreOptions, RestoreResult,
};
use crate::error::{QuillError, QuillResult};
use crate::fsutil::read_if_exists;
use crate::patch::resolve_in_root;

use super::types::CheckpointManager;

impl CheckpointManager {
    /// List all checkpoints, newest first
    pub async fn list_checkpoints(&self) -> QuillResult<Vec<CheckpointSummary>> {
        self.storage.list().await
    }

    /// Get a specific checkpoint
    pub async fn get_checkpoint(&self, id: &CheckpointId) -> QuillResult<Option<Checkpoint>> {
        self.storage.load(id).await
    }

    /// Get the latest checkpoint
    pub async fn latest_checkpoint(&self) -> QuillResult<Option<Checkpoint>> {
        self.storage.latest().await
    }

    /// Resolve a full id or an id prefix.
    ///
    /// When several checkpoints share the prefix the most recent one wins.
    pub async fn resolve(&self, reference: &str) -> QuillResult<CheckpointId> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(QuillError::invalid_input_field(
                "empty checkpoint id",
                "checkpoint_id",
            ));
        }

        let summaries = self.storage.list().await?;
        if let Some(exact) = summaries.iter().find(|s| s.id.as_str() == reference) {
            return Ok(exact.id.clone());
        }

        let mut matches = summaries
            .iter()
            .filter(|s| s.id.as_str().starts_with(reference));
        match matches.next() {
            Some(newest) => {
                let others = matches.count();
                if others > 0 {
                    warn!(
                        prefix = reference,
                        matches = others + 1,
                        "Checkpoint prefix is ambiguous, using the most recent"
                    );
                }
                Ok(newest.id.clone())
            }
            None => Err(QuillError::not_found_resource(
                format!("checkpoint {}", reference),
                "checkpoint",
            )),
        }
    }

    /// Diff every tracked path between a checkpoint and the working tree.
    ///
    /// Unchanged paths are omitted. A path in the checkpoint that no longer
    /// exists diffs against `/dev/null`, as does a new file the checkpoint
    /// never had.
    pub async fn diff(&self, id: &CheckpointId) -> QuillResult<BTreeMap<PathBuf, String>> {
        let _guard = self.lock.shared().await;
        self.load_checkpoint_or_error(id).await?;
        let snapshot = self.storage.load_snapshot(id).await?;

        let mut paths: BTreeSet<PathBuf> = snapshot.keys().cloned().collect();
        paths.extend(self.tracker.tracked_paths().await?);

        let mut diffs = BTreeMap::new();
        for path in paths {
            let full_path = resolve_in_root(&self.config.project_root, &path)?;
            let current = read_if_exists(&full_path).await.map_err(|e| {
                QuillError::io_with_path(e.to_string(), full_path.display().to_string())
            })?;

            let stored = snapshot.get(&path).map(Vec::as_slice);
            if let Some(text) = unified_diff(&path, stored, current.as_deref()) {
                diffs.insert(path, text);
            }
        }

        Ok(diffs)
    }

    /// Preview what a restore would do
    pub async fn preview_restore(
        &self,
        id: &CheckpointId,
        options: &RestoreOptions,
    ) -> QuillResult<Vec<RestorePreview>> {
        let _guard = self.lock.shared().await;
        self.load_checkpoint_or_error(id).await?;
        let snapshot = self.storage.load_snapshot(id).await?;
        let current = self.current_for(options).await?;
        plan_restore(&self.config.project_root, &snapshot, &current, options).await
    }

    /// Restore a checkpoint with default options (conservative, no backup).
    ///
    /// Returns whether every file was restored.
    pub async fn restore(&self, id: &CheckpointId) -> QuillResult<bool> {
        Ok(self
            .restore_with(id, &RestoreOptions::default())
            .await?
            .is_success())
    }

    /// Restore a checkpoint onto the working tree.
    ///
    /// The whole snapshot is loaded and verified before anything is written;
    /// a storage failure leaves the tree untouched.
    pub async fn restore_with(
        &self,
        id: &CheckpointId,
        options: &RestoreOptions,
    ) -> QuillResult<RestoreResult> {
        let _guard = self.lock.exclusive().await;
        let checkpoint = self.load_checkpoint_or_error(id).await?;

        info!("Restoring to checkpoint {}", checkpoint.short_id());

        let snapshot = self.storage.load_snapshot(id).await?;
        let current = self.current_for(options).await?;
        let plan = plan_restore(&self.config.project_root, &snapshot, &current, options).await?;

        let mut result = RestoreResult::new(id.clone());

        if options.create_backup && plan.iter().any(RestorePreview::is_change) {
            let backup = self
                .create_unlocked(
                    &format!("Backup before restore to {}", checkpoint.short_id()),
                    CheckpointType::PreRestore,
                )
                .await?;
            result.backup_checkpoint_id = Some(backup.id);
        }

        for step in &plan {
            if let RestorePreview::NoChange(path) = step {
                result.unchanged_files.push(path.clone());
                continue;
            }
            match execute_step(&self.config.project_root, step, &snapshot).await {
                Ok(()) => match step {
                    RestorePreview::WillDelete(path) => result.deleted_files.push(path.clone()),
                    other => result.restored_files.push(other.path().to_path_buf()),
                },
                Err(e) => {
                    warn!(path = %step.path().display(), error = %e, "Failed to restore file");
                    result
                        .failed_files
                        .push((step.path().to_path_buf(), e.to_string()));
                }
            }
        }

        info!(
            "Restored checkpoint {}: {} restored, {} deleted, {} unchanged, {} failed",
            checkpoint.short_id(),
            result.restored_count(),
            result.deleted_files.len(),
            result.unchanged_files.len(),
            result.failed_count()
        );

        Ok(result)
    }

    async fn current_for(&self, options: &RestoreOptions) -> QuillResult<Vec<PathBuf>> {
        match options.mode {
            RestoreMode::Exact => self.tracker.tracked_paths().await,
            RestoreMode::Conservative => Ok(Vec::new()),
        }
    }
}
