//! From model response to applied patches
//!
//! [`PatchWorkflow::apply_response`] runs the whole pipeline on one response:
//! extract every diff, validate each patch, checkpoint the project, apply the
//! accepted patches one by one and checkpoint again. Every patch succeeds or
//! fails on its own; the report says which did what.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::checkpoints::{CheckpointId, CheckpointManager, CheckpointManagerConfig, CheckpointType};
use crate::config::QuillConfig;
use crate::error::{QuillError, QuillResult};
use crate::patch::{
    AppliedPatch, Patch, PatchValidator, ProjectPatcher, RejectedBlock, ValidationResult,
    extract_all,
};

/// A patch together with its validation verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedPatch {
    pub patch: Patch,
    pub validation: ValidationResult,
}

/// What a response contains, before anything is applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseReview {
    /// Patches that passed validation, in order of appearance
    pub accepted: Vec<ReviewedPatch>,
    /// Patches the validator refused
    pub refused: Vec<ReviewedPatch>,
    /// Diff blocks that did not parse
    pub malformed: Vec<RejectedBlock>,
}

impl ResponseReview {
    /// No diff of any kind was found
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.refused.is_empty() && self.malformed.is_empty()
    }

    /// Accepted patches that should be looked at by a human
    pub fn flagged(&self) -> impl Iterator<Item = &ReviewedPatch> {
        self.accepted
            .iter()
            .filter(|r| r.validation.requires_human_review)
    }
}

/// Outcome of [`PatchWorkflow::apply_response`]
#[derive(Debug, Clone, Default)]
pub struct WorkflowReport {
    pub review: ResponseReview,
    /// Checkpoint taken before the first patch was applied
    pub before: Option<CheckpointId>,
    /// Checkpoint taken after applying, when anything applied
    pub after: Option<CheckpointId>,
    pub applied: Vec<AppliedPatch>,
    /// Accepted patches that failed to apply, with the reason
    pub failed: Vec<(String, QuillError)>,
}

impl WorkflowReport {
    /// Every patch found was accepted and applied
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.review.refused.is_empty() && self.review.malformed.is_empty()
    }
}

/// Applies model responses to one project
pub struct PatchWorkflow {
    patcher: ProjectPatcher,
    validator: PatchValidator,
    checkpoints: CheckpointManager,
}

impl PatchWorkflow {
    /// Build the workflow for `project_root` from configuration
    pub fn new(project_root: impl Into<PathBuf>, config: &QuillConfig) -> QuillResult<Self> {
        let project_root = project_root.into();
        let checkpoints = CheckpointManager::new(CheckpointManagerConfig::from_settings(
            &project_root,
            &config.checkpoints,
        ));
        Ok(Self {
            patcher: ProjectPatcher::new(project_root, config.patch.clone()),
            validator: PatchValidator::new(&config.safety)?,
            checkpoints,
        })
    }

    /// Assemble from existing components
    pub fn from_parts(
        patcher: ProjectPatcher,
        validator: PatchValidator,
        checkpoints: CheckpointManager,
    ) -> Self {
        Self {
            patcher,
            validator,
            checkpoints,
        }
    }

    pub fn project_root(&self) -> &Path {
        self.patcher.root()
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Extract and validate without touching the project
    pub fn review(&self, response: &str) -> ResponseReview {
        let extraction = extract_all(response);
        let mut review = ResponseReview {
            malformed: extraction.rejected,
            ..Default::default()
        };

        for patch in extraction.patches {
            let validation = self.validator.validate(&patch);
            if validation.valid {
                if validation.requires_human_review {
                    warn!(
                        file = %patch.file_path,
                        reasons = ?validation.review_reasons,
                        "Patch flagged for review"
                    );
                }
                review.accepted.push(ReviewedPatch { patch, validation });
            } else {
                warn!(file = %patch.file_path, reason = %validation.reason, "Patch refused");
                review.refused.push(ReviewedPatch { patch, validation });
            }
        }

        review
    }

    /// Apply every acceptable patch in `response`.
    ///
    /// Errors are returned only for checkpoint failures. Parse, validation
    /// and apply failures are collected in the report.
    pub async fn apply_response(&self, response: &str) -> QuillResult<WorkflowReport> {
        let review = self.review(response);
        let mut report = WorkflowReport::default();

        if review.accepted.is_empty() {
            info!(
                refused = review.refused.len(),
                malformed = review.malformed.len(),
                "No applicable patches in response"
            );
            report.review = review;
            return Ok(report);
        }

        let before = self
            .checkpoints
            .create_with_type(
                format!("Before applying {} patch(es)", review.accepted.len()),
                CheckpointType::PreApply,
            )
            .await?;
        report.before = Some(before.id);

        let patches: Vec<Patch> = review.accepted.iter().map(|r| r.patch.clone()).collect();
        for (patch, result) in patches.iter().zip(self.patcher.apply_all(&patches).await) {
            match result {
                Ok(applied) => report.applied.push(applied),
                Err(e) => {
                    warn!(file = %patch.file_path, error = %e, "Patch failed to apply");
                    report.failed.push((patch.file_path.clone(), e));
                }
            }
        }

        if !report.applied.is_empty() {
            let after = self
                .checkpoints
                .create_with_type(
                    format!("After applying {} patch(es)", report.applied.len()),
                    CheckpointType::PostApply,
                )
                .await?;
            report.after = Some(after.id);
        }

        info!(
            applied = report.applied.len(),
            failed = report.failed.len(),
            refused = review.refused.len(),
            malformed = review.malformed.len(),
            "Response processed"
        );

        report.review = review;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MAIN: &str = "\\documentclass{article}\n\\begin{document}\nHello world.\n\\end{document}\n";

    fn setup() -> (TempDir, PatchWorkflow) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.tex"), MAIN).unwrap();
        let workflow = PatchWorkflow::new(dir.path(), &QuillConfig::default()).unwrap();
        (dir, workflow)
    }

    #[tokio::test]
    async fn test_apply_response_checkpoints_around_patch() {
        let (dir, workflow) = setup();
        let response = "Here is the fix:\n\n```diff\n--- a/main.tex\n+++ b/main.tex\n@@ -3 +3 @@\n-Hello world.\n+Hello, world.\n```\n";

        let report = workflow.apply_response(response).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.applied.len(), 1);
        let before = report.before.unwrap();
        let after = report.after.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("main.tex")).unwrap(),
            MAIN.replace("Hello world.", "Hello, world.")
        );

        let list = workflow.checkpoints().list_checkpoints().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, after);
        assert_eq!(list[1].id, before);
        assert!(workflow.checkpoints().diff(&after).await.unwrap().is_empty());
        assert_eq!(workflow.checkpoints().diff(&before).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_patches_no_checkpoints() {
        let (_dir, workflow) = setup();
        let report = workflow
            .apply_response("Looks good to me, no changes needed.")
            .await
            .unwrap();

        assert!(report.review.is_empty());
        assert!(report.before.is_none());
        assert!(workflow.checkpoints().list_checkpoints().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_reported_without_after_checkpoint() {
        let (dir, workflow) = setup();
        let response = "```diff\n--- a/main.tex\n+++ b/main.tex\n@@ -3 +3 @@\n-Goodbye.\n+Hi.\n```\n";

        let report = workflow.apply_response(response).await.unwrap();

        assert!(report.before.is_some());
        assert!(report.after.is_none());
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].1, QuillError::ApplyConflict { .. }));
        assert_eq!(std::fs::read_to_string(dir.path().join("main.tex")).unwrap(), MAIN);
    }

    #[tokio::test]
    async fn test_denied_path_is_refused() {
        let (dir, workflow) = setup();
        let response = "```diff\n--- a/notes.txt\n+++ b/notes.txt\n@@ -0,0 +1 @@\n+todo\n```\n";

        let report = workflow.apply_response(response).await.unwrap();

        assert_eq!(report.review.refused.len(), 1);
        assert!(report.before.is_none());
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_review_flags_sensitive_edit() {
        let (_dir, workflow) = setup();
        let response = "```diff\n--- a/main.tex\n+++ b/main.tex\n@@ -1 +1,2 @@\n \\documentclass{article}\n+\\title{New}\n```\n";

        let review = workflow.review(response);
        assert_eq!(review.accepted.len(), 1);
        assert_eq!(review.flagged().count(), 1);
    }
}
