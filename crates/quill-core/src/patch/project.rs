//! Applying patches to files inside a project root

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use super::applier::{MatchPolicy, apply_with_policy};
use super::types::Patch;
use crate::error::{QuillError, QuillResult};
use crate::fsutil::{read_if_exists, remove_if_exists, write_atomic};
use crate::lock::ProjectLock;

/// What one successful apply did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPatch {
    /// Path as named by the patch
    pub file_path: String,
    /// Resolved absolute path
    pub path: PathBuf,
    /// The file did not exist before
    pub created: bool,
    /// The file was removed
    pub deleted: bool,
    pub hunks: usize,
    pub additions: usize,
    pub deletions: usize,
}

/// Resolve a patch-relative path under `root`.
///
/// Absolute paths and `..` components are rejected so a patch can never
/// reach outside the project.
pub fn resolve_in_root(root: &Path, relative: impl AsRef<Path>) -> QuillResult<PathBuf> {
    let candidate = relative.as_ref();
    if candidate.as_os_str().is_empty() {
        return Err(QuillError::invalid_input_field("empty file path", "file_path"));
    }

    let mut resolved = root.to_path_buf();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(QuillError::invalid_input_field(
                    format!("path escapes the project root: {}", candidate.display()),
                    "file_path",
                ));
            }
        }
    }
    Ok(resolved)
}

/// Applies patches to the working tree of one project
#[derive(Debug, Clone)]
pub struct ProjectPatcher {
    root: PathBuf,
    policy: MatchPolicy,
    lock: ProjectLock,
}

impl ProjectPatcher {
    pub fn new(root: impl Into<PathBuf>, policy: MatchPolicy) -> Self {
        let root = root.into();
        let lock = ProjectLock::for_root(&root);
        Self { root, policy, lock }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Apply one patch under the project's exclusive lock.
    ///
    /// On any error the target file is left byte-identical.
    pub async fn apply(&self, patch: &Patch) -> QuillResult<AppliedPatch> {
        let _guard = self.lock.exclusive().await;
        self.apply_unlocked(patch).await
    }

    /// Apply several patches under a single exclusive lock.
    ///
    /// Each patch succeeds or fails on its own; results keep input order.
    pub async fn apply_all(&self, patches: &[Patch]) -> Vec<QuillResult<AppliedPatch>> {
        let _guard = self.lock.exclusive().await;
        let mut results = Vec::with_capacity(patches.len());
        for patch in patches {
            results.push(self.apply_unlocked(patch).await);
        }
        results
    }

    async fn apply_unlocked(&self, patch: &Patch) -> QuillResult<AppliedPatch> {
        let path = resolve_in_root(&self.root, &patch.file_path)?;

        let existing = read_if_exists(&path)
            .await
            .map_err(|e| QuillError::io_with_path(e.to_string(), path.display().to_string()))?;
        let created = existing.is_none();
        let bytes = existing.unwrap_or_default();
        let content = String::from_utf8(bytes).map_err(|_| {
            QuillError::invalid_input_field(
                format!("{} is not valid UTF-8 text", patch.file_path),
                "file_path",
            )
        })?;

        let patched = apply_with_policy(patch, &content, &self.policy)?;
        let io_error =
            |e: std::io::Error| QuillError::io_with_path(e.to_string(), path.display().to_string());
        let deleted = patch.deletes_file();
        if deleted {
            if !patched.is_empty() {
                warn!(file = %patch.file_path, "Deletion patch leaves content behind");
                let leftover = patched.lines().next().unwrap_or_default();
                return Err(QuillError::apply_conflict(
                    &patch.file_path,
                    patch.hunks.len(),
                    "<end of file>",
                    leftover,
                ));
            }
            remove_if_exists(&path).await.map_err(io_error)?;
        } else if patched == content && !created {
            debug!(file = %patch.file_path, "Patch produced no change");
        } else {
            write_atomic(&path, patched.as_bytes()).await.map_err(io_error)?;
        }

        info!(
            file = %patch.file_path,
            hunks = patch.hunks.len(),
            additions = patch.additions(),
            deletions = patch.deletions(),
            created,
            deleted,
            "Applied patch"
        );

        Ok(AppliedPatch {
            file_path: patch.file_path.clone(),
            path,
            created,
            deleted,
            hunks: patch.hunks.len(),
            additions: patch.additions(),
            deletions: patch.deletions(),
        })
    }
}
