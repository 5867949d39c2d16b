//! Checkpoint restore planning and execution
//!
//! A restore is planned against the fully loaded snapshot before any file
//! is touched. Each file is then replaced atomically.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::types::{RestoreMode, RestoreOptions, Snapshot};
use crate::error::{QuillError, QuillResult};
use crate::fsutil::{read_if_exists, write_atomic};
use crate::patch::resolve_in_root;

/// Preview of what will happen during restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestorePreview {
    /// File will be created
    WillCreate(PathBuf),
    /// File will be overwritten
    WillOverwrite(PathBuf),
    /// File will be deleted (exact mode only)
    WillDelete(PathBuf),
    /// No change needed
    NoChange(PathBuf),
}

impl RestorePreview {
    /// Get the path
    pub fn path(&self) -> &Path {
        match self {
            Self::WillCreate(p) | Self::WillOverwrite(p) | Self::WillDelete(p) | Self::NoChange(p) => p,
        }
    }

    /// Whether executing this entry touches the working tree
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange(_))
    }
}

/// Plan a restore of `snapshot` onto `project_root`.
///
/// `current` lists the tracked files that exist now; it only matters in
/// [`RestoreMode::Exact`].
pub async fn plan_restore(
    project_root: &Path,
    snapshot: &Snapshot,
    current: &[PathBuf],
    options: &RestoreOptions,
) -> QuillResult<Vec<RestorePreview>> {
    let mut plan = Vec::new();

    for (path, content) in snapshot {
        if !options.includes(path) {
            continue;
        }
        let full_path = resolve_in_root(project_root, path)?;
        let existing = read_if_exists(&full_path)
            .await
            .map_err(|e| QuillError::io_with_path(e.to_string(), full_path.display().to_string()))?;

        plan.push(match existing {
            None => RestorePreview::WillCreate(path.clone()),
            Some(bytes) if &bytes == content => RestorePreview::NoChange(path.clone()),
            Some(_) => RestorePreview::WillOverwrite(path.clone()),
        });
    }

    if options.mode == RestoreMode::Exact {
        for path in current {
            if !snapshot.contains_key(path) && options.includes(path) {
                plan.push(RestorePreview::WillDelete(path.clone()));
            }
        }
    }

    Ok(plan)
}

/// Carry out one planned step
pub async fn execute_step(
    project_root: &Path,
    step: &RestorePreview,
    snapshot: &Snapshot,
) -> QuillResult<()> {
    let full_path = resolve_in_root(project_root, step.path())?;
    let io_err = |e: std::io::Error| QuillError::io_with_path(e.to_string(), full_path.display().to_string());

    match step {
        RestorePreview::WillCreate(path) | RestorePreview::WillOverwrite(path) => {
            let content = snapshot.get(path).ok_or_else(|| {
                QuillError::other(format!("{} is not part of the snapshot", path.display()))
            })?;
            write_atomic(&full_path, content).await.map_err(io_err)?;
        }
        RestorePreview::WillDelete(_) => match fs::remove_file(&full_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        },
        RestorePreview::NoChange(_) => {}
    }

    debug!(path = %step.path().display(), "Restored file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        Snapshot::from([
            (PathBuf::from("same.tex"), b"same\n".to_vec()),
            (PathBuf::from("changed.tex"), b"old\n".to_vec()),
            (PathBuf::from("gone.tex"), b"gone\n".to_vec()),
        ])
    }

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("same.tex"), "same\n").unwrap();
        std::fs::write(dir.path().join("changed.tex"), "new\n").unwrap();
        std::fs::write(dir.path().join("extra.tex"), "extra\n").unwrap();
        dir
    }

    fn current() -> Vec<PathBuf> {
        vec![
            PathBuf::from("changed.tex"),
            PathBuf::from("extra.tex"),
            PathBuf::from("same.tex"),
        ]
    }

    #[tokio::test]
    async fn test_conservative_plan() {
        let dir = setup();
        let plan = plan_restore(dir.path(), &snapshot(), &current(), &RestoreOptions::default())
            .await
            .unwrap();

        assert_eq!(
            plan,
            vec![
                RestorePreview::WillOverwrite(PathBuf::from("changed.tex")),
                RestorePreview::WillCreate(PathBuf::from("gone.tex")),
                RestorePreview::NoChange(PathBuf::from("same.tex")),
            ]
        );
    }

    #[tokio::test]
    async fn test_exact_plan_deletes_unknown_files() {
        let dir = setup();
        let plan = plan_restore(dir.path(), &snapshot(), &current(), &RestoreOptions::exact())
            .await
            .unwrap();
        assert!(plan.contains(&RestorePreview::WillDelete(PathBuf::from("extra.tex"))));
    }

    #[tokio::test]
    async fn test_filter_limits_plan() {
        let dir = setup();
        let options = RestoreOptions::default().with_files([PathBuf::from("gone.tex")]);
        let plan = plan_restore(dir.path(), &snapshot(), &current(), &options)
            .await
            .unwrap();
        assert_eq!(plan, vec![RestorePreview::WillCreate(PathBuf::from("gone.tex"))]);
    }

    #[tokio::test]
    async fn test_execute_steps() {
        let dir = setup();
        let snapshot = snapshot();

        execute_step(
            dir.path(),
            &RestorePreview::WillOverwrite(PathBuf::from("changed.tex")),
            &snapshot,
        )
        .await
        .unwrap();
        execute_step(
            dir.path(),
            &RestorePreview::WillDelete(PathBuf::from("extra.tex")),
            &snapshot,
        )
        .await
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("changed.tex")).unwrap(),
            "old\n"
        );
        assert!(!dir.path().join("extra.tex").exists());
    }

    #[tokio::test]
    async fn test_escaping_snapshot_path_rejected() {
        let dir = setup();
        let bad = Snapshot::from([(PathBuf::from("../x.tex"), b"x".to_vec())]);
        assert!(
            plan_restore(dir.path(), &bad, &[], &RestoreOptions::default())
                .await
                .is_err()
        );
    }
}
