//! Tracked-file enumeration and capture

use crate::error::{QuillError, QuillResult};
use crate::fsutil::read_if_exists;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::types::Snapshot;
use crate::config::CheckpointSettings;

/// Decides which project files belong in a checkpoint
#[derive(Debug, Clone)]
pub struct FileTracker {
    root: PathBuf,
    /// File extensions to track (empty = all)
    tracked_extensions: HashSet<String>,
    /// Directory names never descended into
    excluded_dirs: HashSet<String>,
    /// Fixed file list replacing the directory scan
    explicit_files: Option<Vec<PathBuf>>,
}

impl FileTracker {
    /// Create a tracker with the default settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_settings(root, &CheckpointSettings::default())
    }

    pub fn from_settings(root: impl Into<PathBuf>, settings: &CheckpointSettings) -> Self {
        Self {
            root: root.into(),
            tracked_extensions: settings
                .tracked_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
            excluded_dirs: settings.excluded_dirs.iter().cloned().collect(),
            explicit_files: None,
        }
    }

    /// Track only specific file extensions
    pub fn with_extensions(
        mut self,
        extensions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.tracked_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Add excluded directory
    pub fn exclude_dir(mut self, dir: impl Into<String>) -> Self {
        self.excluded_dirs.insert(dir.into());
        self
    }

    /// Track exactly these project-relative files instead of scanning
    pub fn with_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.explicit_files = Some(files.into_iter().collect());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a project-relative path is tracked
    pub fn is_tracked(&self, path: &Path) -> bool {
        if let Some(files) = &self.explicit_files {
            return files.iter().any(|f| f == path);
        }

        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    if self.excluded_dirs.contains(name.to_string_lossy().as_ref()) {
                        return false;
                    }
                }
                Component::CurDir => {}
                _ => return false,
            }
        }

        if self.tracked_extensions.is_empty() {
            return true;
        }
        path.extension()
            .is_some_and(|ext| self.tracked_extensions.contains(ext.to_string_lossy().as_ref()))
    }

    /// Tracked files that currently exist, project-relative and sorted
    pub async fn tracked_paths(&self) -> QuillResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        match &self.explicit_files {
            Some(files) => {
                for file in files {
                    if fs::try_exists(self.root.join(file)).await.unwrap_or(false) {
                        paths.push(file.clone());
                    }
                }
            }
            None => {
                if fs::try_exists(&self.root).await.unwrap_or(false) {
                    self.scan_recursive(&self.root, &mut paths).await?;
                }
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Read every tracked file
    pub async fn capture(&self) -> QuillResult<Snapshot> {
        let mut snapshot = Snapshot::new();
        for path in self.tracked_paths().await? {
            let full = self.root.join(&path);
            // Files deleted between the scan and the read are simply absent.
            if let Some(content) = read_if_exists(&full)
                .await
                .map_err(|e| QuillError::io_with_path(e.to_string(), full.display().to_string()))?
            {
                snapshot.insert(path, content);
            }
        }
        Ok(snapshot)
    }

    /// Recursive directory scanning
    async fn scan_recursive(&self, dir: &Path, paths: &mut Vec<PathBuf>) -> QuillResult<()> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| {
            QuillError::io_with_path(format!("Failed to read directory: {}", e), dir.display().to_string())
        })?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| QuillError::io(format!("Failed to read directory entry: {}", e)))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| QuillError::io(format!("Failed to read file type: {}", e)))?;

            if file_type.is_dir() {
                let name = entry.file_name();
                if !self.excluded_dirs.contains(name.to_string_lossy().as_ref()) {
                    Box::pin(self.scan_recursive(&path, paths)).await?;
                }
            } else if file_type.is_file() {
                if let Ok(relative) = path.strip_prefix(&self.root) {
                    if self.is_tracked(relative) {
                        paths.push(relative.to_path_buf());
                    }
                }
            }
        }

        Ok(())
    }
}
