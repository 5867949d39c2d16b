//! Durable file helpers shared by the patcher and the checkpoint store

use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Replace `path` with `data` via a synced temp file and a rename.
///
/// Readers see either the old bytes or the new bytes, never a mix. Parent
/// directories are created as needed.
pub async fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).await?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = parent
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{}.quill-tmp-{}", file_name, uuid::Uuid::new_v4().simple()));

    let written = match write_synced(&temp_path, data).await {
        Ok(()) => fs::rename(&temp_path, path).await,
        Err(err) => Err(err),
    };
    if written.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    written
}

async fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

/// Remove a file, treating "not found" as already removed
pub async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

/// Read a file, mapping "not found" to `None`
pub async fn read_if_exists(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chapters/intro.tex");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("chapters"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains("quill-tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file
        let target = dir.path().join("occupied");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.tex"), b"x").unwrap();

        assert!(write_atomic(&target, b"data").await.is_err());

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["occupied".to_string()]);
        assert!(target.join("keep.tex").exists());
    }

    #[tokio::test]
    async fn test_remove_if_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.tex");
        std::fs::write(&path, b"x").unwrap();

        remove_if_exists(&path).await.unwrap();
        assert!(!path.exists());
        remove_if_exists(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_if_exists() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_if_exists(&dir.path().join("missing")).await.unwrap(), None);

        std::fs::write(dir.path().join("present"), b"x").unwrap();
        assert_eq!(
            read_if_exists(&dir.path().join("present")).await.unwrap(),
            Some(b"x".to_vec())
        );
    }
}
