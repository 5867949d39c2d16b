//! Diffing against and reverting to checkpoints

use quill_core::checkpoints::RestorePreview;
use quill_core::{QuillConfig, RestoreOptions};
use std::path::Path;

use super::checkpoint_manager;
use crate::console::CliConsole;

/// Flags of the `revert` command
#[derive(Debug, Clone, Copy, Default)]
pub struct RevertFlags {
    pub exact: bool,
    pub backup: bool,
    pub dry_run: bool,
}

/// Print the diff from a checkpoint to the working tree
pub async fn diff(project: &Path, config: &QuillConfig, reference: &str) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    let manager = checkpoint_manager(project, config);

    let id = manager.resolve(reference).await?;
    let diffs = manager.diff(&id).await?;
    if diffs.is_empty() {
        console.success(&format!("No changes since checkpoint {}", id.short()));
        return Ok(());
    }

    for text in diffs.values() {
        console.print_diff(text);
    }
    Ok(())
}

/// Restore the working tree to a checkpoint
pub async fn revert(
    project: &Path,
    config: &QuillConfig,
    reference: &str,
    flags: RevertFlags,
) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    let manager = checkpoint_manager(project, config);
    let id = manager.resolve(reference).await?;

    let mut options = if flags.exact {
        RestoreOptions::exact()
    } else {
        RestoreOptions::default()
    };
    if flags.backup {
        options = options.with_backup();
    }

    if flags.dry_run {
        console.print_header(&format!("Revert to {} (dry run)", id.short()));
        for step in manager.preview_restore(&id, &options).await? {
            let path = step.path().display();
            match &step {
                RestorePreview::WillCreate(_) => println!("  create    {}", path),
                RestorePreview::WillOverwrite(_) => println!("  overwrite {}", path),
                RestorePreview::WillDelete(_) => println!("  delete    {}", path),
                RestorePreview::NoChange(_) => {}
            }
        }
        return Ok(());
    }

    let result = manager.restore_with(&id, &options).await?;
    if let Some(backup) = &result.backup_checkpoint_id {
        console.success(&format!("Saved current state as checkpoint {}", backup.short()));
    }
    for (path, error) in &result.failed_files {
        console.error(&format!("{}: {}", path.display(), error));
    }
    if !result.is_success() {
        anyhow::bail!("{} file(s) could not be restored", result.failed_count());
    }

    console.success(&format!(
        "Reverted to {}: {} restored, {} deleted, {} unchanged",
        id.short(),
        result.restored_count(),
        result.deleted_files.len(),
        result.unchanged_files.len()
    ));
    Ok(())
}
