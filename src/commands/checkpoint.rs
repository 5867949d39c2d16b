//! Checkpoint creation and listing

use colored::*;
use quill_core::QuillConfig;
use std::path::Path;

use super::checkpoint_manager;
use crate::console::CliConsole;

/// Snapshot all tracked files
pub async fn create(project: &Path, config: &QuillConfig, description: &str) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    let manager = checkpoint_manager(project, config);

    let checkpoint = manager.create(description).await?;
    console.success(&format!(
        "Created checkpoint {} ({} files)",
        checkpoint.short_id(),
        checkpoint.file_count()
    ));
    Ok(())
}

/// List checkpoints, newest first
pub async fn list(project: &Path, config: &QuillConfig) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    let manager = checkpoint_manager(project, config);

    let checkpoints = manager.list_checkpoints().await?;
    if checkpoints.is_empty() {
        console.warn("No checkpoints yet");
        return Ok(());
    }

    console.print_header("Checkpoints");
    for summary in checkpoints {
        println!(
            "{}  {}  {:<11} {:>4} files  {}",
            summary.id.short().yellow(),
            summary
                .created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed(),
            summary.checkpoint_type.to_string(),
            summary.file_count,
            summary.description
        );
    }
    Ok(())
}
