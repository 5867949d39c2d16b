//! Integration tests for the patch and checkpoint pipeline
//!
//! Covers extraction from model output, fuzzy application, and the
//! create / diff / restore cycle over a real project directory.

use quill_core::{
    CheckpointManager, CheckpointManagerConfig, MatchPolicy, ProjectLock, ProjectPatcher,
    QuillConfig, QuillError, QuillResult, UnifiedError, apply, extract, parse,
    patch::extract_all, workflow::PatchWorkflow,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("quill_core=debug")
        .try_init();
}

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(full, content).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    std::fs::read_to_string(root.join(path)).unwrap()
}

fn paper() -> TempDir {
    let dir = TempDir::new().unwrap();
    let body: String = (1..=20).map(|n| format!("Sentence {}.\n", n)).collect();
    write(
        dir.path(),
        "main.tex",
        &format!("\\documentclass{{article}}\n\\begin{{document}}\n{}\\end{{document}}\n", body),
    );
    write(dir.path(), "refs.bib", "@book{knuth, title={TAOCP}}\n");
    dir
}

/// Test parse and re-serialization agree on the hunk structure
#[test]
fn test_parse_display_round_trip() -> QuillResult<()> {
    let text = "--- a/main.tex\n+++ b/main.tex\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n@@ -10,2 +10,3 @@\n x\n+y\n z\n";

    let patch = parse(text)?;
    let reparsed = parse(&patch.to_string())?;

    assert_eq!(patch, reparsed);
    assert_eq!(patch.lines_changed(), 3);
    Ok(())
}

/// Test the worked example of a one-line replacement plus insertion
#[test]
fn test_apply_worked_example() -> QuillResult<()> {
    let mut lines: Vec<String> = (1..=9).map(|n| format!("line {}", n)).collect();
    lines.extend(["context", "old line", "context after", "tail"].map(String::from));
    let content = lines.join("\n") + "\n";

    let patch = parse(
        "--- a/f.tex\n+++ b/f.tex\n@@ -10,3 +10,4 @@\n context\n-old line\n+new line\n+added line\n context after\n",
    )?;
    let result = apply(&patch, &content)?;
    let result_lines: Vec<&str> = result.lines().collect();

    assert_eq!(
        &result_lines[9..13],
        &["context", "new line", "added line", "context after"]
    );
    assert_eq!(result_lines[13], "tail");
    Ok(())
}

/// Test extraction counts and order across fenced blocks
#[test]
fn test_extract_zero_one_two_blocks() {
    let block = |from: &str, to: &str| {
        format!(
            "```diff\n--- a/main.tex\n+++ b/main.tex\n@@ -3 +3 @@\n-{}\n+{}\n```\n",
            from, to
        )
    };

    assert!(extract("No changes needed.").is_empty());
    assert_eq!(extract(&format!("Fix:\n{}", block("a", "b"))).len(), 1);

    let two = format!("First:\n{}\nSecond:\n{}", block("a", "b"), block("c", "d"));
    let patches = extract(&two);
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0].hunks[0].lines[0].text(), "a");
    assert_eq!(patches[1].hunks[0].lines[0].text(), "c");

    let corrupted = format!(
        "{}\n```diff\n--- a/main.tex\n+++ b/main.tex\n@@ -x,1 +1 @@\n-q\n+r\n```\n{}",
        block("a", "b"),
        block("c", "d")
    );
    let extraction = extract_all(&corrupted);
    assert_eq!(extraction.patches.len(), 2);
    assert_eq!(extraction.rejected.len(), 1);
    assert!(extraction.rejected[0].error.is_recoverable());
}

/// Test stale line numbers are absorbed by the fuzzy window
#[tokio::test]
async fn test_stale_line_numbers_apply() -> QuillResult<()> {
    init_tracing();
    let dir = paper();
    let patcher = ProjectPatcher::new(dir.path(), MatchPolicy::default());

    // Sentence 10 is on line 12; the model thinks it is on line 4
    let patch = parse(
        "--- a/main.tex\n+++ b/main.tex\n@@ -4,3 +4,3 @@\n Sentence 9.\n-Sentence 10.\n+Sentence ten.\n Sentence 11.\n",
    )?;
    patcher.apply(&patch).await?;

    let text = read(dir.path(), "main.tex");
    assert!(text.contains("Sentence 9.\nSentence ten.\nSentence 11.\n"));
    Ok(())
}

/// Test a failed second hunk leaves the file byte-identical
#[tokio::test]
async fn test_conflict_is_all_or_nothing() -> QuillResult<()> {
    let dir = paper();
    let before = std::fs::read(dir.path().join("main.tex")).unwrap();
    let patcher = ProjectPatcher::new(dir.path(), MatchPolicy::default());

    let patch = parse(
        "--- a/main.tex\n+++ b/main.tex\n@@ -3 +3 @@\n-Sentence 1.\n+One.\n@@ -15 +15 @@\n-Sentence that never existed.\n+Nope.\n",
    )?;
    let err = patcher.apply(&patch).await.unwrap_err();

    match err {
        QuillError::ApplyConflict { file, hunk, .. } => {
            assert_eq!(file, "main.tex");
            assert_eq!(hunk, 2);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(std::fs::read(dir.path().join("main.tex")).unwrap(), before);
    Ok(())
}

/// Test create, mutate, diff and restore over a project
#[tokio::test]
async fn test_checkpoint_cycle() -> QuillResult<()> {
    init_tracing();
    let dir = paper();
    let manager = CheckpointManager::new(CheckpointManagerConfig::new(dir.path()));

    let checkpoint = manager.create("Before edits").await?;
    assert!(manager.diff(&checkpoint.id).await?.is_empty());

    write(dir.path(), "refs.bib", "@book{knuth, title={The Art}}\n");
    let diffs = manager.diff(&checkpoint.id).await?;
    assert_eq!(diffs.keys().collect::<Vec<_>>(), vec![&PathBuf::from("refs.bib")]);

    write(dir.path(), "main.tex", "gone\n");
    assert!(manager.restore(&checkpoint.id).await?);
    assert!(manager.diff(&checkpoint.id).await?.is_empty());
    assert!(read(dir.path(), "main.tex").starts_with("\\documentclass"));
    Ok(())
}

/// Test checkpoint history survives a new manager on the same directory
#[tokio::test]
async fn test_history_survives_restart() -> QuillResult<()> {
    let dir = paper();
    let id = {
        let manager = CheckpointManager::new(CheckpointManagerConfig::new(dir.path()));
        manager.create("first").await?;
        manager.create("second").await?.id
    };

    let manager = CheckpointManager::new(CheckpointManagerConfig::new(dir.path()));
    let list = manager.list_checkpoints().await?;
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, id);
    assert_eq!(list[0].description, "second");
    assert_eq!(list[0].file_count, 2);
    assert!(manager.restore(&id).await?);
    Ok(())
}

/// Test a checkpoint diff re-applies onto the checkpoint content
#[tokio::test]
async fn test_checkpoint_diff_is_applicable() -> QuillResult<()> {
    let dir = paper();
    let original = read(dir.path(), "main.tex");
    let manager = CheckpointManager::new(CheckpointManagerConfig::new(dir.path()));
    let checkpoint = manager.create("base").await?;

    let edited = original.replace("Sentence 7.\n", "Sentence seven.\nExtra.\n");
    write(dir.path(), "main.tex", &edited);

    let diffs = manager.diff(&checkpoint.id).await?;
    let patch = parse(&diffs[&PathBuf::from("main.tex")])?;
    assert_eq!(apply(&patch, &original)?, edited);
    Ok(())
}

/// Test a deleted-file diff from a checkpoint removes the file again when applied
#[tokio::test]
async fn test_deleted_file_diff_round_trips() -> QuillResult<()> {
    let dir = paper();
    let refs = read(dir.path(), "refs.bib");
    let manager = CheckpointManager::new(CheckpointManagerConfig::new(dir.path()));
    let checkpoint = manager.create("with refs").await?;

    std::fs::remove_file(dir.path().join("refs.bib")).unwrap();
    let diffs = manager.diff(&checkpoint.id).await?;
    let patch = parse(&diffs[&PathBuf::from("refs.bib")])?;
    assert!(patch.deletes_file());

    // Replay the deletion onto the checkpoint content
    write(dir.path(), "refs.bib", &refs);

    let applied = ProjectPatcher::new(dir.path(), MatchPolicy::default())
        .apply(&patch)
        .await?;
    assert!(applied.deleted);
    assert!(!dir.path().join("refs.bib").exists());
    Ok(())
}

/// Test restore waits while an apply holds the project lock
#[tokio::test]
async fn test_restore_waits_for_exclusive_lock() -> QuillResult<()> {
    let dir = paper();
    let manager = CheckpointManager::new(CheckpointManagerConfig::new(dir.path()));
    let checkpoint = manager.create("base").await?;
    write(dir.path(), "main.tex", "edited\n");

    let guard = ProjectLock::for_root(dir.path()).exclusive().await;
    let restore = manager.restore(&checkpoint.id);
    tokio::pin!(restore);

    let waited = tokio::time::timeout(Duration::from_millis(50), &mut restore).await;
    assert!(waited.is_err());
    assert_eq!(read(dir.path(), "main.tex"), "edited\n");

    drop(guard);
    assert!(restore.await?);
    assert!(read(dir.path(), "main.tex").starts_with("\\documentclass"));
    Ok(())
}

/// Test the full response workflow then undo through the before checkpoint
#[tokio::test]
async fn test_workflow_then_revert() -> QuillResult<()> {
    init_tracing();
    let dir = paper();
    let original = read(dir.path(), "main.tex");
    let workflow = PatchWorkflow::new(dir.path(), &QuillConfig::default())?;

    let response = "I tightened two sentences.\n\n```diff\n--- a/main.tex\n+++ b/main.tex\n@@ -5 +5 @@\n-Sentence 3.\n+Sentence three.\n```\n\nand the bibliography:\n\n--- a/refs.bib\n+++ b/refs.bib\n@@ -1 +1 @@\n-@book{knuth, title={TAOCP}}\n+@book{knuth, title={The Art of Computer Programming}}\n";
    let report = workflow.apply_response(response).await?;

    assert_eq!(report.applied.len(), 2);
    assert!(report.is_clean());
    assert!(read(dir.path(), "main.tex").contains("Sentence three."));

    let before = report.before.unwrap();
    assert_eq!(workflow.checkpoints().diff(&before).await?.len(), 2);
    assert!(workflow.checkpoints().restore(&before).await?);
    assert_eq!(read(dir.path(), "main.tex"), original);
    Ok(())
}
