//! Applying and validating model responses

use anyhow::Context;
use colored::*;
use quill_core::{PatchWorkflow, QuillConfig, ResponseReview};
use std::io::Read;
use std::path::Path;

use crate::console::CliConsole;

/// Read response text from a file, or stdin for `-`
fn read_response(source: &Path) -> anyhow::Result<String> {
    if source == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read response from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(source)
        .with_context(|| format!("failed to read response file {}", source.display()))
}

/// Apply every acceptable diff in a response
pub async fn apply(
    project: &Path,
    config: &QuillConfig,
    response: &Path,
    verbose: bool,
) -> anyhow::Result<()> {
    let console = CliConsole::new(verbose);
    let text = read_response(response)?;
    let workflow = PatchWorkflow::new(project, config)?;

    let report = workflow.apply_response(&text).await?;
    print_review(&console, &report.review);

    if report.review.accepted.is_empty() {
        console.warn("No applicable patches found");
        return Ok(());
    }

    if let Some(before) = &report.before {
        console.info(&format!("Checkpoint before apply: {}", before.short()));
    }
    for applied in &report.applied {
        let verb = if applied.deleted {
            "Deleted"
        } else if applied.created {
            "Created"
        } else {
            "Patched"
        };
        console.success(&format!(
            "{} {} ({} hunks, {} {})",
            verb,
            applied.file_path,
            applied.hunks,
            format!("+{}", applied.additions).green(),
            format!("-{}", applied.deletions).red()
        ));
    }
    for (file, error) in &report.failed {
        console.error(&format!("{}: {}", file, error));
    }
    if let Some(after) = &report.after {
        console.info(&format!("Checkpoint after apply: {}", after.short()));
    }

    if !report.failed.is_empty() {
        anyhow::bail!("{} patch(es) failed to apply", report.failed.len());
    }
    Ok(())
}

/// Report what a response contains without applying it
pub async fn validate(
    project: &Path,
    config: &QuillConfig,
    response: &Path,
    verbose: bool,
) -> anyhow::Result<()> {
    let console = CliConsole::new(verbose);
    let text = read_response(response)?;
    let workflow = PatchWorkflow::new(project, config)?;

    console.print_header("Response Validation");
    let review = workflow.review(&text);
    if review.is_empty() {
        console.warn("No diffs found");
        return Ok(());
    }

    for reviewed in &review.accepted {
        console.success(&format!(
            "{}: {} hunks, {} lines changed",
            reviewed.patch.file_path,
            reviewed.patch.hunks.len(),
            reviewed.patch.lines_changed()
        ));
        if verbose {
            console.print_diff(&reviewed.patch.to_string());
        }
    }
    print_review(&console, &review);
    Ok(())
}

fn print_review(console: &CliConsole, review: &ResponseReview) {
    for reviewed in review.flagged() {
        console.warn(&format!(
            "{} needs review: {}",
            reviewed.patch.file_path,
            reviewed.validation.review_reasons.join("; ")
        ));
    }
    for reviewed in &review.refused {
        console.error(&format!(
            "Refused {}: {}",
            reviewed.patch.file_path, reviewed.validation.reason
        ));
    }
    for block in &review.malformed {
        console.error(&format!(
            "Skipped diff at line {}: {}",
            block.start_line, block.error
        ));
    }
}
