//! Diff extraction from free-form model output
//!
//! Model responses mix prose with diffs. Candidate blocks come from fenced
//! code blocks (```` ```diff ````, ```` ```patch ````, or an unlabeled fence
//! holding a file header pair) and from bare runs of diff lines that start
//! with a `--- a/` / `+++ b/` pair. Every candidate goes through the parser
//! on its own; failures are collected, never raised.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::parser::{hunk_counts, parse};
use super::types::Patch;
use crate::error::QuillError;

/// Fence labels that always denote a diff
const DIFF_FENCE_LABELS: &[&str] = &["diff", "patch", "udiff"];

/// Lines `git diff` emits between file sections
const GIT_PREAMBLE: &[&str] = &[
    "diff ",
    "index ",
    "new file mode",
    "deleted file mode",
    "old mode",
    "new mode",
    "similarity index",
    "rename from",
    "rename to",
];

/// A candidate block the parser refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedBlock {
    /// 1-based line in the source text where the block starts
    pub start_line: usize,
    pub error: QuillError,
}

/// Outcome of scanning one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Parsed patches in order of appearance
    pub patches: Vec<Patch>,
    /// Blocks that failed to parse, in order of appearance
    pub rejected: Vec<RejectedBlock>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty() && self.rejected.is_empty()
    }
}

/// Extract every parseable patch from `text`
pub fn extract(text: &str) -> Vec<Patch> {
    extract_all(text).patches
}

/// Extract patches and keep the errors of skipped blocks
pub fn extract_all(text: &str) -> Extraction {
    let lines: Vec<&str> = text.lines().collect();
    let mut extraction = Extraction::default();
    let mut seen = HashSet::new();

    for candidate in candidate_blocks(&lines) {
        if !seen.insert(candidate.text.trim().to_string()) {
            debug!(line = candidate.start_line, "Skipping duplicate diff block");
            continue;
        }

        match parse(&candidate.text) {
            Ok(patch) => {
                debug!(
                    file = %patch.file_path,
                    hunks = patch.hunks.len(),
                    "Extracted patch"
                );
                extraction.patches.push(patch);
            }
            Err(error) => {
                warn!(
                    line = candidate.start_line,
                    error = %error,
                    "Skipping unparseable diff block"
                );
                extraction.rejected.push(RejectedBlock {
                    start_line: candidate.start_line,
                    error,
                });
            }
        }
    }

    extraction
}

struct Candidate {
    start_line: usize,
    text: String,
}

fn candidate_blocks(lines: &[&str]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if let Some(label) = fence_label(lines[i]) {
            let close = lines[i + 1..]
                .iter()
                .position(|line| line.trim_start().starts_with("```"))
                .map(|p| i + 1 + p)
                .unwrap_or(lines.len());
            let body = &lines[i + 1..close];

            let labeled = DIFF_FENCE_LABELS.contains(&label.as_str());
            if labeled || (label.is_empty() && file_headers(body).next().is_some()) {
                candidates.extend(split_files(body, i + 2));
            }
            i = close + 1;
            continue;
        }

        if is_bare_header_pair(lines, i) {
            let end = bare_run_end(lines, i);
            candidates.extend(split_files(&lines[i..end], i + 1));
            i = end;
            continue;
        }

        i += 1;
    }

    candidates
}

/// Lowercased label of an opening fence line
fn fence_label(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix("```")?;
    Some(
        rest.split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase(),
    )
}

fn is_header_pair(lines: &[&str], i: usize) -> bool {
    i + 1 < lines.len() && lines[i].starts_with("--- ") && lines[i + 1].starts_with("+++ ")
}

fn is_bare_header_pair(lines: &[&str], i: usize) -> bool {
    is_header_pair(lines, i) && lines[i].starts_with("--- a/") && lines[i + 1].starts_with("+++ b/")
}

fn file_headers<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = usize> + 'a {
    (0..lines.len()).filter(move |&i| is_header_pair(lines, i))
}

/// End (exclusive) of a bare diff run starting at a header pair.
///
/// Hunk bodies are consumed by their declared counts so that prose after
/// the diff (including list items starting with `-`) is not swallowed.
/// Diff lines that directly follow an exhausted hunk are kept with it so
/// the parser sees the miscount instead of a truncated hunk.
fn bare_run_end(lines: &[&str], start: usize) -> usize {
    let mut end = start + 2;
    // `Some((old, new))` is the remaining body of the current hunk;
    // `None` means the hunk header did not parse and any diff-like line continues.
    let mut remaining = Some((0usize, 0usize));

    while end < lines.len() {
        let line = lines[end];

        if line.starts_with("@@") {
            remaining = hunk_counts(line);
            end += 1;
            continue;
        }
        if is_header_pair(lines, end) {
            remaining = Some((0, 0));
            end += 2;
            continue;
        }
        if line.starts_with('\\') {
            end += 1;
            continue;
        }

        match remaining {
            Some((0, 0)) => {
                let overflow = overflow_end(lines, end);
                if overflow == end {
                    break;
                }
                end = overflow;
                continue;
            }
            Some((old, new)) => {
                let (old, new) = match line.as_bytes().first() {
                    Some(b'+') => (old, new.saturating_sub(1)),
                    Some(b'-') => (old.saturating_sub(1), new),
                    Some(b' ') | None => (old.saturating_sub(1), new.saturating_sub(1)),
                    Some(_) => break,
                };
                remaining = Some((old, new));
            }
            None => {
                if !matches!(line.as_bytes().first(), Some(b' ' | b'+' | b'-')) {
                    break;
                }
            }
        }
        end += 1;
    }

    end
}

/// End of the diff-like lines at `start` that overrun a hunk's counts.
///
/// Returns `start` when there are none, or when every one of them reads as
/// a `- ` list item.
fn overflow_end(lines: &[&str], start: usize) -> usize {
    let mut end = start;
    while end < lines.len()
        && matches!(lines[end].as_bytes().first(), Some(b' ' | b'+' | b'-' | b'\\'))
        && !is_header_pair(lines, end)
    {
        end += 1;
    }

    if lines[start..end].iter().all(|line| line.starts_with("- ")) {
        start
    } else {
        end
    }
}

/// Split a block into one candidate per file header pair.
///
/// `first_line` is the 1-based source line of `block[0]`.
fn split_files(block: &[&str], first_line: usize) -> Vec<Candidate> {
    let headers: Vec<usize> = file_headers(block).collect();
    if headers.len() <= 1 {
        return vec![Candidate {
            start_line: first_line,
            text: join(block),
        }];
    }

    let mut candidates = Vec::with_capacity(headers.len());
    for (n, &header) in headers.iter().enumerate() {
        let start = if n == 0 { 0 } else { header };
        let end = match headers.get(n + 1) {
            Some(&next) => preamble_start(block, next),
            None => block.len(),
        };
        candidates.push(Candidate {
            start_line: first_line + start,
            text: join(&block[start..end.max(start)]),
        });
    }
    candidates
}

/// Walk back over `diff --git`/`index` lines preceding a file header
fn preamble_start(block: &[&str], header: usize) -> usize {
    let mut start = header;
    while start > 0
        && GIT_PREAMBLE
            .iter()
            .any(|prefix| block[start - 1].starts_with(prefix))
    {
        start -= 1;
    }
    start
}

fn join(lines: &[&str]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
