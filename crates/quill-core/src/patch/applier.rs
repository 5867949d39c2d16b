//! Fuzzy hunk application
//!
//! [`apply`] is pure: it takes the current text of a file and returns the
//! patched text. Every hunk is resolved against a scratch copy of the lines;
//! the caller only ever sees a fully patched result or an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use super::types::{DiffLine, Hunk, Patch};
use crate::error::{QuillError, QuillResult};

/// Default number of lines searched on each side of a hunk's anchor
pub const DEFAULT_FUZZ_WINDOW: usize = 30;

/// How lines are compared when locating a hunk's pre-image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitespaceMode {
    /// Byte-for-byte equality
    #[default]
    Exact,
    /// Trailing whitespace is ignored
    IgnoreTrailing,
    /// Runs of whitespace compare equal and leading/trailing whitespace is ignored
    Collapse,
}

impl WhitespaceMode {
    /// Whether a file line matches an expected pre-image line
    pub fn matches(&self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Exact => actual == expected,
            Self::IgnoreTrailing => actual.trim_end() == expected.trim_end(),
            Self::Collapse => actual.split_whitespace().eq(expected.split_whitespace()),
        }
    }
}

impl fmt::Display for WhitespaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::IgnoreTrailing => write!(f, "ignore_trailing"),
            Self::Collapse => write!(f, "collapse"),
        }
    }
}

impl FromStr for WhitespaceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "ignore_trailing" | "ignore-trailing" | "trailing" => Ok(Self::IgnoreTrailing),
            "collapse" => Ok(Self::Collapse),
            _ => Err(format!(
                "unknown whitespace mode '{}' (expected exact, ignore_trailing or collapse)",
                s
            )),
        }
    }
}

/// Hunk matching policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Lines searched above and below the expected position
    pub fuzz_window: usize,
    pub whitespace: WhitespaceMode,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            fuzz_window: DEFAULT_FUZZ_WINDOW,
            whitespace: WhitespaceMode::default(),
        }
    }
}

impl MatchPolicy {
    /// Exact matching at the declared position only
    pub fn strict() -> Self {
        Self {
            fuzz_window: 0,
            whitespace: WhitespaceMode::Exact,
        }
    }
}

/// Apply `patch` to `content` with the default policy
pub fn apply(patch: &Patch, content: &str) -> QuillResult<String> {
    apply_with_policy(patch, content, &MatchPolicy::default())
}

/// Apply `patch` to `content`.
///
/// Hunks are applied top to bottom. Each hunk's expected position is its
/// declared start shifted by what earlier hunks added, removed, or were
/// displaced by. The pre-image is searched nearest-first within
/// `policy.fuzz_window` lines of that position and never before the end of
/// the previous hunk's output.
pub fn apply_with_policy(patch: &Patch, content: &str, policy: &MatchPolicy) -> QuillResult<String> {
    let eol = dominant_eol(content);
    let trailing_newline = content.is_empty() || content.ends_with('\n');

    let mut lines: Vec<FileLine> = content.split_inclusive('\n').map(FileLine::split).collect();
    let mut offset: isize = 0;
    let mut floor = 0;

    for (index, hunk) in patch.hunks.iter().enumerate() {
        let expected = hunk.pre_image();
        let anchor = shifted(hunk.anchor(), offset).min(lines.len());

        let Some(pos) = locate(&lines, &expected, anchor, floor, policy) else {
            return Err(conflict(patch, index, &expected, &lines, anchor));
        };

        if pos == anchor {
            debug!(file = %patch.file_path, hunk = index + 1, line = pos + 1, "Hunk matched");
        } else {
            warn!(
                file = %patch.file_path,
                hunk = index + 1,
                expected_line = anchor + 1,
                line = pos + 1,
                "Hunk matched at displaced position"
            );
        }

        let region = pos..pos + expected.len();
        let neighbour = lines[region.clone()]
            .first()
            .or_else(|| pos.checked_sub(1).and_then(|above| lines.get(above)))
            .or_else(|| lines.get(pos))
            .map_or("", |line| line.eol);
        let replacement = splice_lines(hunk, &lines[region.clone()], neighbour, eol);
        lines.splice(region, replacement);

        floor = pos + hunk.new_count;
        offset = pos as isize - hunk.anchor() as isize + hunk.delta();
    }

    // Only the last line may go unterminated, and only if it was before
    let last = lines.len().saturating_sub(1);
    let mut output = String::with_capacity(content.len());
    for (i, line) in lines.iter().enumerate() {
        output.push_str(&line.text);
        if i < last || trailing_newline {
            output.push_str(if line.eol.is_empty() { eol } else { line.eol });
        }
    }
    Ok(output)
}

/// One line of the file being patched, with its own terminator
#[derive(Debug, Clone)]
struct FileLine {
    text: String,
    /// `"\r\n"`, `"\n"` or empty for an unterminated last line
    eol: &'static str,
}

impl FileLine {
    fn split(raw: &str) -> Self {
        let (text, eol) = if let Some(text) = raw.strip_suffix("\r\n") {
            (text, "\r\n")
        } else if let Some(text) = raw.strip_suffix('\n') {
            (text, "\n")
        } else {
            (raw, "")
        };
        Self {
            text: text.to_string(),
            eol,
        }
    }
}

/// The more common terminator in `content`; LF on a tie
fn dominant_eol(content: &str) -> &'static str {
    let total = content.matches('\n').count();
    let crlf = content.matches("\r\n").count();
    if crlf * 2 > total { "\r\n" } else { "\n" }
}

fn shifted(anchor: usize, offset: isize) -> usize {
    anchor.saturating_add_signed(offset)
}

/// Nearest position at or after `floor` where `expected` matches
fn locate(
    lines: &[FileLine],
    expected: &[&str],
    anchor: usize,
    floor: usize,
    policy: &MatchPolicy,
) -> Option<usize> {
    let fits = |pos: usize| {
        pos >= floor
            && pos + expected.len() <= lines.len()
            && lines[pos..pos + expected.len()]
                .iter()
                .zip(expected)
                .all(|(actual, want)| policy.whitespace.matches(&actual.text, want))
    };

    if fits(anchor) {
        return Some(anchor);
    }
    for distance in 1..=policy.fuzz_window {
        if distance <= anchor && fits(anchor - distance) {
            return Some(anchor - distance);
        }
        if fits(anchor + distance) {
            return Some(anchor + distance);
        }
    }
    None
}

/// Post-image for a matched region.
///
/// Context lines keep the file's own text and terminator. Added lines take
/// the terminator of the file line just before them, or `neighbour` at the
/// start of the region, or `fallback` when neither has one.
fn splice_lines(
    hunk: &Hunk,
    matched: &[FileLine],
    neighbour: &'static str,
    fallback: &'static str,
) -> Vec<FileLine> {
    let mut file_lines = matched.iter();
    let mut last_eol = neighbour;
    let mut output = Vec::with_capacity(hunk.new_count);
    for line in &hunk.lines {
        match line {
            DiffLine::Context(text) => {
                let kept = file_lines.next().cloned().unwrap_or_else(|| FileLine {
                    text: text.clone(),
                    eol: last_eol,
                });
                if !kept.eol.is_empty() {
                    last_eol = kept.eol;
                }
                output.push(kept);
            }
            DiffLine::Remove(_) => {
                match file_lines.next() {
                    Some(removed) if !removed.eol.is_empty() => last_eol = removed.eol,
                    _ => {}
                }
            }
            DiffLine::Add(text) => output.push(FileLine {
                text: text.clone(),
                eol: if last_eol.is_empty() { fallback } else { last_eol },
            }),
        }
    }
    output
}

fn conflict(patch: &Patch, index: usize, expected: &[&str], lines: &[FileLine], anchor: usize) -> QuillError {
    let start = anchor.min(lines.len());
    let end = (anchor + expected.len().max(1)).min(lines.len());
    let actual = if start == end {
        "<end of file>".to_string()
    } else {
        lines[start..end]
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };
    QuillError::apply_conflict(&patch.file_path, index + 1, expected.join("\n"), actual)
}
