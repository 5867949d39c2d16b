//! Unified diffs between checkpoint content and the working tree
//!
//! Output uses the same grammar the patch parser accepts, so any diff
//! produced here parses back into an equivalent [`Patch`](crate::patch::Patch).

use similar::{Algorithm, ChangeTag, TextDiff};
use std::ops::Range;
use std::path::Path;

use crate::patch::{DiffLine, Hunk};

/// Unchanged lines shown around each change
pub const CONTEXT_LINES: usize = 3;

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Render the diff from `old` to `new` for `path`.
///
/// `None` on either side means the file does not exist there and renders as
/// `/dev/null`. Returns `None` when both sides are byte-identical.
pub fn unified_diff(path: &Path, old: Option<&[u8]>, new: Option<&[u8]>) -> Option<String> {
    if old == new {
        return None;
    }

    let display = path.to_string_lossy().replace('\\', "/");
    let old_text = String::from_utf8_lossy(old.unwrap_or_default());
    let new_text = String::from_utf8_lossy(new.unwrap_or_default());

    let mut out = String::new();
    match old {
        Some(_) => out.push_str(&format!("--- a/{}\n", display)),
        None => out.push_str("--- /dev/null\n"),
    }
    match new {
        Some(_) => out.push_str(&format!("+++ b/{}\n", display)),
        None => out.push_str("+++ /dev/null\n"),
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Lcs)
        .diff_lines(&*old_text, &*new_text);

    for group in diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        let mut unterminated = Vec::new();
        for op in &group {
            for change in diff.iter_changes(op) {
                let value = change.value();
                let text = value.strip_suffix('\n').unwrap_or(value).to_string();
                lines.push(match change.tag() {
                    ChangeTag::Equal => DiffLine::Context(text),
                    ChangeTag::Delete => DiffLine::Remove(text),
                    ChangeTag::Insert => DiffLine::Add(text),
                });
                unterminated.push(change.missing_newline());
            }
        }

        let hunk = Hunk::new(header_start(&old_range), header_start(&new_range), lines);
        out.push_str(&hunk.header());
        out.push('\n');
        for (line, missing_newline) in hunk.lines.iter().zip(unterminated) {
            out.push_str(&line.to_string());
            out.push('\n');
            if missing_newline {
                out.push_str(NO_NEWLINE_MARKER);
                out.push('\n');
            }
        }
    }

    Some(out)
}

/// 1-based header start; an empty range names the line before it
fn header_start(range: &Range<usize>) -> usize {
    if range.is_empty() {
        range.start
    } else {
        range.start + 1
    }
}
