//! Unified diff parser
//!
//! Turns one file's unified diff into a [`Patch`]. The parse is structural:
//! line text is kept byte-for-byte apart from the leading tag character and
//! the line terminator. Diff text written with CRLF parses the same as LF;
//! the applier keeps each target line's own terminator.

use regex::Regex;
use std::sync::LazyLock;

use super::types::{DiffLine, FileChange, Hunk, Patch};
use crate::error::{QuillError, QuillResult};

/// `@@ -old_start[,old_count] +new_start[,new_count] @@`
static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@\s*-(\d+)(?:,(\d+))?\s+\+(\d+)(?:,(\d+))?\s*@@").unwrap()
});

const DEV_NULL: &str = "/dev/null";

/// Parse one file's unified diff
pub fn parse(text: &str) -> QuillResult<Patch> {
    let lines: Vec<&str> = text.lines().collect();
    let mut cursor = Cursor::new(&lines);

    let (file_path, change) = parse_file_header(&mut cursor)?;

    let mut hunks: Vec<(usize, Hunk)> = Vec::new();
    while let Some(hunk) = parse_hunk(&mut cursor)? {
        hunks.push(hunk);
    }

    if hunks.is_empty() {
        let (line, content) = cursor.last();
        return Err(QuillError::malformed_diff(
            line,
            content,
            format!("diff for '{}' contains no hunks", file_path),
        ));
    }

    check_hunk_order(&hunks)?;

    Ok(Patch::new(
        file_path,
        hunks.into_iter().map(|(_, hunk)| hunk).collect(),
    )
    .with_change(change))
}

/// Line cursor reporting 1-based line numbers
struct Cursor<'a> {
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<(usize, &'a str)> {
        self.lines.get(self.pos).map(|line| (self.pos + 1, *line))
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = self.peek();
        if line.is_some() {
            self.advance();
        }
        line
    }

    fn last(&self) -> (usize, &'a str) {
        match self.lines.last() {
            Some(line) => (self.lines.len(), *line),
            None => (0, ""),
        }
    }
}

fn parse_file_header(cursor: &mut Cursor<'_>) -> QuillResult<(String, FileChange)> {
    // Skip preamble such as `diff --git` or `index` lines.
    loop {
        match cursor.peek() {
            Some((_, line)) if line.starts_with("--- ") => break,
            Some((no, line)) if line.starts_with("+++ ") || line.starts_with("@@") => {
                return Err(QuillError::malformed_diff(
                    no,
                    line,
                    "missing `--- a/<path>` header",
                ));
            }
            Some(_) => cursor.advance(),
            None => {
                let (no, line) = cursor.last();
                return Err(QuillError::malformed_diff(
                    no,
                    line,
                    "missing `--- a/<path>` header",
                ));
            }
        }
    }

    let Some((old_no, old_line)) = cursor.next_line() else {
        unreachable!("loop above stops on a `---` line");
    };
    let (new_no, new_line) = match cursor.next_line() {
        Some((no, line)) if line.starts_with("+++ ") => (no, line),
        Some((no, line)) => {
            return Err(QuillError::malformed_diff(
                no,
                line,
                "expected `+++ b/<path>` after `---` header",
            ));
        }
        None => {
            return Err(QuillError::malformed_diff(
                old_no,
                old_line,
                "missing `+++ b/<path>` header",
            ));
        }
    };

    match (header_path(&old_line[4..]), header_path(&new_line[4..])) {
        (Some(old), Some(new)) if old == new => Ok((old.to_string(), FileChange::Modify)),
        (Some(old), Some(new)) => Err(QuillError::malformed_diff(
            new_no,
            new_line,
            format!("header paths disagree: '{}' vs '{}'", old, new),
        )),
        (Some(path), None) => Ok((path.to_string(), FileChange::Delete)),
        (None, Some(path)) => Ok((path.to_string(), FileChange::Create)),
        (None, None) => Err(QuillError::malformed_diff(
            new_no,
            new_line,
            "file header names no path",
        )),
    }
}

/// Extract the path from a `---`/`+++` header, dropping timestamps and the
/// `a/`/`b/` prefix. `/dev/null` and empty paths yield `None`.
fn header_path(raw: &str) -> Option<&str> {
    let raw = raw.split('\t').next().unwrap_or_default().trim();
    if raw == DEV_NULL {
        return None;
    }
    let path = raw
        .strip_prefix("a/")
        .or_else(|| raw.strip_prefix("b/"))
        .unwrap_or(raw);
    if path.is_empty() { None } else { Some(path) }
}

fn parse_hunk(cursor: &mut Cursor<'_>) -> QuillResult<Option<(usize, Hunk)>> {
    while let Some((_, line)) = cursor.peek() {
        if line.trim().is_empty() {
            cursor.advance();
        } else {
            break;
        }
    }

    let Some((header_no, header)) = cursor.next_line() else {
        return Ok(None);
    };
    if !header.starts_with("@@") {
        return Err(QuillError::malformed_diff(
            header_no,
            header,
            "expected hunk header `@@ -start[,count] +start[,count] @@`",
        ));
    }
    let (old_start, old_count, new_start, new_count) = parse_hunk_header(header_no, header)?;

    let mut lines = Vec::new();
    let mut old_seen = 0;
    let mut new_seen = 0;

    while let Some((no, line)) = cursor.peek() {
        if line.starts_with("@@") {
            break;
        }

        if old_seen == old_count && new_seen == new_count {
            // Trailing blank lines after a complete body are tolerated.
            if line.trim().is_empty() || line.starts_with('\\') {
                cursor.advance();
                continue;
            }
            return Err(QuillError::malformed_diff(
                no,
                line,
                format!(
                    "line beyond the {} old / {} new lines declared by `{}`",
                    old_count, new_count, header
                ),
            ));
        }

        cursor.advance();
        let parsed = match line.as_bytes().first() {
            // `\ No newline at end of file`
            Some(b'\\') => continue,
            Some(b' ') => DiffLine::Context(line[1..].to_string()),
            Some(b'+') => DiffLine::Add(line[1..].to_string()),
            Some(b'-') => DiffLine::Remove(line[1..].to_string()),
            _ => DiffLine::Context(line.to_string()),
        };
        if parsed.in_pre_image() {
            old_seen += 1;
        }
        if parsed.in_post_image() {
            new_seen += 1;
        }
        lines.push(parsed);
    }

    if old_seen != old_count || new_seen != new_count {
        return Err(QuillError::malformed_diff(
            header_no,
            header,
            format!(
                "hunk body has {} old / {} new lines but the header declares {} / {}",
                old_seen, new_seen, old_count, new_count
            ),
        ));
    }

    Ok(Some((
        header_no,
        Hunk {
            old_start,
            old_count,
            new_start,
            new_count,
            lines,
        },
    )))
}

fn parse_hunk_header(no: usize, line: &str) -> QuillResult<(usize, usize, usize, usize)> {
    let caps = HUNK_HEADER.captures(line).ok_or_else(|| {
        QuillError::malformed_diff(
            no,
            line,
            "hunk header is not `@@ -start[,count] +start[,count] @@`",
        )
    })?;

    let number = |index: usize| -> QuillResult<usize> {
        match caps.get(index) {
            Some(m) => m.as_str().parse().map_err(|_| {
                QuillError::malformed_diff(
                    no,
                    line,
                    format!("'{}' is not a valid line number", m.as_str()),
                )
            }),
            None => Ok(1),
        }
    };

    let (old_start, old_count) = (number(1)?, number(2)?);
    let (new_start, new_count) = (number(3)?, number(4)?);

    if (old_start == 0 && old_count != 0) || (new_start == 0 && new_count != 0) {
        return Err(QuillError::malformed_diff(
            no,
            line,
            "start line 0 is only valid for an empty range",
        ));
    }

    Ok((old_start, old_count, new_start, new_count))
}

/// Declared `(old_count, new_count)` of a hunk header line, if it parses
pub(crate) fn hunk_counts(line: &str) -> Option<(usize, usize)> {
    let caps = HUNK_HEADER.captures(line)?;
    let count = |index: usize| match caps.get(index) {
        Some(m) => m.as_str().parse().ok(),
        None => Some(1),
    };
    Some((count(2)?, count(4)?))
}

fn check_hunk_order(hunks: &[(usize, Hunk)]) -> QuillResult<()> {
    for pair in hunks.windows(2) {
        let (_, prev) = &pair[0];
        let (no, next) = &pair[1];
        if next.old_start < prev.old_range().end {
            return Err(QuillError::malformed_diff(
                *no,
                next.header(),
                format!(
                    "hunk overlaps or precedes the previous hunk `{}`",
                    prev.header()
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "\
--- a/main.tex
+++ b/main.tex
@@ -10,3 +10,4 @@
 context before
-old line
+new line
+added line
 context after
";

    fn malformed_reason(text: &str) -> (usize, String) {
        match parse(text) {
            Err(QuillError::MalformedDiff { line, reason, .. }) => (line, reason),
            other => panic!("expected MalformedDiff, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_patch() {
        let patch = parse(SIMPLE).unwrap();
        assert_eq!(patch.file_path, "main.tex");
        assert_eq!(patch.hunks.len(), 1);

        let hunk = &patch.hunks[0];
        assert_eq!(
            (hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count),
            (10, 3, 10, 4)
        );
        assert_eq!(
            hunk.lines,
            vec![
                DiffLine::Context("context before".to_string()),
                DiffLine::Remove("old line".to_string()),
                DiffLine::Add("new line".to_string()),
                DiffLine::Add("added line".to_string()),
                DiffLine::Context("context after".to_string()),
            ]
        );
    }

    #[test]
    fn test_omitted_counts_default_to_one() {
        let patch = parse("--- a/x.tex\n+++ b/x.tex\n@@ -3 +3 @@\n-before\n+after\n").unwrap();
        assert_eq!(patch.hunks[0].old_count, 1);
        assert_eq!(patch.hunks[0].new_count, 1);
    }

    #[test]
    fn test_multiple_hunks_preserved_in_order() {
        let text = "\
--- a/paper.tex
+++ b/paper.tex
@@ -1,2 +1,2 @@
 \\section{Intro}
-Old intro.
+New intro.
@@ -20,1 +20,2 @@
 \\end{document}
+% trailing note
";
        let patch = parse(text).unwrap();
        assert_eq!(patch.hunks.len(), 2);
        assert_eq!(patch.hunks[0].old_start, 1);
        assert_eq!(patch.hunks[1].old_start, 20);
        assert_eq!(patch.lines_changed(), 3);
    }

    #[test]
    fn test_preamble_and_timestamps_are_skipped() {
        let text = "\
diff --git a/sec/results.tex b/sec/results.tex
index 83db48f..bf269f4 100644
--- a/sec/results.tex\t2024-01-01 00:00:00
+++ b/sec/results.tex\t2024-01-02 00:00:00
@@ -1 +1 @@
-a
+b
";
        assert_eq!(parse(text).unwrap().file_path, "sec/results.tex");
    }

    #[test]
    fn test_dev_null_uses_other_side() {
        let created = parse("--- /dev/null\n+++ b/new.tex\n@@ -0,0 +1,2 @@\n+one\n+two\n").unwrap();
        assert_eq!(created.file_path, "new.tex");
        assert!(created.is_pure_addition());
        assert_eq!(created.change, FileChange::Create);

        let deleted = parse("--- a/old.bib\n+++ /dev/null\n@@ -1 +0,0 @@\n-@misc{x}\n").unwrap();
        assert_eq!(deleted.file_path, "old.bib");
        assert!(deleted.deletes_file());
        assert_eq!(parse(&deleted.to_string()).unwrap(), deleted);

        let modified = parse("--- a/x.tex\n+++ b/x.tex\n@@ -1 +1 @@\n-a\n+b\n").unwrap();
        assert_eq!(modified.change, FileChange::Modify);
    }

    #[test]
    fn test_crlf_diff_text_parses_like_lf() {
        let lf = "--- a/x.tex\n+++ b/x.tex\n@@ -1,2 +1,2 @@\n a\n-b\n+B\n";
        let crlf = lf.replace('\n', "\r\n");
        let patch = parse(&crlf).unwrap();
        assert_eq!(patch, parse(lf).unwrap());
        assert_eq!(patch.hunks[0].post_image(), vec!["a", "B"]);
    }

    #[test]
    fn test_blank_and_untagged_lines_are_context() {
        let text = "--- a/x.tex\n+++ b/x.tex\n@@ -1,3 +1,3 @@\n first\n\n-old\n+new\n";
        let patch = parse(text).unwrap();
        assert_eq!(patch.hunks[0].lines[1], DiffLine::Context(String::new()));
    }

    #[test]
    fn test_trailing_blank_lines_tolerated() {
        let text = format!("{}\n\n\n", SIMPLE);
        assert!(parse(&text).is_ok());
    }

    #[test]
    fn test_no_newline_marker_ignored() {
        let text = "--- a/x.tex\n+++ b/x.tex\n@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n\\ No newline at end of file\n";
        let patch = parse(text).unwrap();
        assert_eq!(patch.hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let (line, reason) = malformed_reason("@@ -1 +1 @@\n-a\n+b\n");
        assert_eq!(line, 1);
        assert!(reason.contains("---"));

        let (_, reason) = malformed_reason("--- a/x.tex\n@@ -1 +1 @@\n-a\n+b\n");
        assert!(reason.contains("+++"));
    }

    #[test]
    fn test_disagreeing_paths_are_malformed() {
        let (line, reason) = malformed_reason("--- a/x.tex\n+++ b/y.tex\n@@ -1 +1 @@\n-a\n+b\n");
        assert_eq!(line, 2);
        assert!(reason.contains("disagree"));
    }

    #[test]
    fn test_unparseable_hunk_header() {
        let (line, _) = malformed_reason("--- a/x.tex\n+++ b/x.tex\n@@ -one,2 +1,2 @@\n a\n b\n");
        assert_eq!(line, 3);
    }

    #[test]
    fn test_overflowing_line_number() {
        let (_, reason) = malformed_reason(
            "--- a/x.tex\n+++ b/x.tex\n@@ -99999999999999999999999 +1 @@\n-a\n+b\n",
        );
        assert!(reason.contains("not a valid line number"));
    }

    #[test]
    fn test_count_mismatch_is_malformed() {
        let (line, reason) =
            malformed_reason("--- a/x.tex\n+++ b/x.tex\n@@ -1,3 +1,3 @@\n a\n-b\n+c\n");
        assert_eq!(line, 3);
        assert!(reason.contains("declares 3 / 3"));
    }

    #[test]
    fn test_extra_body_line_is_malformed() {
        let (line, reason) =
            malformed_reason("--- a/x.tex\n+++ b/x.tex\n@@ -1 +1 @@\n-a\n+b\n+c\n");
        assert_eq!(line, 6);
        assert!(reason.contains("beyond"));
    }

    #[test]
    fn test_overlapping_hunks_are_malformed() {
        let text = "\
--- a/x.tex
+++ b/x.tex
@@ -1,3 +1,3 @@
 a
-b
+B
 c
@@ -2,2 +2,2 @@
-b
+B
 c
";
        let (line, reason) = malformed_reason(text);
        assert_eq!(line, 8);
        assert!(reason.contains("overlaps"));
    }

    #[test]
    fn test_no_hunks_is_malformed() {
        let (_, reason) = malformed_reason("--- a/x.tex\n+++ b/x.tex\n");
        assert!(reason.contains("no hunks"));
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let patch = parse("--- a/x.tex\n+++ b/x.tex\n@@ -1 +1 @@\n-  indented \t\n+\tTabbed  \n").unwrap();
        assert_eq!(patch.hunks[0].pre_image(), vec!["  indented \t"]);
        assert_eq!(patch.hunks[0].post_image(), vec!["\tTabbed  "]);
    }
}
