//! Patch data model
//!
//! A [`Patch`] is one file's ordered list of [`Hunk`]s. Hunk bodies use a
//! tagged line model so every consumer handles context, additions and
//! removals exhaustively.

use std::fmt;
use std::ops::Range;

/// One line of a hunk body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiffLine {
    /// Present in both pre-image and post-image
    Context(String),
    /// Present only in the post-image
    Add(String),
    /// Present only in the pre-image
    Remove(String),
}

impl DiffLine {
    /// Line text without the leading tag character
    pub fn text(&self) -> &str {
        match self {
            Self::Context(s) | Self::Add(s) | Self::Remove(s) => s,
        }
    }

    /// The unified-diff tag character
    pub fn prefix(&self) -> char {
        match self {
            Self::Context(_) => ' ',
            Self::Add(_) => '+',
            Self::Remove(_) => '-',
        }
    }

    /// Whether the line belongs to the hunk's pre-image
    pub fn in_pre_image(&self) -> bool {
        matches!(self, Self::Context(_) | Self::Remove(_))
    }

    /// Whether the line belongs to the hunk's post-image
    pub fn in_post_image(&self) -> bool {
        matches!(self, Self::Context(_) | Self::Add(_))
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), self.text())
    }
}

/// A contiguous block of changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based start line in the original file
    pub old_start: usize,
    pub old_count: usize,
    /// 1-based start line in the new file
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Build a hunk whose counts are derived from its lines
    pub fn new(old_start: usize, new_start: usize, lines: Vec<DiffLine>) -> Self {
        let old_count = lines.iter().filter(|l| l.in_pre_image()).count();
        let new_count = lines.iter().filter(|l| l.in_post_image()).count();
        Self {
            old_start,
            old_count,
            new_start,
            new_count,
            lines,
        }
    }

    /// Lines the target must contain for this hunk to apply
    pub fn pre_image(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.in_pre_image())
            .map(DiffLine::text)
            .collect()
    }

    /// Lines that replace the pre-image
    pub fn post_image(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.in_post_image())
            .map(DiffLine::text)
            .collect()
    }

    /// Number of added lines
    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Add(_)))
            .count()
    }

    /// Number of removed lines
    pub fn deletions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Remove(_)))
            .count()
    }

    /// Declared pre-image range, 1-based, end exclusive
    pub fn old_range(&self) -> Range<usize> {
        self.old_start..self.old_start + self.old_count
    }

    /// 0-based index where the pre-image is expected to start.
    ///
    /// A zero-length pre-image (`-5,0`) names the line *after which* the
    /// post-image is inserted.
    pub fn anchor(&self) -> usize {
        if self.old_count == 0 {
            self.old_start
        } else {
            self.old_start.saturating_sub(1)
        }
    }

    /// Whether the declared counts agree with the tagged lines
    pub fn is_consistent(&self) -> bool {
        self.lines.iter().filter(|l| l.in_pre_image()).count() == self.old_count
            && self.lines.iter().filter(|l| l.in_post_image()).count() == self.new_count
    }

    /// Signed change in file length
    pub fn delta(&self) -> isize {
        self.new_count as isize - self.old_count as isize
    }

    /// The `@@ -a,b +c,d @@` header line
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// What a patch does to its file as a whole, from the `/dev/null` side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FileChange {
    #[default]
    Modify,
    /// Old side is `/dev/null`
    Create,
    /// New side is `/dev/null`
    Delete,
}

/// All hunks for one file, applied top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Path relative to the project root, `a/`/`b/` prefix stripped
    pub file_path: String,
    pub hunks: Vec<Hunk>,
    pub change: FileChange,
}

impl Patch {
    pub fn new(file_path: impl Into<String>, hunks: Vec<Hunk>) -> Self {
        Self {
            file_path: file_path.into(),
            hunks,
            change: FileChange::Modify,
        }
    }

    pub fn with_change(mut self, change: FileChange) -> Self {
        self.change = change;
        self
    }

    /// Whether the file is removed once every line is gone
    pub fn deletes_file(&self) -> bool {
        self.change == FileChange::Delete
    }

    /// Added plus removed lines across all hunks
    pub fn lines_changed(&self) -> usize {
        self.additions() + self.deletions()
    }

    /// Count of lines added
    pub fn additions(&self) -> usize {
        self.hunks.iter().map(Hunk::additions).sum()
    }

    /// Count of lines removed
    pub fn deletions(&self) -> usize {
        self.hunks.iter().map(Hunk::deletions).sum()
    }

    /// Whether every hunk only adds lines
    pub fn is_pure_addition(&self) -> bool {
        self.hunks.iter().all(|h| h.old_count == 0)
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.change {
            FileChange::Create => writeln!(f, "--- /dev/null")?,
            _ => writeln!(f, "--- a/{}", self.file_path)?,
        }
        match self.change {
            FileChange::Delete => writeln!(f, "+++ /dev/null")?,
            _ => writeln!(f, "+++ b/{}", self.file_path)?,
        }
        for hunk in &self.hunks {
            write!(f, "{}", hunk)?;
        }
        Ok(())
    }
}
