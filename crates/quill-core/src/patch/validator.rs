//! Safety checks for model-produced patches

use glob::{MatchOptions, Pattern};

use super::types::{DiffLine, Patch};
use crate::config::SafetyConfig;
use crate::error::{QuillError, QuillResult};

/// Deleted lines above which a patch needs human review
pub const LARGE_DELETION_THRESHOLD: usize = 10;

/// Content that should not change without a human looking at it
const SENSITIVE_PATTERNS: &[&str] = &["abstract", "\\title", "\\author", "\\maketitle"];

/// Result of validating one patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    /// Why the patch was refused; empty when valid
    pub reason: String,
    pub requires_human_review: bool,
    pub review_reasons: Vec<String>,
}

impl ValidationResult {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
            ..Default::default()
        }
    }

    /// Turn a refusal into a [`QuillError::PatchRejected`]
    pub fn into_result(self, file: &str) -> QuillResult<Self> {
        if self.valid {
            Ok(self)
        } else {
            Err(QuillError::patch_rejected(file, self.reason))
        }
    }
}

/// Validates patches against [`SafetyConfig`]
#[derive(Debug, Clone)]
pub struct PatchValidator {
    allowlist: Vec<Pattern>,
    denylist: Vec<Pattern>,
    max_changed_lines: usize,
}

impl PatchValidator {
    pub fn new(config: &SafetyConfig) -> QuillResult<Self> {
        Ok(Self {
            allowlist: compile(&config.allowlist)?,
            denylist: compile(&config.denylist)?,
            max_changed_lines: config.max_changed_lines,
        })
    }

    pub fn validate(&self, patch: &Patch) -> ValidationResult {
        let path = patch.file_path.as_str();

        if !self.allowlist.iter().any(|p| matches(p, path)) {
            return ValidationResult::rejected(format!("File not in allowlist: {}", path));
        }
        if self.denylist.iter().any(|p| matches(p, path)) {
            return ValidationResult::rejected(format!("File in denylist: {}", path));
        }

        let changed = patch.lines_changed();
        if changed > self.max_changed_lines {
            return ValidationResult::rejected(format!(
                "Too many lines changed ({} > {})",
                changed, self.max_changed_lines
            ));
        }

        let review_reasons = review_triggers(patch);
        ValidationResult {
            valid: true,
            reason: String::new(),
            requires_human_review: !review_reasons.is_empty(),
            review_reasons,
        }
    }
}

fn compile(patterns: &[String]) -> QuillResult<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(QuillError::from))
        .collect()
}

/// Bare file-name patterns (`*.tex`) match in any directory; patterns with a
/// separator match the whole relative path.
fn matches(pattern: &Pattern, path: &str) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    if pattern.matches_with(path, options) {
        return true;
    }
    !pattern.as_str().contains('/')
        && path
            .rsplit('/')
            .next()
            .is_some_and(|name| pattern.matches_with(name, options))
}

fn review_triggers(patch: &Patch) -> Vec<String> {
    let mut reasons = Vec::new();

    let deletions = patch.deletions();
    if deletions > LARGE_DELETION_THRESHOLD {
        reasons.push(format!("Large deletion ({} lines)", deletions));
    }

    // Only changed lines count; untouched context mentioning \title is fine.
    let changed: Vec<String> = patch
        .hunks
        .iter()
        .flat_map(|h| &h.lines)
        .filter(|l| !matches!(l, DiffLine::Context(_)))
        .map(|l| l.text().to_lowercase())
        .collect();

    for pattern in SENSITIVE_PATTERNS {
        if changed.iter().any(|line| line.contains(pattern)) {
            reasons.push(format!("Modifies sensitive content: {}", pattern));
        }
    }

    reasons
}
