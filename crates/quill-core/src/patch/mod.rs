//! Unified diff patches
//!
//! - [`parse`] turns one file's diff text into a [`Patch`]
//! - [`extract`] finds every diff embedded in a model response
//! - [`apply`] patches file content in memory with fuzzy hunk matching
//! - [`PatchValidator`] enforces path and size limits before anything is applied
//! - [`ProjectPatcher`] applies patches to files under a project root

pub mod applier;
pub mod extractor;
pub mod parser;
pub mod project;
pub mod types;
pub mod validator;

pub use applier::{DEFAULT_FUZZ_WINDOW, MatchPolicy, WhitespaceMode, apply, apply_with_policy};
pub use extractor::{Extraction, RejectedBlock, extract, extract_all};
pub use parser::parse;
pub use project::{AppliedPatch, ProjectPatcher, resolve_in_root};
pub use types::{DiffLine, FileChange, Hunk, Patch};
pub use validator::{LARGE_DELETION_THRESHOLD, PatchValidator, ValidationResult};
