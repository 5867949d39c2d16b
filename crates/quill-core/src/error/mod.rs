//! Error types for quill
//!
//! Every fallible operation in the crate returns [`QuillResult`]. Variants map
//! onto the failure classes callers need to tell apart:
//! - `MalformedDiff`: diff text could not be parsed
//! - `ApplyConflict`: a hunk's pre-image was not found; the target is untouched
//! - `NotFound`: unknown checkpoint or missing resource
//! - `Storage`: durable checkpoint storage could not be read or written

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{QuillError, QuillResult, UnifiedError};
