//! Core shared types for Ferry.
//!
//! This crate is intentionally small: file identifiers, token spans, the
//! batch edit model every rewriting phase goes through, and a line index used
//! when reporting token positions back to humans.

mod edit;
mod text;

pub use edit::{apply_edits, EditError, EditSet, TokenEdit};
pub use text::{LineCol, LineIndex};

use serde::Serialize;

/// Identifier for a file being migrated.
///
/// The CLI uses the path relative to the migration root; tests use bare names.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A half-open range `[start, end)` of token indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid span: {start}..{end}");
        Self { start, end }
    }

    /// An empty span at `index`, used for insertions.
    pub fn empty(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, index: usize) -> bool {
        self.start <= index && index < self.end
    }
}

impl std::fmt::Display for TokenSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
