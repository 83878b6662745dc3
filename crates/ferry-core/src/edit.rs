use thiserror::Error;

use crate::TokenSpan;

/// A single replacement of a token span.
///
/// An empty span is an insertion before the token at `span.start`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenEdit<T> {
    pub span: TokenSpan,
    pub replacement: Vec<T>,
}

impl<T> TokenEdit<T> {
    pub fn replace(span: TokenSpan, replacement: Vec<T>) -> Self {
        Self { span, replacement }
    }

    pub fn insert(index: usize, replacement: Vec<T>) -> Self {
        Self {
            span: TokenSpan::empty(index),
            replacement,
        }
    }

    pub fn delete(span: TokenSpan) -> Self {
        Self {
            span,
            replacement: Vec::new(),
        }
    }
}

/// A batch of edits expressed against one snapshot of a token sequence.
///
/// Every span refers to indices of the same snapshot; the whole set is
/// applied in a single pass so no edit ever observes indices shifted by
/// another one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSet<T> {
    edits: Vec<TokenEdit<T>>,
}

impl<T> Default for EditSet<T> {
    fn default() -> Self {
        Self { edits: Vec::new() }
    }
}

impl<T> EditSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: TokenEdit<T>) {
        self.edits.push(edit);
    }

    pub fn extend(&mut self, edits: impl IntoIterator<Item = TokenEdit<T>>) {
        self.edits.extend(edits);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[TokenEdit<T>] {
        &self.edits
    }

    /// Sort edits, merge insertions at the same index and validate bounds and
    /// non-overlap against a sequence of `len` items.
    ///
    /// Sorting is stable, so insertions at the same index keep the order in
    /// which they were pushed.
    pub fn normalize(&mut self, len: usize) -> Result<(), EditError> {
        self.edits.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then_with(|| a.span.end.cmp(&b.span.end))
        });

        for edit in &self.edits {
            if edit.span.start > edit.span.end || edit.span.end > len {
                return Err(EditError::OutOfBounds {
                    span: edit.span,
                    len,
                });
            }
        }

        let mut merged: Vec<TokenEdit<T>> = Vec::with_capacity(self.edits.len());
        for edit in self.edits.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.span.is_empty() && last.span == edit.span {
                    last.replacement.extend(edit.replacement);
                    continue;
                }
                if edit.span.start < last.span.end {
                    return Err(EditError::OverlappingEdits {
                        first: last.span,
                        second: edit.span,
                    });
                }
            }
            merged.push(edit);
        }
        self.edits = merged;

        Ok(())
    }
}

impl<T> IntoIterator for EditSet<T> {
    type Item = TokenEdit<T>;
    type IntoIter = std::vec::IntoIter<TokenEdit<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit span {span} is out of bounds for {len} tokens")]
    OutOfBounds { span: TokenSpan, len: usize },
    #[error("overlapping edits: {first} overlaps {second}")]
    OverlappingEdits { first: TokenSpan, second: TokenSpan },
}

/// Apply `edits` to `items` and return the edited sequence.
///
/// The edits are normalized first; the result is built front to back in one
/// pass so every span is interpreted against the original indices.
pub fn apply_edits<T: Clone>(items: &[T], mut edits: EditSet<T>) -> Result<Vec<T>, EditError> {
    if edits.is_empty() {
        return Ok(items.to_vec());
    }
    edits.normalize(items.len())?;

    let growth: usize = edits.edits.iter().map(|e| e.replacement.len()).sum();
    let mut out = Vec::with_capacity(items.len() + growth);
    let mut cursor = 0usize;
    for edit in edits {
        out.extend_from_slice(&items[cursor..edit.span.start]);
        out.extend(edit.replacement);
        cursor = edit.span.end;
    }
    out.extend_from_slice(&items[cursor..]);

    Ok(out)
}
