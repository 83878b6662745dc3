use ferry_core::{TokenEdit, TokenSpan};
use ferry_syntax::{lex_php_fragment, Token};
use serde::Serialize;

use crate::MagePattern;

/// A collaborator the enclosing class must receive through its constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiVariable {
    /// Variable name without the leading `$`.
    pub name: String,
    /// Fully-qualified type, with a leading `\`.
    #[serde(rename = "type")]
    pub ty: String,
}

impl DiVariable {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingEdit {
    span: TokenSpan,
    text: String,
}

/// One recognized `Mage::` call.
///
/// `span` covers the whole legacy call. `head_end` is where scanning resumes:
/// the end of the part that is replaced wholesale, so that nested legacy calls
/// in the arguments are still visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedInvocation {
    pub pattern: MagePattern,
    pub span: TokenSpan,
    pub head_end: usize,
    pub legacy_symbol: String,
    pub resolved_type: String,
    pub di_variable: Option<DiVariable>,
    edits: Vec<PendingEdit>,
}

impl MatchedInvocation {
    pub(crate) fn new(
        pattern: MagePattern,
        span: TokenSpan,
        head_end: usize,
        legacy_symbol: String,
        resolved_type: impl Into<String>,
    ) -> Self {
        Self {
            pattern,
            span,
            head_end,
            legacy_symbol,
            resolved_type: resolved_type.into(),
            di_variable: None,
            edits: Vec::new(),
        }
    }

    pub(crate) fn with_di_variable(mut self, variable: DiVariable) -> Self {
        self.di_variable = Some(variable);
        self
    }

    pub(crate) fn replace(mut self, span: TokenSpan, text: impl Into<String>) -> Self {
        debug_assert!(self.span.start <= span.start && span.end <= self.span.end);
        self.edits.push(PendingEdit {
            span,
            text: text.into(),
        });
        self
    }

    pub(crate) fn insert(self, at: usize, text: impl Into<String>) -> Self {
        self.replace(TokenSpan::empty(at), text)
    }

    /// Source text replacing the head of the call.
    pub fn modern_form(&self) -> &str {
        self.edits.first().map_or("", |edit| edit.text.as_str())
    }

    /// The token edits that turn this call into its M2 form.
    ///
    /// Every edit lies inside [`MatchedInvocation::span`]; the caller applies
    /// them together with the edits of the other matches of the file.
    pub fn convert_to_m2(&self) -> Vec<TokenEdit<Token>> {
        self.edits
            .iter()
            .map(|edit| TokenEdit::replace(edit.span, lex_php_fragment(&edit.text)))
            .collect()
    }
}
