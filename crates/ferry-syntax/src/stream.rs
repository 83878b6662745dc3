use ferry_core::{apply_edits, EditError, EditSet};

use crate::{lex, Token, TokenKind};

/// The ordered tokens of one PHP file.
///
/// A stream is never edited in place. Edits are collected into an
/// [`EditSet`] against the current indices and [`TokenStream::apply`]
/// produces a new stream, so indices are always `0..len` and never refer to
/// a previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn from_source(text: &str) -> Self {
        Self::new(lex(text))
    }

    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    #[inline]
    pub fn kind(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.kind)
    }

    /// Text of the token at `index`, or `""` past the end.
    #[inline]
    pub fn text(&self, index: usize) -> &str {
        self.tokens.get(index).map_or("", Token::text)
    }

    /// Concatenated text of the tokens in `[start, end)`.
    pub fn text_of(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        let start = start.min(end);
        self.tokens[start..end].iter().map(Token::text).collect()
    }

    pub fn render(&self) -> String {
        self.text_of(0, self.tokens.len())
    }

    /// Byte offset of the token at `index` in the rendered text.
    pub fn byte_offset(&self, index: usize) -> usize {
        self.tokens
            .iter()
            .take(index)
            .map(|t| t.text.len())
            .sum()
    }

    /// First index at or after `from` holding a token of `kind`.
    pub fn next_index_of_kind(&self, from: usize, kind: TokenKind) -> Option<usize> {
        self.tokens
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(idx, t)| (t.kind == kind).then_some(idx))
    }

    /// First non-trivia index at or after `from`.
    pub fn next_significant(&self, from: usize) -> Option<usize> {
        self.tokens
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(idx, t)| (!t.is_trivia()).then_some(idx))
    }

    /// Last non-trivia index strictly before `before`.
    pub fn prev_significant(&self, before: usize) -> Option<usize> {
        let before = before.min(self.tokens.len());
        self.tokens[..before]
            .iter()
            .rposition(|t| !t.is_trivia())
    }

    /// Index of the bracket closing the one at `open`.
    ///
    /// Returns `None` when `open` is not an opening bracket, when the brackets
    /// in between are mismatched, or when the file ends first.
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        let first = self.kind(open)?.closing_bracket()?;
        let mut expected = vec![first];
        for (idx, token) in self.tokens.iter().enumerate().skip(open + 1) {
            if let Some(close) = token.kind.closing_bracket() {
                expected.push(close);
            } else if token.kind.is_closing_bracket() {
                if expected.pop() != Some(token.kind) {
                    return None;
                }
                if expected.is_empty() {
                    return Some(idx);
                }
            }
        }
        None
    }

    /// Returns `true` when every bracket is closed by its counterpart.
    pub fn is_balanced(&self) -> bool {
        let mut expected = Vec::new();
        for token in &self.tokens {
            if let Some(close) = token.kind.closing_bracket() {
                expected.push(close);
            } else if token.kind.is_closing_bracket() && expected.pop() != Some(token.kind) {
                return false;
            }
        }
        expected.is_empty()
    }

    /// Apply a batch of edits expressed against this stream's indices.
    pub fn apply(&self, edits: EditSet<Token>) -> Result<TokenStream, EditError> {
        apply_edits(&self.tokens, edits).map(TokenStream::new)
    }

    /// Re-lex the rendered text into a canonical stream.
    ///
    /// Replacement tokens are built from fragments and may not be split the
    /// way the lexer would split them in context; refreshing restores the
    /// canonical tokenization.
    pub fn refresh(&self) -> TokenStream {
        TokenStream::from_source(&self.render())
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}
