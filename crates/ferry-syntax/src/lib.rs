//! PHP tokens and token streams.
//!
//! - [`lex`] / [`lex_with_errors`]: lossless tokenization of a whole file.
//! - [`lex_php_fragment`]: tokenization of generated code snippets.
//! - [`TokenStream`]: scanning utilities, batch edits and `refresh`.

mod lexer;
mod stream;
mod token_kind;

pub use lexer::{lex, lex_php_fragment, lex_with_errors, LexError, Lexer, Token};
pub use stream::TokenStream;
pub use token_kind::TokenKind;

#[cfg(test)]
mod tests;
