//! Lossless PHP lexer.
//!
//! Concatenating the text of the produced tokens always yields the input,
//! including for malformed sources: unterminated constructs are swallowed to
//! the end of the file and reported through [`LexError`].

use smol_str::SmolStr;
use thiserror::Error;

use crate::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// Case-insensitive comparison against a name (PHP identifiers and
    /// keywords are case-insensitive for function and class lookups).
    #[inline]
    pub fn is_word(&self, word: &str) -> bool {
        self.kind.is_name() && self.text.eq_ignore_ascii_case(word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {start}..{end}")]
pub struct LexError {
    pub message: &'static str,
    pub start: usize,
    pub end: usize,
}

/// Lex a complete PHP file (starting in inline-HTML mode).
pub fn lex(text: &str) -> Vec<Token> {
    lex_with_errors(text).0
}

pub fn lex_with_errors(text: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    (tokens, lexer.errors)
}

/// Lex a snippet of PHP code that is not preceded by an open tag.
///
/// Used to build replacement tokens for generated code.
pub fn lex_php_fragment(text: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(text);
    lexer.mode = Mode::Php;
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Html,
    Php,
}

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    mode: Mode,
    last_significant: Option<TokenKind>,
    errors: Vec<LexError>,
}

const THREE_CHAR_OPS: &[(&str, TokenKind)] = &[
    ("?->", TokenKind::NullsafeArrow),
    ("...", TokenKind::Ellipsis),
    ("<=>", TokenKind::Operator),
    ("**=", TokenKind::Operator),
    ("<<=", TokenKind::Operator),
    (">>=", TokenKind::Operator),
    ("===", TokenKind::Operator),
    ("!==", TokenKind::Operator),
    ("??=", TokenKind::Operator),
];

const TWO_CHAR_OPS: &[(&str, TokenKind)] = &[
    ("::", TokenKind::DoubleColon),
    ("->", TokenKind::Arrow),
    ("=>", TokenKind::FatArrow),
    ("#[", TokenKind::AttributeStart),
    ("++", TokenKind::Operator),
    ("--", TokenKind::Operator),
    ("==", TokenKind::Operator),
    ("!=", TokenKind::Operator),
    ("<>", TokenKind::Operator),
    ("<=", TokenKind::Operator),
    (">=", TokenKind::Operator),
    ("&&", TokenKind::Operator),
    ("||", TokenKind::Operator),
    ("??", TokenKind::Operator),
    ("+=", TokenKind::Operator),
    ("-=", TokenKind::Operator),
    ("*=", TokenKind::Operator),
    ("/=", TokenKind::Operator),
    (".=", TokenKind::Operator),
    ("%=", TokenKind::Operator),
    ("&=", TokenKind::Operator),
    ("|=", TokenKind::Operator),
    ("^=", TokenKind::Operator),
    ("<<", TokenKind::Operator),
    (">>", TokenKind::Operator),
    ("**", TokenKind::Operator),
];

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

#[inline]
fn is_php_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            mode: Mode::Html,
            last_significant: None,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        let kind = match self.mode {
            Mode::Html => self.lex_html(),
            Mode::Php => self.lex_php(),
        };
        debug_assert!(self.pos > start, "lexer made no progress at {start}");
        if !kind.is_trivia() {
            self.last_significant = Some(kind);
        }
        Some(Token::new(kind, &self.src[start..self.pos]))
    }

    #[inline]
    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline]
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&mut self, message: &'static str, start: usize) {
        self.errors.push(LexError {
            message,
            start,
            end: self.pos,
        });
    }

    /// Consume a single newline (`\n`, `\r\n` or `\r`) if one is next.
    fn eat_newline(&mut self) -> bool {
        match self.peek(0) {
            Some(b'\r') => {
                self.pos += if self.peek(1) == Some(b'\n') { 2 } else { 1 };
                true
            }
            Some(b'\n') => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn lex_html(&mut self) -> TokenKind {
        let mut search = self.pos;
        while let Some(rel) = self.src[search..].find("<?") {
            let at = search + rel;
            let after = &self.bytes[at + 2..];
            let is_php = after.len() >= 3
                && after[..3].eq_ignore_ascii_case(b"php")
                && after.get(3).map_or(true, |b| is_php_whitespace(*b));
            let is_echo = after.first() == Some(&b'=');
            if is_php || is_echo {
                if at > self.pos {
                    self.pos = at;
                    return TokenKind::InlineHtml;
                }
                self.mode = Mode::Php;
                if is_echo {
                    self.pos = at + 3;
                    return TokenKind::OpenTagWithEcho;
                }
                self.pos = at + 5;
                if !self.eat_newline() && self.peek(0).is_some_and(is_php_whitespace) {
                    self.pos += 1;
                }
                return TokenKind::OpenTag;
            }
            search = at + 2;
        }
        self.pos = self.bytes.len();
        TokenKind::InlineHtml
    }

    fn lex_php(&mut self) -> TokenKind {
        let start = self.pos;
        let b = self.bytes[self.pos];

        if is_php_whitespace(b) {
            while self.peek(0).is_some_and(is_php_whitespace) {
                self.pos += 1;
            }
            return TokenKind::Whitespace;
        }

        let rest = self.rest();
        if rest.starts_with("?>") {
            self.pos += 2;
            self.eat_newline();
            self.mode = Mode::Html;
            return TokenKind::CloseTag;
        }
        if rest.starts_with("//") || (b == b'#' && self.peek(1) != Some(b'[')) {
            return self.lex_line_comment();
        }
        if rest.starts_with("/*") {
            return self.lex_block_comment(start);
        }
        if b == b'$' {
            if self.peek(1).is_some_and(is_ident_start) {
                self.pos += 1;
                self.eat_ident();
                return TokenKind::Variable;
            }
            self.pos += 1;
            return TokenKind::Dollar;
        }
        if is_ident_start(b) || (b == b'\\' && self.peek(1).is_some_and(is_ident_start)) {
            return self.lex_name(start);
        }
        if b.is_ascii_digit() || (b == b'.' && self.peek(1).is_some_and(|c| c.is_ascii_digit())) {
            return self.lex_number();
        }
        match b {
            b'\'' => return self.lex_single_quoted(start),
            b'"' | b'`' => return self.lex_interpolated(start, b),
            _ => {}
        }
        if rest.starts_with("<<<") {
            if let Some(kind) = self.lex_heredoc(start) {
                return kind;
            }
        }

        for (op, kind) in THREE_CHAR_OPS.iter().chain(TWO_CHAR_OPS) {
            if rest.starts_with(op) {
                self.pos += op.len();
                return *kind;
            }
        }

        let kind = match b {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b';' => TokenKind::Semicolon,
            b',' => TokenKind::Comma,
            b'=' => TokenKind::Eq,
            b'?' => TokenKind::Question,
            b':' => TokenKind::Colon,
            b'.' => TokenKind::Dot,
            b'&' => TokenKind::Amp,
            b'@' => TokenKind::At,
            b'+' | b'-' | b'*' | b'/' | b'%' | b'!' | b'<' | b'>' | b'|' | b'^' | b'~'
            | b'\\' => TokenKind::Operator,
            _ => {
                let len = rest.chars().next().map_or(1, char::len_utf8);
                self.pos += len;
                self.error("unexpected character", start);
                return TokenKind::Error;
            }
        };
        self.pos += 1;
        kind
    }

    fn eat_ident(&mut self) {
        while self.peek(0).is_some_and(is_ident_continue) {
            self.pos += 1;
        }
    }

    fn lex_name(&mut self, start: usize) -> TokenKind {
        let mut qualified = false;
        if self.bytes[self.pos] == b'\\' {
            qualified = true;
            self.pos += 1;
        }
        self.eat_ident();
        while self.peek(0) == Some(b'\\') && self.peek(1).is_some_and(is_ident_start) {
            qualified = true;
            self.pos += 1;
            self.eat_ident();
        }
        if qualified {
            return TokenKind::QualifiedName;
        }

        let word = &self.src[start..self.pos];
        // Member names after `->` / `::` and declared function or constant
        // names may reuse reserved words; only `::class` stays a keyword.
        let keyword_allowed = match self.last_significant {
            Some(TokenKind::Arrow | TokenKind::NullsafeArrow) => false,
            Some(TokenKind::DoubleColon) => word.eq_ignore_ascii_case("class"),
            Some(TokenKind::FunctionKw | TokenKind::ConstKw) => false,
            _ => true,
        };
        if keyword_allowed {
            if let Some(kind) = TokenKind::keyword(word) {
                return kind;
            }
        }
        TokenKind::Identifier
    }

    fn lex_number(&mut self) -> TokenKind {
        let rest = self.rest().as_bytes();
        if rest.len() > 1 && rest[0] == b'0' && matches!(rest[1], b'x' | b'X' | b'b' | b'B' | b'o' | b'O') {
            self.pos += 2;
            while self.peek(0).is_some_and(|c| c.is_ascii_hexdigit() || c == b'_') {
                self.pos += 1;
            }
            return TokenKind::Number;
        }

        let eat_digits = |lexer: &mut Self| {
            while lexer.peek(0).is_some_and(|c| c.is_ascii_digit() || c == b'_') {
                lexer.pos += 1;
            }
        };
        eat_digits(self);
        if self.peek(0) == Some(b'.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            eat_digits(self);
        } else if self.peek(0) == Some(b'.') && self.peek(1) != Some(b'.') {
            // `1.` is a float; `1..2` is not.
            self.pos += 1;
        }
        if matches!(self.peek(0), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek(1), Some(b'+' | b'-')));
            if self.peek(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1 + sign;
                eat_digits(self);
            }
        }
        TokenKind::Number
    }

    fn lex_line_comment(&mut self) -> TokenKind {
        while let Some(c) = self.peek(0) {
            if c == b'\n' || c == b'\r' || (c == b'?' && self.peek(1) == Some(b'>')) {
                break;
            }
            self.pos += 1;
        }
        TokenKind::Comment
    }

    fn lex_block_comment(&mut self, start: usize) -> TokenKind {
        let is_doc = self.rest().starts_with("/**") && self.peek(3).is_some_and(is_php_whitespace);
        match self.src[self.pos + 2..].find("*/") {
            Some(rel) => self.pos += 2 + rel + 2,
            None => {
                self.pos = self.bytes.len();
                self.error("unterminated block comment", start);
            }
        }
        if is_doc {
            TokenKind::DocComment
        } else {
            TokenKind::Comment
        }
    }

    fn lex_single_quoted(&mut self, start: usize) -> TokenKind {
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            match c {
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                b'\'' => {
                    self.pos += 1;
                    return TokenKind::StringLiteral;
                }
                _ => self.pos += 1,
            }
        }
        self.error("unterminated string literal", start);
        TokenKind::StringLiteral
    }

    /// Double-quoted and backtick strings. `{$expr}` interpolations may
    /// contain nested quotes, so they are skipped with brace tracking.
    fn lex_interpolated(&mut self, start: usize, quote: u8) -> TokenKind {
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            if c == b'\\' {
                self.pos = (self.pos + 2).min(self.bytes.len());
            } else if c == quote {
                self.pos += 1;
                return TokenKind::StringLiteral;
            } else if c == b'{' && self.peek(1) == Some(b'$') {
                self.pos += 1;
                self.skip_interpolation();
            } else {
                self.pos += 1;
            }
        }
        self.error("unterminated string literal", start);
        TokenKind::StringLiteral
    }

    fn skip_interpolation(&mut self) {
        let mut depth = 1usize;
        while let Some(c) = self.peek(0) {
            match c {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return;
                    }
                }
                b'\'' | b'"' => {
                    let inner_start = self.pos;
                    if c == b'\'' {
                        self.lex_single_quoted(inner_start);
                    } else {
                        self.lex_interpolated(inner_start, c);
                    }
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn lex_heredoc(&mut self, start: usize) -> Option<TokenKind> {
        let bytes = self.bytes;
        let mut i = self.pos + 3;
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        let quote = match bytes.get(i) {
            Some(q @ (b'\'' | b'"')) => {
                i += 1;
                Some(*q)
            }
            _ => None,
        };
        let label_start = i;
        if !bytes.get(i).copied().is_some_and(is_ident_start) {
            return None;
        }
        while bytes.get(i).copied().is_some_and(is_ident_continue) {
            i += 1;
        }
        let label = &self.src[label_start..i];
        if let Some(q) = quote {
            if bytes.get(i) != Some(&q) {
                return None;
            }
            i += 1;
        }
        match bytes.get(i) {
            Some(b'\n') => i += 1,
            Some(b'\r') => i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 },
            _ => return None,
        }

        let mut line_start = i;
        loop {
            let mut k = line_start;
            while matches!(bytes.get(k), Some(b' ' | b'\t')) {
                k += 1;
            }
            if self.src[k..].starts_with(label)
                && !bytes.get(k + label.len()).copied().is_some_and(is_ident_continue)
            {
                self.pos = k + label.len();
                return Some(TokenKind::Heredoc);
            }
            match self.src[line_start..].find('\n') {
                Some(rel) => line_start += rel + 1,
                None => break,
            }
        }

        self.pos = bytes.len();
        self.error("unterminated heredoc", start);
        Some(TokenKind::Heredoc)
    }
}
