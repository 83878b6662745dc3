use serde::Serialize;

/// Lexical category of a PHP token.
///
/// The set is closed: every byte of a source file ends up in exactly one
/// token of one of these kinds (`Error` covers bytes the lexer does not
/// understand), which is what keeps rendering lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TokenKind {
    // Trivia
    Whitespace,
    Comment,
    DocComment,

    // Mode switches
    InlineHtml,
    OpenTag,
    OpenTagWithEcho,
    CloseTag,

    // Names
    Variable,
    Identifier,
    /// `Foo\Bar`, `\Foo\Bar`, `namespace\Foo`.
    QualifiedName,

    // Literals
    StringLiteral,
    Heredoc,
    Number,

    // Keywords
    AbstractKw,
    AndKw,
    ArrayKw,
    AsKw,
    BreakKw,
    CallableKw,
    CaseKw,
    CatchKw,
    ClassKw,
    CloneKw,
    ConstKw,
    ContinueKw,
    DeclareKw,
    DefaultKw,
    DoKw,
    EchoKw,
    ElseKw,
    ElseifKw,
    EmptyKw,
    EvalKw,
    ExitKw,
    ExtendsKw,
    FinalKw,
    FinallyKw,
    FnKw,
    ForKw,
    ForeachKw,
    FunctionKw,
    GlobalKw,
    GotoKw,
    IfKw,
    ImplementsKw,
    IncludeKw,
    IncludeOnceKw,
    InstanceofKw,
    InsteadofKw,
    InterfaceKw,
    IssetKw,
    ListKw,
    MatchKw,
    NamespaceKw,
    NewKw,
    OrKw,
    PrintKw,
    PrivateKw,
    ProtectedKw,
    PublicKw,
    ReadonlyKw,
    RequireKw,
    RequireOnceKw,
    ReturnKw,
    StaticKw,
    SwitchKw,
    ThrowKw,
    TraitKw,
    TryKw,
    UnsetKw,
    UseKw,
    VarKw,
    WhileKw,
    XorKw,
    YieldKw,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Eq,
    DoubleColon,
    Arrow,
    NullsafeArrow,
    FatArrow,
    Ellipsis,
    Question,
    Colon,
    Dot,
    Amp,
    At,
    Dollar,
    /// `#[`
    AttributeStart,
    /// Any other operator (`+`, `===`, `??=`, ...).
    Operator,

    Error,
}

impl TokenKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
        )
    }

    #[inline]
    pub fn is_keyword(self) -> bool {
        self >= TokenKind::AbstractKw && self <= TokenKind::YieldKw
    }

    #[inline]
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::StringLiteral | TokenKind::Heredoc | TokenKind::Number
        )
    }

    /// Returns `true` for kinds that can name a class in a type position.
    #[inline]
    pub fn is_name(self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::QualifiedName)
    }

    #[inline]
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::PublicKw
                | TokenKind::ProtectedKw
                | TokenKind::PrivateKw
                | TokenKind::StaticKw
                | TokenKind::AbstractKw
                | TokenKind::FinalKw
                | TokenKind::ReadonlyKw
                | TokenKind::VarKw
        )
    }

    /// The closing counterpart of an opening bracket kind.
    #[inline]
    pub fn closing_bracket(self) -> Option<TokenKind> {
        match self {
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBrace => Some(TokenKind::RBrace),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            TokenKind::AttributeStart => Some(TokenKind::RBracket),
            _ => None,
        }
    }

    #[inline]
    pub fn is_closing_bracket(self) -> bool {
        matches!(
            self,
            TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket
        )
    }

    /// Keyword kind for a bare word, compared ASCII case-insensitively.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        if word.len() > 12 {
            return None;
        }
        let lower = word.to_ascii_lowercase();
        let kind = match lower.as_str() {
            "abstract" => TokenKind::AbstractKw,
            "and" => TokenKind::AndKw,
            "array" => TokenKind::ArrayKw,
            "as" => TokenKind::AsKw,
            "break" => TokenKind::BreakKw,
            "callable" => TokenKind::CallableKw,
            "case" => TokenKind::CaseKw,
            "catch" => TokenKind::CatchKw,
            "class" => TokenKind::ClassKw,
            "clone" => TokenKind::CloneKw,
            "const" => TokenKind::ConstKw,
            "continue" => TokenKind::ContinueKw,
            "declare" => TokenKind::DeclareKw,
            "default" => TokenKind::DefaultKw,
            "do" => TokenKind::DoKw,
            "echo" => TokenKind::EchoKw,
            "else" => TokenKind::ElseKw,
            "elseif" => TokenKind::ElseifKw,
            "empty" => TokenKind::EmptyKw,
            "eval" => TokenKind::EvalKw,
            "exit" | "die" => TokenKind::ExitKw,
            "extends" => TokenKind::ExtendsKw,
            "final" => TokenKind::FinalKw,
            "finally" => TokenKind::FinallyKw,
            "fn" => TokenKind::FnKw,
            "for" => TokenKind::ForKw,
            "foreach" => TokenKind::ForeachKw,
            "function" => TokenKind::FunctionKw,
            "global" => TokenKind::GlobalKw,
            "goto" => TokenKind::GotoKw,
            "if" => TokenKind::IfKw,
            "implements" => TokenKind::ImplementsKw,
            "include" => TokenKind::IncludeKw,
            "include_once" => TokenKind::IncludeOnceKw,
            "instanceof" => TokenKind::InstanceofKw,
            "insteadof" => TokenKind::InsteadofKw,
            "interface" => TokenKind::InterfaceKw,
            "isset" => TokenKind::IssetKw,
            "list" => TokenKind::ListKw,
            "match" => TokenKind::MatchKw,
            "namespace" => TokenKind::NamespaceKw,
            "new" => TokenKind::NewKw,
            "or" => TokenKind::OrKw,
            "print" => TokenKind::PrintKw,
            "private" => TokenKind::PrivateKw,
            "protected" => TokenKind::ProtectedKw,
            "public" => TokenKind::PublicKw,
            "readonly" => TokenKind::ReadonlyKw,
            "require" => TokenKind::RequireKw,
            "require_once" => TokenKind::RequireOnceKw,
            "return" => TokenKind::ReturnKw,
            "static" => TokenKind::StaticKw,
            "switch" => TokenKind::SwitchKw,
            "throw" => TokenKind::ThrowKw,
            "trait" => TokenKind::TraitKw,
            "try" => TokenKind::TryKw,
            "unset" => TokenKind::UnsetKw,
            "use" => TokenKind::UseKw,
            "var" => TokenKind::VarKw,
            "while" => TokenKind::WhileKw,
            "xor" => TokenKind::XorKw,
            "yield" => TokenKind::YieldKw,
            _ => return None,
        };
        Some(kind)
    }
}
