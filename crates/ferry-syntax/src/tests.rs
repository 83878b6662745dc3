use ferry_core::{EditSet, TokenEdit, TokenSpan};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{lex, lex_php_fragment, lex_with_errors, Token, TokenKind, TokenStream};

fn dump_tokens(input: &str) -> Vec<(TokenKind, String)> {
    lex(input)
        .into_iter()
        .map(|t| (t.kind, t.text.to_string()))
        .collect()
}

fn dump_non_trivia(input: &str) -> Vec<(TokenKind, String)> {
    lex(input)
        .into_iter()
        .filter(|t| !t.is_trivia())
        .map(|t| (t.kind, t.text.to_string()))
        .collect()
}

fn render(tokens: &[Token]) -> String {
    tokens.iter().map(Token::text).collect()
}

#[test]
fn lexer_class_declaration() {
    let tokens = dump_tokens("<?php\nclass A {}");
    let expected = vec![
        (TokenKind::OpenTag, "<?php\n".into()),
        (TokenKind::ClassKw, "class".into()),
        (TokenKind::Whitespace, " ".into()),
        (TokenKind::Identifier, "A".into()),
        (TokenKind::Whitespace, " ".into()),
        (TokenKind::LBrace, "{".into()),
        (TokenKind::RBrace, "}".into()),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn lexer_static_call_with_string_argument() {
    let tokens = dump_tokens("<?php $m = Mage::getModel('catalog/product');");
    let expected = vec![
        (TokenKind::OpenTag, "<?php ".into()),
        (TokenKind::Variable, "$m".into()),
        (TokenKind::Whitespace, " ".into()),
        (TokenKind::Eq, "=".into()),
        (TokenKind::Whitespace, " ".into()),
        (TokenKind::Identifier, "Mage".into()),
        (TokenKind::DoubleColon, "::".into()),
        (TokenKind::Identifier, "getModel".into()),
        (TokenKind::LParen, "(".into()),
        (TokenKind::StringLiteral, "'catalog/product'".into()),
        (TokenKind::RParen, ")".into()),
        (TokenKind::Semicolon, ";".into()),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn lexer_inline_html_and_echo_tags() {
    let tokens = dump_tokens("<p><?= $x ?>\n</p>");
    let expected = vec![
        (TokenKind::InlineHtml, "<p>".into()),
        (TokenKind::OpenTagWithEcho, "<?=".into()),
        (TokenKind::Whitespace, " ".into()),
        (TokenKind::Variable, "$x".into()),
        (TokenKind::Whitespace, " ".into()),
        (TokenKind::CloseTag, "?>\n".into()),
        (TokenKind::InlineHtml, "</p>".into()),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn lexer_reserved_words_as_member_names() {
    let tokens = dump_non_trivia("<?php $a->list; Foo::class; Foo::new(); function print() {}");
    let expected = vec![
        (TokenKind::OpenTag, "<?php ".into()),
        (TokenKind::Variable, "$a".into()),
        (TokenKind::Arrow, "->".into()),
        (TokenKind::Identifier, "list".into()),
        (TokenKind::Semicolon, ";".into()),
        (TokenKind::Identifier, "Foo".into()),
        (TokenKind::DoubleColon, "::".into()),
        (TokenKind::ClassKw, "class".into()),
        (TokenKind::Semicolon, ";".into()),
        (TokenKind::Identifier, "Foo".into()),
        (TokenKind::DoubleColon, "::".into()),
        (TokenKind::Identifier, "new".into()),
        (TokenKind::LParen, "(".into()),
        (TokenKind::RParen, ")".into()),
        (TokenKind::Semicolon, ";".into()),
        (TokenKind::FunctionKw, "function".into()),
        (TokenKind::Identifier, "print".into()),
        (TokenKind::LParen, "(".into()),
        (TokenKind::RParen, ")".into()),
        (TokenKind::LBrace, "{".into()),
        (TokenKind::RBrace, "}".into()),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn lexer_keywords_are_case_insensitive() {
    let tokens = dump_non_trivia("<?php ABSTRACT Class Foo EXTENDS Bar");
    let kinds: Vec<_> = tokens.into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::OpenTag,
            TokenKind::AbstractKw,
            TokenKind::ClassKw,
            TokenKind::Identifier,
            TokenKind::ExtendsKw,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn lexer_qualified_names_are_single_tokens() {
    let tokens = dump_non_trivia("<?php new \\Magento\\Catalog\\Model\\Product(); use Foo\\Bar;");
    let expected = vec![
        (TokenKind::OpenTag, "<?php ".into()),
        (TokenKind::NewKw, "new".into()),
        (
            TokenKind::QualifiedName,
            "\\Magento\\Catalog\\Model\\Product".into(),
        ),
        (TokenKind::LParen, "(".into()),
        (TokenKind::RParen, ")".into()),
        (TokenKind::Semicolon, ";".into()),
        (TokenKind::UseKw, "use".into()),
        (TokenKind::QualifiedName, "Foo\\Bar".into()),
        (TokenKind::Semicolon, ";".into()),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn lexer_heredoc_runs_to_its_label() {
    let input = "<?php $s = <<<EOT\nHello \"{$name}\" }\nEOT;\n";
    let tokens = dump_non_trivia(input);
    assert_eq!(
        tokens[3],
        (
            TokenKind::Heredoc,
            "<<<EOT\nHello \"{$name}\" }\nEOT".into()
        )
    );
    assert_eq!(tokens[4], (TokenKind::Semicolon, ";".into()));
}

#[test]
fn lexer_nowdoc_with_indented_terminator() {
    let input = "<?php $s = <<<'SQL'\n    SELECT 1;\n    SQL;";
    let tokens = dump_non_trivia(input);
    assert_eq!(
        tokens[3],
        (
            TokenKind::Heredoc,
            "<<<'SQL'\n    SELECT 1;\n    SQL".into()
        )
    );
}

#[test]
fn lexer_interpolation_may_contain_nested_quotes() {
    let tokens = dump_non_trivia("<?php echo \"a {$x[\"k\"]} b\";");
    assert_eq!(
        tokens,
        vec![
            (TokenKind::OpenTag, "<?php ".into()),
            (TokenKind::EchoKw, "echo".into()),
            (TokenKind::StringLiteral, "\"a {$x[\"k\"]} b\"".into()),
            (TokenKind::Semicolon, ";".into()),
        ]
    );
}

#[test]
fn lexer_comments_and_doc_comments() {
    let tokens = dump_tokens("<?php /** @var int */ /**/ # hash\n// line ?>x");
    let expected = vec![
        (TokenKind::OpenTag, "<?php ".into()),
        (TokenKind::DocComment, "/** @var int */".into()),
        (TokenKind::Whitespace, " ".into()),
        (TokenKind::Comment, "/**/".into()),
        (TokenKind::Whitespace, " ".into()),
        (TokenKind::Comment, "# hash".into()),
        (TokenKind::Whitespace, "\n".into()),
        (TokenKind::Comment, "// line ".into()),
        (TokenKind::CloseTag, "?>".into()),
        (TokenKind::InlineHtml, "x".into()),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn lexer_attributes_are_not_comments() {
    let tokens = dump_non_trivia("<?php #[Inject] class A {}");
    assert_eq!(tokens[1], (TokenKind::AttributeStart, "#[".into()));
    assert_eq!(tokens[3], (TokenKind::RBracket, "]".into()));
    assert_eq!(tokens[4], (TokenKind::ClassKw, "class".into()));
}

#[test]
fn lexer_operators_use_longest_match() {
    let tokens = dump_non_trivia("<?php $a?->b ?? $c <=> $d => ... ::");
    assert_eq!(
        tokens[1..].to_vec(),
        vec![
            (TokenKind::Variable, "$a".to_string()),
            (TokenKind::NullsafeArrow, "?->".to_string()),
            (TokenKind::Identifier, "b".to_string()),
            (TokenKind::Operator, "??".to_string()),
            (TokenKind::Variable, "$c".to_string()),
            (TokenKind::Operator, "<=>".to_string()),
            (TokenKind::Variable, "$d".to_string()),
            (TokenKind::FatArrow, "=>".to_string()),
            (TokenKind::Ellipsis, "...".to_string()),
            (TokenKind::DoubleColon, "::".to_string()),
        ]
    );
}

#[test]
fn lexer_reports_unterminated_constructs_and_stays_lossless() {
    for input in [
        "<?php $a = 'abc",
        "<?php $a = \"abc {$x",
        "<?php /* open",
        "<?php $s = <<<EOT\nno end",
    ] {
        let (tokens, errors) = lex_with_errors(input);
        assert_eq!(errors.len(), 1, "expected one error for {input:?}");
        assert_eq!(render(&tokens), input);
    }
}

#[test]
fn lexer_unknown_characters_become_error_tokens() {
    let (tokens, errors) = lex_with_errors("<?php \u{7f}");
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Error));
    assert_eq!(errors.len(), 1);
}

#[test]
fn fragments_start_in_php_mode() {
    let tokens = lex_php_fragment("$this->x->create()");
    assert_eq!(tokens[0].kind, TokenKind::Variable);
    assert_eq!(tokens[1].kind, TokenKind::Arrow);
    assert_eq!(render(&tokens), "$this->x->create()");
}

#[test]
fn stream_scans_by_kind_and_significance() {
    let stream = TokenStream::from_source("<?php\n/** doc */\nclass A { }");
    let class_kw = stream.next_index_of_kind(0, TokenKind::ClassKw).unwrap();
    assert_eq!(stream.text(class_kw), "class");
    assert_eq!(stream.next_index_of_kind(class_kw + 1, TokenKind::ClassKw), None);

    let name = stream.next_significant(class_kw + 1).unwrap();
    assert_eq!(stream.text(name), "A");
    assert_eq!(stream.prev_significant(name), Some(class_kw));
    assert_eq!(stream.prev_significant(class_kw), Some(0));
}

#[test]
fn stream_matches_brackets() {
    let stream = TokenStream::from_source("<?php f(a[1], {b}) ]");
    let open = stream.next_index_of_kind(0, TokenKind::LParen).unwrap();
    let close = stream.matching_close(open).unwrap();
    assert_eq!(stream.kind(close), Some(TokenKind::RParen));
    assert_eq!(stream.text_of(open, close + 1), "(a[1], {b})");
    assert!(!stream.is_balanced());

    let mismatched = TokenStream::from_source("<?php f(a]");
    let open = mismatched.next_index_of_kind(0, TokenKind::LParen).unwrap();
    assert_eq!(mismatched.matching_close(open), None);
}

#[test]
fn stream_apply_then_refresh_renumbers() {
    let stream = TokenStream::from_source("<?php foo(1);");
    let callee = stream.next_index_of_kind(0, TokenKind::Identifier).unwrap();

    let mut edits = EditSet::new();
    edits.push(TokenEdit::replace(
        TokenSpan::new(callee, callee + 1),
        lex_php_fragment("$this->bar->baz"),
    ));
    let edited = stream.apply(edits).unwrap();
    assert_eq!(edited.render(), "<?php $this->bar->baz(1);");

    let refreshed = edited.refresh();
    assert_eq!(refreshed.render(), edited.render());
    assert_eq!(refreshed, TokenStream::from_source("<?php $this->bar->baz(1);"));
    assert_eq!(stream.byte_offset(callee), 6);
}

proptest! {
    #[test]
    fn lexing_is_lossless(input in "[<?phpclasMg$'\"{}()\\[\\]\\\\/*#=:;\\-> \n\ta-z0-9]{0,80}") {
        let (tokens, _errors) = lex_with_errors(&input);
        prop_assert_eq!(render(&tokens), input);
    }

    #[test]
    fn lexing_arbitrary_unicode_is_lossless(input in "\\PC{0,40}") {
        let tokens = lex(&input);
        prop_assert_eq!(render(&tokens), input);
    }
}
