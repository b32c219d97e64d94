//! Tokenization shape behind spec.md §8's scenario sources: the parser and
//! inspection crates' own scenario suites assume these exact token-kind
//! sequences, so this crate pins them at its own boundary.

use pq_common::TokenKind;
use pq_lexer::Lexer;

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
}

#[test]
fn s1_let_in_identifier() {
    assert_eq!(
        kinds("let x = 1 in x"),
        vec![
            TokenKind::Let,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::NumberLiteral,
            TokenKind::In,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn s2_dangling_identifier_after_literal() {
    assert_eq!(
        kinds("let x = 1 a"),
        vec![
            TokenKind::Let,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::NumberLiteral,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn s3_parameter_with_dangling_as() {
    assert_eq!(
        kinds("(x as ) => 0"),
        vec![
            TokenKind::LeftParenthesis,
            TokenKind::Identifier,
            TokenKind::As,
            TokenKind::RightParenthesis,
            TokenKind::FatArrow,
            TokenKind::NumberLiteral,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn s5_bare_if() {
    assert_eq!(kinds("if "), vec![TokenKind::If, TokenKind::Eof]);
}

#[test]
fn s7_text_concatenation() {
    assert_eq!(
        kinds(r#""abc" & "def""#),
        vec![TokenKind::TextLiteral, TokenKind::Ampersand, TokenKind::TextLiteral, TokenKind::Eof]
    );
}

#[test]
fn s9_partial_addition() {
    assert_eq!(kinds("1 +"), vec![TokenKind::NumberLiteral, TokenKind::Plus, TokenKind::Eof]);
}

#[test]
fn s10_lone_identifier() {
    assert_eq!(kinds("l"), vec![TokenKind::Identifier, TokenKind::Eof]);
}

/// Trailing whitespace is trivia on the synthetic `Eof` token, not a
/// separate token — §8 property 5 relies on `Eof` carrying it.
#[test]
fn trailing_whitespace_becomes_the_eof_tokens_leading_trivia() {
    let tokens = Lexer::tokenize("if ");
    let eof = tokens.last().unwrap();
    assert_eq!(eof.kind, TokenKind::Eof);
    assert_eq!(eof.leading_trivia, " ");
}

/// `""`-escaped quotes keep a text literal going instead of closing it.
#[test]
fn text_literal_handles_escaped_quotes() {
    let tokens = Lexer::tokenize(r#""a""b""#);
    assert_eq!(tokens[0].kind, TokenKind::TextLiteral);
    assert_eq!(tokens[0].data, r#""a""b""#);
}
