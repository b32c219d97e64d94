//! Lexer/grapheme-splitter collaborator (§6 "Consumed").
//!
//! Out of scope per spec.md §1 ("Lexer / grapheme splitter ... produces the
//! token stream consumed by the parser"); only its interface
//! (`LexerSnapshot`, `Token`) is contracted there. This crate is a real,
//! minimal implementation of that interface so the rest of the workspace
//! has something to parse.

mod cursor;

use cursor::Cursor;
use pq_common::{keyword_from_str, Position, Token, TokenKind, TokenRange};

/// An immutable, indexable view over a completed lex pass (§6
/// "LexerSnapshot"): `tokens()`, plus the grapheme/column accessors the
/// parser and inspection code rely on for position math.
#[derive(Debug, Clone)]
pub struct LexerSnapshot {
    tokens: Vec<Token>,
}

impl LexerSnapshot {
    pub fn tokenize(source: &str) -> Self {
        Self {
            tokens: Lexer::tokenize(source),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// The grapheme-aware start position of a token (§6
    /// "graphemePositionStartFrom").
    pub fn grapheme_position_start_from(&self, token: &Token) -> Position {
        token.range.start
    }

    /// The column number (code units from line start) a token begins at
    /// (§6 "columnNumberStartFrom").
    pub fn column_number_start_from(&self, token: &Token) -> u32 {
        token.range.start.line_code_unit
    }
}

/// Tokenizes M source text into a flat `Vec<Token>` terminated by `Eof`.
///
/// Grounded on the teacher's `Cursor`-driven scan-then-classify loop
/// (`snow-lexer/src/lib.rs`): scan a maximal run of identifier characters,
/// then look the spelling up in a keyword table; literals, operators, and
/// delimiters are each recognized by their own small dispatch arm.
pub struct Lexer;

impl Lexer {
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut cursor = Cursor::new(source);
        let mut tokens = Vec::new();

        loop {
            let trivia_start = cursor.byte_pos();
            let start_pos = cursor.position();
            cursor.eat_while(|c| c.is_whitespace());
            let trivia_end = cursor.byte_pos();
            let leading_trivia = cursor.slice(trivia_start, trivia_end).to_string();

            if cursor.is_eof() {
                tokens.push(
                    Token::new(TokenKind::Eof, "", TokenRange::new(cursor.position(), cursor.position()))
                        .with_leading_trivia(leading_trivia),
                );
                break;
            }

            let token_start_byte = cursor.byte_pos();
            let token_start_pos = cursor.position();
            let c = cursor.peek().expect("checked not eof above");

            let kind = if c == '"' {
                Self::lex_text_literal(&mut cursor)
            } else if c.is_ascii_digit() {
                Self::lex_number_literal(&mut cursor)
            } else if is_identifier_start(c) {
                Self::lex_identifier_or_keyword(&mut cursor)
            } else {
                Self::lex_operator_or_delimiter(&mut cursor)
            };

            let token_end_byte = cursor.byte_pos();
            let data = cursor.slice(token_start_byte, token_end_byte).to_string();
            let range = TokenRange::new(token_start_pos, cursor.position());
            tokens.push(Token::new(kind, data, range).with_leading_trivia(leading_trivia));
            let _ = start_pos;
        }

        tokens
    }

    fn lex_identifier_or_keyword(cursor: &mut Cursor) -> TokenKind {
        let start = cursor.byte_pos();
        cursor.eat_while(is_identifier_continue);
        let end = cursor.byte_pos();
        let text = cursor.slice(start, end);
        match text {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::NullLiteral,
            _ => keyword_from_str(text).unwrap_or(TokenKind::Identifier),
        }
    }

    fn lex_number_literal(cursor: &mut Cursor) -> TokenKind {
        cursor.eat_while(|c| c.is_ascii_digit());
        if cursor.peek() == Some('.') && cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            cursor.advance(); // '.'
            cursor.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(cursor.peek(), Some('e') | Some('E')) {
            cursor.advance();
            if matches!(cursor.peek(), Some('+') | Some('-')) {
                cursor.advance();
            }
            cursor.eat_while(|c| c.is_ascii_digit());
        }
        TokenKind::NumberLiteral
    }

    /// `"..."` with `""` as an escaped quote, per M string-literal syntax.
    fn lex_text_literal(cursor: &mut Cursor) -> TokenKind {
        cursor.advance(); // opening quote
        loop {
            match cursor.peek() {
                None => break, // unterminated; caller treats as best-effort
                Some('"') => {
                    cursor.advance();
                    if cursor.peek() == Some('"') {
                        cursor.advance(); // escaped quote, keep scanning
                    } else {
                        break;
                    }
                }
                Some(_) => {
                    cursor.advance();
                }
            }
        }
        TokenKind::TextLiteral
    }

    fn lex_operator_or_delimiter(cursor: &mut Cursor) -> TokenKind {
        let c = cursor.advance().expect("checked not eof by caller");
        match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Division,
            '&' => TokenKind::Ampersand,
            '=' => {
                if cursor.peek() == Some('>') {
                    cursor.advance();
                    TokenKind::FatArrow
                } else {
                    TokenKind::Equal
                }
            }
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LeftParenthesis,
            ')' => TokenKind::RightParenthesis,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '@' => TokenKind::AtSign,
            '?' => TokenKind::QuestionMark,
            '<' => {
                if cursor.peek() == Some('=') {
                    cursor.advance();
                    TokenKind::LessThanEqualTo
                } else if cursor.peek() == Some('>') {
                    cursor.advance();
                    TokenKind::NotEqual
                } else {
                    TokenKind::LessThan
                }
            }
            '>' => {
                if cursor.peek() == Some('=') {
                    cursor.advance();
                    TokenKind::GreaterThanEqualTo
                } else {
                    TokenKind::GreaterThan
                }
            }
            _ => TokenKind::Unknown,
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_let_expression() {
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
    fn keywords_are_not_identifiers() {
        assert_eq!(kinds("let")[0], TokenKind::Let);
        assert_eq!(kinds("letter")[0], TokenKind::Identifier);
    }

    #[test]
    fn lexes_text_literal_with_escaped_quote() {
        let tokens = Lexer::tokenize(r#""a""b""#);
        assert_eq!(tokens[0].kind, TokenKind::TextLiteral);
        assert_eq!(tokens[0].data, r#""a""b""#);
    }

    #[test]
    fn lexes_float_literal() {
        let tokens = Lexer::tokenize("3.14");
        assert_eq!(tokens[0].kind, TokenKind::NumberLiteral);
        assert_eq!(tokens[0].data, "3.14");
    }

    #[test]
    fn lexes_comparison_operators_greedily() {
        assert_eq!(kinds("<=")[0], TokenKind::LessThanEqualTo);
        assert_eq!(kinds("<>")[0], TokenKind::NotEqual);
        assert_eq!(kinds("<")[0], TokenKind::LessThan);
    }

    #[test]
    fn lexes_fat_arrow_greedily() {
        assert_eq!(kinds("=>")[0], TokenKind::FatArrow);
        assert_eq!(kinds("=")[0], TokenKind::Equal);
    }

    #[test]
    fn leading_trivia_plus_data_round_trips_source() {
        let source = "  let   x = 1";
        let tokens = Lexer::tokenize(source);
        let reconstructed: String = tokens.iter().map(Token::full_text).collect();
        assert_eq!(reconstructed, source);
    }

    #[test]
    fn empty_source_yields_only_eof() {
        let tokens = Lexer::tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn snapshot_exposes_column_number() {
        let snapshot = LexerSnapshot::tokenize("let x");
        let x_token = &snapshot.tokens()[1];
        assert_eq!(snapshot.column_number_start_from(x_token), 4);
    }
}
