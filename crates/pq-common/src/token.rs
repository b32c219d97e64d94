use serde::Serialize;

use crate::position::TokenRange;

/// A token produced by the lexer/grapheme-splitter collaborator (§6).
///
/// `data` is the token's exact source text; it is kept on the token itself
/// (rather than re-sliced from source later) because round-tripping
/// (§8 property 5) and error display both need it without holding a
/// borrow of the original string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub data: String,
    pub range: TokenRange,
    /// Whitespace and comments consumed before this token's significant
    /// text. Carried on the token (rather than dropped) so leaf tokens can
    /// be concatenated to reproduce the original source exactly (§8
    /// property 5).
    pub leading_trivia: String,
}

impl Token {
    pub fn new(kind: TokenKind, data: impl Into<String>, range: TokenRange) -> Self {
        Self {
            kind,
            data: data.into(),
            range,
            leading_trivia: String::new(),
        }
    }

    pub fn with_leading_trivia(mut self, trivia: impl Into<String>) -> Self {
        self.leading_trivia = trivia.into();
        self
    }

    /// The full source slice this token occupies, trivia included.
    pub fn full_text(&self) -> String {
        format!("{}{}", self.leading_trivia, self.data)
    }
}

/// The closed token-kind enumeration (§3 "Entities").
///
/// Every M keyword is its own variant rather than a generic
/// `Keyword(KeywordKind)` wrapper: productions match on `TokenKind`
/// directly and a flat enum keeps that a single comparison instead of a
/// nested match, mirroring the teacher's `TokenKind` (`keyword_from_str`
/// dispatching straight to flat variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    And,
    As,
    Each,
    Else,
    Error,
    False,
    If,
    In,
    Is,
    Let,
    Meta,
    Not,
    Nullable,
    Optional,
    Otherwise,
    Or,
    Section,
    Shared,
    Then,
    True,
    Try,
    Type,

    // ── Literals ───────────────────────────────────────────────────────
    Identifier,
    NumberLiteral,
    TextLiteral,
    NullLiteral,

    // ── Operators / punctuation ────────────────────────────────────────
    Plus,
    Minus,
    Asterisk,
    Division,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqualTo,
    GreaterThan,
    GreaterThanEqualTo,
    FatArrow,
    Comma,
    Semicolon,
    LeftParenthesis,
    RightParenthesis,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    AtSign,
    QuestionMark,

    // ── Special ────────────────────────────────────────────────────────
    Eof,
    Unknown,
}

impl TokenKind {
    /// Whether this kind is one of the M reserved words (used by the
    /// autocomplete engine to decide whether a trailing identifier-shaped
    /// token is "keyword-like", §4.6.1 step 1).
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::As
                | TokenKind::Each
                | TokenKind::Else
                | TokenKind::Error
                | TokenKind::False
                | TokenKind::If
                | TokenKind::In
                | TokenKind::Is
                | TokenKind::Let
                | TokenKind::Meta
                | TokenKind::Not
                | TokenKind::Nullable
                | TokenKind::Optional
                | TokenKind::Otherwise
                | TokenKind::Or
                | TokenKind::Section
                | TokenKind::Shared
                | TokenKind::Then
                | TokenKind::True
                | TokenKind::Try
                | TokenKind::Type
        )
    }
}

/// Look up a keyword `TokenKind` from its spelling. Used by the lexer to
/// distinguish keywords from identifiers after scanning an identifier-shaped
/// run of characters (the teacher's `keyword_from_str` pattern).
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    Some(match s {
        "and" => TokenKind::And,
        "as" => TokenKind::As,
        "each" => TokenKind::Each,
        "else" => TokenKind::Else,
        "error" => TokenKind::Error,
        "false" => TokenKind::False,
        "if" => TokenKind::If,
        "in" => TokenKind::In,
        "is" => TokenKind::Is,
        "let" => TokenKind::Let,
        "meta" => TokenKind::Meta,
        "not" => TokenKind::Not,
        "nullable" => TokenKind::Nullable,
        "optional" => TokenKind::Optional,
        "otherwise" => TokenKind::Otherwise,
        "or" => TokenKind::Or,
        "section" => TokenKind::Section,
        "shared" => TokenKind::Shared,
        "then" => TokenKind::Then,
        "true" => TokenKind::True,
        "try" => TokenKind::Try,
        "type" => TokenKind::Type,
        _ => return None,
    })
}

/// The subset of `TokenKind` that autocomplete can suggest (§6 "Produced").
///
/// Kept distinct from `TokenKind` because autocomplete also needs a
/// canonical spelling per keyword for prefix filtering (§8 property 7),
/// and because not every `TokenKind::is_keyword()` member is a valid
/// *suggestion* on its own (e.g. `null`/`true`/`false` are literals, not
/// productions a suggestion would insert as a bare keyword).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeywordKind {
    And,
    As,
    Each,
    Else,
    Error,
    If,
    In,
    Is,
    Let,
    Meta,
    Not,
    Otherwise,
    Or,
    Section,
    Shared,
    Then,
    Try,
    Type,
}

impl KeywordKind {
    pub const fn spelling(self) -> &'static str {
        match self {
            KeywordKind::And => "and",
            KeywordKind::As => "as",
            KeywordKind::Each => "each",
            KeywordKind::Else => "else",
            KeywordKind::Error => "error",
            KeywordKind::If => "if",
            KeywordKind::In => "in",
            KeywordKind::Is => "is",
            KeywordKind::Let => "let",
            KeywordKind::Meta => "meta",
            KeywordKind::Not => "not",
            KeywordKind::Otherwise => "otherwise",
            KeywordKind::Or => "or",
            KeywordKind::Section => "section",
            KeywordKind::Shared => "shared",
            KeywordKind::Then => "then",
            KeywordKind::Try => "try",
            KeywordKind::Type => "type",
        }
    }

    /// The full enumeration, in a stable order. Used as the universe for
    /// §8 property 6 ("autocomplete is closed").
    pub const ALL: &'static [KeywordKind] = &[
        KeywordKind::And,
        KeywordKind::As,
        KeywordKind::Each,
        KeywordKind::Else,
        KeywordKind::Error,
        KeywordKind::If,
        KeywordKind::In,
        KeywordKind::Is,
        KeywordKind::Let,
        KeywordKind::Meta,
        KeywordKind::Not,
        KeywordKind::Otherwise,
        KeywordKind::Or,
        KeywordKind::Section,
        KeywordKind::Shared,
        KeywordKind::Then,
        KeywordKind::Try,
        KeywordKind::Type,
    ];

    /// The conjunction keywords of §4.6.1 step 4 / GLOSSARY.
    pub const CONJUNCTIONS: &'static [KeywordKind] = &[
        KeywordKind::And,
        KeywordKind::As,
        KeywordKind::Is,
        KeywordKind::Meta,
        KeywordKind::Or,
    ];

    /// Keywords legal at the very start of a document (§4.6.1 step 2,
    /// scenario S10: `l|` in an empty document suggests only `Let`).
    pub const START_OF_DOCUMENT: &'static [KeywordKind] = &[
        KeywordKind::Each,
        KeywordKind::Error,
        KeywordKind::If,
        KeywordKind::Let,
        KeywordKind::Not,
        KeywordKind::Section,
        KeywordKind::Shared,
        KeywordKind::Try,
        KeywordKind::Type,
    ];
}

/// Primitive type names recognized by `PrimitiveType` (§4.6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveTypeConstantKind {
    Any,
    AnyNonNull,
    Binary,
    Date,
    DateTime,
    DateTimeZone,
    Duration,
    Function,
    List,
    Logical,
    None,
    Null,
    Number,
    Record,
    Table,
    Text,
    Time,
    Type,
}

impl PrimitiveTypeConstantKind {
    pub const fn spelling(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::AnyNonNull => "anynonnull",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::DateTimeZone => "datetimezone",
            Self::Duration => "duration",
            Self::Function => "function",
            Self::List => "list",
            Self::Logical => "logical",
            Self::None => "none",
            Self::Null => "null",
            Self::Number => "number",
            Self::Record => "record",
            Self::Table => "table",
            Self::Text => "text",
            Self::Time => "time",
            Self::Type => "type",
        }
    }

    pub const ALL: &'static [PrimitiveTypeConstantKind] = &[
        Self::Any,
        Self::AnyNonNull,
        Self::Binary,
        Self::Date,
        Self::DateTime,
        Self::DateTimeZone,
        Self::Duration,
        Self::Function,
        Self::List,
        Self::Logical,
        Self::None,
        Self::Null,
        Self::Number,
        Self::Record,
        Self::Table,
        Self::Text,
        Self::Time,
        Self::Type,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_from_str_recognizes_all_keywords() {
        for kw in [
            "and", "as", "each", "else", "error", "false", "if", "in", "is", "let", "meta", "not",
            "nullable", "optional", "otherwise", "or", "section", "shared", "then", "true", "try", "type",
        ] {
            assert!(keyword_from_str(kw).is_some(), "{kw} should be a keyword");
        }
    }

    #[test]
    fn keyword_from_str_rejects_non_keywords() {
        assert_eq!(keyword_from_str("foo"), None);
        assert_eq!(keyword_from_str("Let"), None, "case-sensitive");
    }

    #[test]
    fn keyword_kind_spelling_round_trips_through_lookup() {
        for kw in KeywordKind::ALL {
            let tok = keyword_from_str(kw.spelling());
            assert!(tok.is_some(), "{} should round-trip", kw.spelling());
        }
    }

    #[test]
    fn conjunctions_are_a_subset_of_all() {
        for kw in KeywordKind::CONJUNCTIONS {
            assert!(KeywordKind::ALL.contains(kw));
        }
    }
}
