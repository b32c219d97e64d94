use thiserror::Error;

use crate::position::Position;
use crate::token::TokenKind;

/// Faults that are not about the user's input — a violated structural
/// assumption, cooperative cancellation, or an unrecognized fault wrapped
/// for uniformity (§7 "CommonError").
///
/// Inspection code (active-node resolution, autocomplete, type inference)
/// never raises these for malformed input; they only raise on invariant
/// violations, which are bugs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommonError {
    #[error("operation was cancelled")]
    Cancellation,

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("unrecognized error: {0}")]
    Unknown(String),
}

/// Construct an [`CommonError::Invariant`] with a formatted message, in the
/// teacher's plain-helper-function style rather than a macro.
pub fn invariant_error(message: impl Into<String>) -> CommonError {
    CommonError::Invariant(message.into())
}

/// Diagnostics a parse production can raise (§7 "ParseError" variants).
///
/// Each variant carries the offending token's position so a consumer can
/// report a grapheme-accurate column (§7 "User-visible behavior").
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected {expected:?}, found {found:?} at {position:?}")]
    ExpectedTokenKind {
        expected: TokenKind,
        found: TokenKind,
        position: Position,
    },

    #[error("expected one of {expected:?}, found {found:?} at {position:?}")]
    ExpectedAnyTokenKind {
        expected: Vec<TokenKind>,
        found: TokenKind,
        position: Position,
    },

    #[error("illegal comma continuation at {position:?}")]
    ExpectedCsvContinuation { position: Position },

    #[error("unused tokens remain starting at {position:?}")]
    UnusedTokensRemain { position: Position },

    #[error("unterminated parentheses opened at {opened_at:?}")]
    UnterminatedParentheses { opened_at: Position },

    #[error("unterminated bracket opened at {opened_at:?}")]
    UnterminatedBracket { opened_at: Position },

    #[error("invalid primitive type at {position:?}")]
    InvalidPrimitiveType { position: Position },

    #[error("required parameter after optional parameter at {position:?}")]
    RequiredParameterAfterOptionalParameter { position: Position },
}

impl ParseError {
    /// The position a consumer should point a caret/squiggle at.
    pub fn position(&self) -> Position {
        match self {
            ParseError::ExpectedTokenKind { position, .. }
            | ParseError::ExpectedAnyTokenKind { position, .. }
            | ParseError::ExpectedCsvContinuation { position }
            | ParseError::UnusedTokensRemain { position }
            | ParseError::InvalidPrimitiveType { position }
            | ParseError::RequiredParameterAfterOptionalParameter { position } => *position,
            ParseError::UnterminatedParentheses { opened_at }
            | ParseError::UnterminatedBracket { opened_at } => *opened_at,
        }
    }
}
