//! Concrete M productions (SPEC_FULL.md §2): the subset of the grammar
//! needed to exercise every dual-mode-graph, ancestry, and type-inference
//! scenario, built on top of the C3/C4 primitives in `context`/`parser`.
//!
//! `(x) => 0` and `(x) + 0` share a prefix, so `FunctionExpression` is
//! always attempted first and backed out of via `fast_state_backup` /
//! `apply_fast_state_backup` on failure, falling back to a parenthesized
//! expression — the one place this grammar exercises speculative parsing.

use pq_common::{ParseError, Settings, Token, TokenKind};

use crate::node_id_map::NodeId;
use crate::parser::{try_read_with_productions, ParseFailure, ParseFault, ParseOk, ParserState};
use crate::productions::Productions;
use crate::syntax_kind::{AstNodeKind, AstPayload, LiteralKind};

/// Parse `tokens` as a complete document (§4.3 "tryRead") using the built-in
/// productions.
pub fn parse(settings: &Settings, tokens: Vec<Token>) -> Result<ParseOk, ParseFailure> {
    parse_with_productions(settings, tokens, Productions::default())
}

/// Like `parse`, but dispatches through a caller-supplied capability bundle
/// instead of the built-in readers (§4.3).
pub fn parse_with_productions(settings: &Settings, tokens: Vec<Token>, productions: Productions) -> Result<ParseOk, ParseFailure> {
    try_read_with_productions(settings, tokens, productions, |state| {
        let read_document = state.productions().read_document;
        read_document(state)
    })
}

impl Default for Productions {
    fn default() -> Self {
        Self {
            read_document,
            read_let_expression,
            read_if_expression,
            read_error_handling_expression,
            read_error_raising_expression,
            read_section_document,
            read_logical_expression,
            read_literal_expression,
            read_identifier_expression,
            read_list_expression,
            read_record_expression,
            read_type_primary_type,
            read_parenthesized_or_function_expression,
        }
    }
}

/// Wrap a production's body: allocate its context, run `body`, and promote
/// it on success (§4.3 step "startContext / read / endContext").
///
/// On failure the context is deliberately left open rather than rolled
/// back: `tryRead` hands the caller the state as of the moment of failure
/// (§4.3 "any thrown error becomes a ParseError carrying the *current*
/// state"), and an unfinished production is exactly the open `ContextNode`
/// active-node resolution (§4.5) is built to find. Only a genuinely
/// speculative attempt undoes itself, and it does so in bulk through
/// `fast_state_backup` / `apply_fast_state_backup`, not through this
/// per-production path.
fn production(
    state: &mut ParserState,
    kind: AstNodeKind,
    body: impl FnOnce(&mut ParserState) -> Result<AstPayload, ParseFault>,
) -> Result<NodeId, ParseFault> {
    let start_idx = state.token_index();
    state.start(kind)?;
    let payload = body(state)?;
    let range = state.token_range_since(start_idx);
    state.end(range, payload)
}

/// Like `production`, but wraps an already-finished node (`wrapped_id`) as
/// the new context's first child instead of starting fresh — the
/// forward-parent step a left-associative binary-operator level needs.
/// Failure likewise leaves the wrapped context open rather than unwinding
/// it; see `production`.
fn production_wrapped(
    state: &mut ParserState,
    kind: AstNodeKind,
    wrapped_id: NodeId,
    left_start_idx: usize,
    body: impl FnOnce(&mut ParserState) -> Result<AstPayload, ParseFault>,
) -> Result<NodeId, ParseFault> {
    state.wrap(kind, wrapped_id)?;
    let payload = body(state)?;
    let range = state.token_range_since(left_start_idx);
    state.end(range, payload)
}

/// Zero-or-more `item` separated by commas; raises
/// `ParseError::ExpectedCsvContinuation` on a dangling trailing comma
/// (§7 "illegal `,` placement").
fn read_csv<F>(state: &mut ParserState, is_item_start: fn(TokenKind) -> bool, mut read_item: F) -> Result<(), ParseFault>
where
    F: FnMut(&mut ParserState) -> Result<NodeId, ParseFault>,
{
    if !is_item_start(state.current_token_kind()) {
        return Ok(());
    }
    loop {
        read_item(state)?;
        if state.current_token_kind() != TokenKind::Comma {
            break;
        }
        read_constant(state, TokenKind::Comma)?;
        if !is_item_start(state.current_token_kind()) {
            return Err(ParseFault::Parse(ParseError::ExpectedCsvContinuation {
                position: state.current_position(),
            }));
        }
    }
    Ok(())
}

fn read_constant(state: &mut ParserState, expected: TokenKind) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::Constant, |state| {
        let token = state.expect(expected)?;
        Ok(AstPayload::Constant {
            token_kind: token.kind,
            text: token.data,
        })
    })
}

fn read_constant_any(state: &mut ParserState, expected: &'static [TokenKind]) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::Constant, |state| {
        let token = state.expect_any(expected)?;
        Ok(AstPayload::Constant {
            token_kind: token.kind,
            text: token.data,
        })
    })
}

// ── Document / top-level dispatch ───────────────────────────────────────

fn read_document(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::Document, |state| {
        read_expression(state)?;
        Ok(AstPayload::None)
    })
}

fn read_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    let productions = *state.productions();
    match state.current_token_kind() {
        TokenKind::Let => (productions.read_let_expression)(state),
        TokenKind::If => (productions.read_if_expression)(state),
        TokenKind::Try => (productions.read_error_handling_expression)(state),
        TokenKind::Error => (productions.read_error_raising_expression)(state),
        TokenKind::Section => (productions.read_section_document)(state),
        _ => (productions.read_logical_expression)(state),
    }
}

fn is_expression_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Let
            | TokenKind::If
            | TokenKind::Try
            | TokenKind::Error
            | TokenKind::Section
            | TokenKind::Not
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::NumberLiteral
            | TokenKind::TextLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::NullLiteral
            | TokenKind::Identifier
            | TokenKind::LeftBrace
            | TokenKind::LeftBracket
            | TokenKind::LeftParenthesis
            | TokenKind::Type
    )
}

// ── Keyword-led expressions ──────────────────────────────────────────────

fn read_let_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::LetExpression, |state| {
        read_constant(state, TokenKind::Let)?;
        read_csv(state, |kind| kind == TokenKind::Identifier, read_identifier_paired_expression)?;
        read_constant(state, TokenKind::In)?;
        read_expression(state)?;
        Ok(AstPayload::None)
    })
}

fn read_if_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::IfExpression, |state| {
        read_constant(state, TokenKind::If)?;
        read_expression(state)?;
        read_constant(state, TokenKind::Then)?;
        read_expression(state)?;
        read_constant(state, TokenKind::Else)?;
        read_expression(state)?;
        Ok(AstPayload::None)
    })
}

fn read_error_handling_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::ErrorHandlingExpression, |state| {
        read_constant(state, TokenKind::Try)?;
        read_expression(state)?;
        if state.current_token_kind() == TokenKind::Otherwise {
            read_constant(state, TokenKind::Otherwise)?;
            read_expression(state)?;
        }
        Ok(AstPayload::None)
    })
}

fn read_error_raising_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::ErrorRaisingExpression, |state| {
        read_constant(state, TokenKind::Error)?;
        read_expression(state)?;
        Ok(AstPayload::None)
    })
}

fn read_identifier_paired_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::IdentifierPairedExpression, |state| {
        read_identifier(state)?;
        read_constant(state, TokenKind::Equal)?;
        read_expression(state)?;
        Ok(AstPayload::None)
    })
}

fn read_generalized_identifier_paired_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::GeneralizedIdentifierPairedExpression, |state| {
        read_generalized_identifier(state)?;
        read_constant(state, TokenKind::Equal)?;
        read_expression(state)?;
        Ok(AstPayload::None)
    })
}

// ── Function expression (the speculative-parse showcase) ────────────────

fn read_parenthesized_or_function_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    let backup = state.fast_state_backup();
    match read_function_expression(state) {
        Ok(id) => Ok(id),
        Err(fault) => {
            if function_expression_attempt_is_committed(state) {
                Err(fault)
            } else {
                state.apply_fast_state_backup(backup);
                read_parenthesized_expression(state)
            }
        }
    }
}

/// Whether a failed `FunctionExpression` attempt got far enough into
/// parameter-list grammar that the input can no longer also be read as a
/// parenthesized expression, and the failure should be reported as-is
/// instead of falling back.
///
/// A still-open `Parameter` or non-empty `ParameterList` surviving in the
/// failure point's ancestry is exactly that signal: once a `ParameterList`
/// *does* close and promote — the genuinely ambiguous `(x) + 0` case, where
/// the next failure is `=>` vs `+` with nothing parameter-shaped left open —
/// it drops out of the ancestry walk and this returns `false`, which is
/// what sends that case back through the parenthesized fallback.
fn function_expression_attempt_is_committed(state: &ParserState) -> bool {
    let Some(current) = state.current_context_id() else {
        return false;
    };
    let ancestry = state.ancestry(current);
    ancestry.iter().any(|node| node.kind() == AstNodeKind::Parameter)
        || ancestry
            .iter()
            .find(|node| node.kind() == AstNodeKind::ParameterList)
            .is_some_and(|node| !state.map().child_ids(node.id()).is_empty())
}

fn read_parenthesized_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::ParenthesizedExpression, |state| {
        read_constant(state, TokenKind::LeftParenthesis)?;
        read_expression(state)?;
        read_constant(state, TokenKind::RightParenthesis)?;
        Ok(AstPayload::None)
    })
}

fn read_function_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::FunctionExpression, |state| {
        read_parameter_list(state)?;
        if state.current_token_kind() == TokenKind::As {
            read_constant(state, TokenKind::As)?;
            read_nullable_primitive_type(state)?;
        }
        read_constant(state, TokenKind::FatArrow)?;
        read_expression(state)?;
        Ok(AstPayload::None)
    })
}

fn read_parameter_list(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::ParameterList, |state| {
        read_constant(state, TokenKind::LeftParenthesis)?;
        let mut seen_optional = false;
        read_csv(state, is_parameter_start, |state| read_parameter(state, &mut seen_optional))?;
        read_constant(state, TokenKind::RightParenthesis)?;
        Ok(AstPayload::None)
    })
}

fn is_parameter_start(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Identifier | TokenKind::Optional)
}

fn read_parameter(state: &mut ParserState, seen_optional: &mut bool) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::Parameter, |state| {
        let is_optional = state.current_token_kind() == TokenKind::Optional;
        if is_optional {
            read_constant(state, TokenKind::Optional)?;
            *seen_optional = true;
        } else if *seen_optional {
            return Err(ParseFault::Parse(ParseError::RequiredParameterAfterOptionalParameter {
                position: state.current_position(),
            }));
        }
        read_identifier(state)?;
        if state.current_token_kind() == TokenKind::As {
            read_constant(state, TokenKind::As)?;
            read_nullable_primitive_type(state)?;
        }
        Ok(AstPayload::None)
    })
}

// ── List / record ────────────────────────────────────────────────────────

fn read_list_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::ListExpression, |state| {
        read_constant(state, TokenKind::LeftBrace)?;
        read_csv(state, is_expression_start, read_expression)?;
        read_constant(state, TokenKind::RightBrace)?;
        Ok(AstPayload::None)
    })
}

fn read_record_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::RecordExpression, |state| {
        read_constant(state, TokenKind::LeftBracket)?;
        read_csv(
            state,
            |kind| kind == TokenKind::Identifier,
            read_generalized_identifier_paired_expression,
        )?;
        read_constant(state, TokenKind::RightBracket)?;
        Ok(AstPayload::None)
    })
}

// ── Section document ──────────────────────────────────────────────────

fn read_section_document(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::SectionDocument, |state| {
        read_constant(state, TokenKind::Section)?;
        if state.current_token_kind() == TokenKind::Identifier {
            read_identifier(state)?;
        }
        read_constant(state, TokenKind::Semicolon)?;
        while is_section_member_start(state.current_token_kind()) {
            read_section_member(state)?;
        }
        Ok(AstPayload::None)
    })
}

fn is_section_member_start(kind: TokenKind) -> bool {
    kind == TokenKind::Shared || is_expression_start(kind)
}

fn read_section_member(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::SectionMember, |state| {
        if state.current_token_kind() == TokenKind::Shared {
            read_constant(state, TokenKind::Shared)?;
        }
        read_identifier_paired_expression(state)?;
        read_constant(state, TokenKind::Semicolon)?;
        Ok(AstPayload::None)
    })
}

// ── Types ─────────────────────────────────────────────────────────────

fn read_type_primary_type(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::TypePrimaryType, |state| {
        read_constant(state, TokenKind::Type)?;
        read_nullable_primitive_type(state)?;
        Ok(AstPayload::None)
    })
}

fn read_nullable_primitive_type(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::NullablePrimitiveType, |state| {
        if state.current_token_kind() == TokenKind::Nullable {
            read_constant(state, TokenKind::Nullable)?;
        }
        read_primitive_type(state)?;
        Ok(AstPayload::None)
    })
}

fn read_primitive_type(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::PrimitiveType, |state| {
        let token = state.expect(TokenKind::Identifier)?;
        match pq_common::PrimitiveTypeConstantKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.spelling() == token.data)
        {
            Some(kind) => Ok(AstPayload::PrimitiveType { kind }),
            None => Err(ParseFault::Parse(ParseError::InvalidPrimitiveType {
                position: token.range.start,
            })),
        }
    })
}

// ── Identifiers / literals ───────────────────────────────────────────────

fn read_identifier_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::IdentifierExpression, |state| {
        read_identifier(state)?;
        Ok(AstPayload::None)
    })
}

fn read_identifier(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::Identifier, |state| {
        let token = state.expect(TokenKind::Identifier)?;
        Ok(AstPayload::Identifier { name: token.data })
    })
}

fn read_generalized_identifier(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::GeneralizedIdentifier, |state| {
        let token = state.expect(TokenKind::Identifier)?;
        Ok(AstPayload::GeneralizedIdentifier { name: token.data })
    })
}

const LITERAL_START_KINDS: &[TokenKind] = &[
    TokenKind::NumberLiteral,
    TokenKind::TextLiteral,
    TokenKind::True,
    TokenKind::False,
    TokenKind::NullLiteral,
];

fn read_literal_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    production(state, AstNodeKind::LiteralExpression, |state| {
        let (kind, token) = match state.current_token_kind() {
            TokenKind::NumberLiteral => (LiteralKind::Number, state.expect(TokenKind::NumberLiteral)?),
            TokenKind::TextLiteral => (LiteralKind::Text, state.expect(TokenKind::TextLiteral)?),
            TokenKind::True => (LiteralKind::Logical, state.expect(TokenKind::True)?),
            TokenKind::False => (LiteralKind::Logical, state.expect(TokenKind::False)?),
            TokenKind::NullLiteral => (LiteralKind::Null, state.expect(TokenKind::NullLiteral)?),
            found => {
                return Err(ParseFault::Parse(ParseError::ExpectedAnyTokenKind {
                    expected: LITERAL_START_KINDS.to_vec(),
                    found,
                    position: state.current_position(),
                }))
            }
        };
        Ok(AstPayload::Literal { kind, text: token.data })
    })
}

// ── Binary-operator precedence chain (§4.7 TBinOpExpression family) ──────

fn read_binary_level(
    state: &mut ParserState,
    kind: AstNodeKind,
    operator_kinds: &'static [TokenKind],
    next: fn(&mut ParserState) -> Result<NodeId, ParseFault>,
) -> Result<NodeId, ParseFault> {
    let left_start_idx = state.token_index();
    let mut left = next(state)?;

    while operator_kinds.contains(&state.current_token_kind()) {
        left = production_wrapped(state, kind, left, left_start_idx, |state| {
            read_constant_any(state, operator_kinds)?;
            next(state)?;
            Ok(AstPayload::None)
        })?;
    }

    Ok(left)
}

const LOGICAL_OPERATORS: &[TokenKind] = &[TokenKind::And, TokenKind::Or];
const IS_OPERATORS: &[TokenKind] = &[TokenKind::Is];
const AS_OPERATORS: &[TokenKind] = &[TokenKind::As];
const EQUALITY_OPERATORS: &[TokenKind] = &[TokenKind::Equal, TokenKind::NotEqual];
const RELATIONAL_OPERATORS: &[TokenKind] = &[
    TokenKind::LessThan,
    TokenKind::LessThanEqualTo,
    TokenKind::GreaterThan,
    TokenKind::GreaterThanEqualTo,
];
const ARITHMETIC_OPERATORS: &[TokenKind] = &[TokenKind::Plus, TokenKind::Minus, TokenKind::Ampersand];
const METADATA_OPERATORS: &[TokenKind] = &[TokenKind::Meta];
const UNARY_OPERATORS: &[TokenKind] = &[TokenKind::Plus, TokenKind::Minus, TokenKind::Not];

fn read_logical_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    read_binary_level(state, AstNodeKind::LogicalExpression, LOGICAL_OPERATORS, read_is_expression)
}

fn read_is_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    read_binary_level(state, AstNodeKind::IsExpression, IS_OPERATORS, read_as_expression)
}

fn read_as_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    read_binary_level(state, AstNodeKind::AsExpression, AS_OPERATORS, read_equality_expression)
}

fn read_equality_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    read_binary_level(state, AstNodeKind::EqualityExpression, EQUALITY_OPERATORS, read_relational_expression)
}

fn read_relational_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    read_binary_level(
        state,
        AstNodeKind::RelationalExpression,
        RELATIONAL_OPERATORS,
        read_arithmetic_expression,
    )
}

fn read_arithmetic_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    read_binary_level(state, AstNodeKind::ArithmeticExpression, ARITHMETIC_OPERATORS, read_metadata_expression)
}

fn read_metadata_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    read_binary_level(state, AstNodeKind::MetadataExpression, METADATA_OPERATORS, read_unary_expression)
}

fn read_unary_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    if UNARY_OPERATORS.contains(&state.current_token_kind()) {
        production(state, AstNodeKind::UnaryExpression, |state| {
            read_constant_any(state, UNARY_OPERATORS)?;
            read_unary_expression(state)?;
            Ok(AstPayload::None)
        })
    } else {
        read_primary_expression(state)
    }
}

const PRIMARY_START_KINDS: &[TokenKind] = &[
    TokenKind::NumberLiteral,
    TokenKind::TextLiteral,
    TokenKind::True,
    TokenKind::False,
    TokenKind::NullLiteral,
    TokenKind::Identifier,
    TokenKind::LeftBrace,
    TokenKind::LeftBracket,
    TokenKind::LeftParenthesis,
    TokenKind::Type,
];

fn read_primary_expression(state: &mut ParserState) -> Result<NodeId, ParseFault> {
    let productions = *state.productions();
    match state.current_token_kind() {
        TokenKind::NumberLiteral | TokenKind::TextLiteral | TokenKind::True | TokenKind::False | TokenKind::NullLiteral => {
            (productions.read_literal_expression)(state)
        }
        TokenKind::Identifier => (productions.read_identifier_expression)(state),
        TokenKind::LeftBrace => (productions.read_list_expression)(state),
        TokenKind::LeftBracket => (productions.read_record_expression)(state),
        TokenKind::Type => (productions.read_type_primary_type)(state),
        TokenKind::LeftParenthesis => (productions.read_parenthesized_or_function_expression)(state),
        found => Err(ParseFault::Parse(ParseError::ExpectedAnyTokenKind {
            expected: PRIMARY_START_KINDS.to_vec(),
            found,
            position: state.current_position(),
        })),
    }
}
