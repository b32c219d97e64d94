//! Parser framework (C4): token cursor, production entry/exit wrapping the
//! §4.2 context lifecycle, speculative read via `fast_state_backup` /
//! `apply_fast_state_backup`, and the top-level `try_read` driver.

use rustc_hash::FxHashSet;

use pq_common::{error::invariant_error, CommonError, ParseError, Position, Settings, Token, TokenKind, TokenRange};

use crate::context::ParseContextManager;
use crate::node_id_map::{NodeId, NodeIdMapCollection, XorNode};
use crate::productions::Productions;
use crate::syntax_kind::{AstNodeKind, AstPayload};

/// Either half of what a production can fail with (§4.3 `tryRead`: "any
/// thrown `TInnerParseError` becomes a `ParseError` ... any other fault
/// becomes a `CommonError`").
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFault {
    Parse(ParseError),
    Common(CommonError),
}

impl From<ParseError> for ParseFault {
    fn from(err: ParseError) -> Self {
        ParseFault::Parse(err)
    }
}

impl From<CommonError> for ParseFault {
    fn from(err: CommonError) -> Self {
        ParseFault::Common(err)
    }
}

/// O(1) snapshot taken immediately before a tentative parse (§4.3
/// "fastStateBackup").
#[derive(Debug, Clone, Copy)]
pub struct FastStateBackup {
    token_index: usize,
    id_counter: NodeId,
    current_context_id: Option<NodeId>,
}

/// Everything a production needs: the token cursor plus the live node graph
/// (§3 "Parser State").
pub struct ParserState<'settings> {
    settings: &'settings Settings,
    tokens: Vec<Token>,
    token_index: usize,
    context: ParseContextManager,
    productions: Productions,
}

impl<'settings> ParserState<'settings> {
    pub fn new(settings: &'settings Settings, tokens: Vec<Token>) -> Self {
        Self::with_productions(settings, tokens, Productions::default())
    }

    /// Like `new`, but dispatches every overridable production through
    /// `productions` instead of the built-in readers (§4.3 capability set).
    pub fn with_productions(settings: &'settings Settings, tokens: Vec<Token>, productions: Productions) -> Self {
        Self {
            settings,
            tokens,
            token_index: 0,
            context: ParseContextManager::new(),
            productions,
        }
    }

    /// The capability bundle this parse is dispatching through (§4.3).
    pub fn productions(&self) -> &Productions {
        &self.productions
    }

    // ── Token cursor ─────────────────────────────────────────────────────

    pub fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.token_index)
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    pub fn current_position(&self) -> Position {
        self.current_token()
            .map(|t| t.range.start)
            .unwrap_or(Position::ZERO)
    }

    pub fn token_index(&self) -> usize {
        self.token_index
    }

    /// The range from the start of `start_token_index` to the end of the
    /// most recently consumed token — the span a production's `end` call
    /// should record once every child has been read.
    pub fn token_range_since(&self, start_token_index: usize) -> TokenRange {
        let start = self
            .tokens
            .get(start_token_index)
            .map(|t| t.range.start)
            .unwrap_or(Position::ZERO);
        let end = if self.token_index > start_token_index {
            self.tokens
                .get(self.token_index - 1)
                .map(|t| t.range.end)
                .unwrap_or(start)
        } else {
            start
        };
        TokenRange::new(start, end)
    }

    pub fn is_eof(&self) -> bool {
        self.current_token_kind() == TokenKind::Eof
    }

    /// Peek `n` tokens ahead of the current one, without consuming.
    pub fn peek(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.token_index + n)
    }

    /// Consume the current token unconditionally (used once a kind has
    /// already been checked by the caller).
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.token_index).cloned();
        if token.is_some() {
            self.token_index += 1;
        }
        token
    }

    /// Consume the current token if it is `kind`, else raise
    /// `ParseError::ExpectedTokenKind` (§7).
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseFault> {
        let found = self.current_token_kind();
        if found == kind {
            Ok(self.advance().expect("current_token_kind would have returned Eof"))
        } else {
            Err(ParseFault::Parse(ParseError::ExpectedTokenKind {
                expected: kind,
                found,
                position: self.current_position(),
            }))
        }
    }

    /// Consume the current token if its kind is any of `kinds`, else raise
    /// `ParseError::ExpectedAnyTokenKind`.
    pub fn expect_any(&mut self, kinds: &[TokenKind]) -> Result<Token, ParseFault> {
        let found = self.current_token_kind();
        if kinds.contains(&found) {
            Ok(self.advance().expect("current_token_kind would have returned Eof"))
        } else {
            Err(ParseFault::Parse(ParseError::ExpectedAnyTokenKind {
                expected: kinds.to_vec(),
                found,
                position: self.current_position(),
            }))
        }
    }

    // ── Node graph access ────────────────────────────────────────────────

    pub fn map(&self) -> &NodeIdMapCollection {
        self.context.map()
    }

    pub fn current_context_id(&self) -> Option<NodeId> {
        self.context.current_context_id
    }

    pub fn ancestry(&self, id: NodeId) -> Vec<XorNode<'_>> {
        self.context.map().ancestry(id)
    }

    fn poll_cancellation(&self) -> Result<(), ParseFault> {
        self.settings.check_cancellation().map_err(ParseFault::from)
    }

    /// Begin a production (§4.3 driver step 1). Polls cancellation first,
    /// per §5 "at every production entry point".
    #[tracing::instrument(level = "trace", skip(self), fields(kind = ?kind))]
    pub fn start(&mut self, kind: AstNodeKind) -> Result<NodeId, ParseFault> {
        self.poll_cancellation()?;
        Ok(self.context.start_context(kind, self.token_index))
    }

    /// Begin a production that wraps an already-finished node as its first
    /// child (the forward-parent pattern binary-operator chains need; see
    /// `ParseContextManager::wrap_context`). Polls cancellation first, like
    /// `start`.
    pub fn wrap(&mut self, kind: AstNodeKind, wrapped_id: NodeId) -> Result<NodeId, ParseFault> {
        self.poll_cancellation()?;
        Ok(self.context.wrap_context(kind, wrapped_id, self.token_index))
    }

    /// Finish the current production successfully (§4.3 driver step 3).
    pub fn end(&mut self, token_range: TokenRange, payload: AstPayload) -> Result<NodeId, ParseFault> {
        self.context.end_context(token_range, payload).map_err(ParseFault::from)
    }

    /// The production attempted by `start` failed; roll its context back.
    /// `parent_will_be_deleted` should be `true` only when the caller is
    /// about to also roll back the parent (e.g. inside
    /// `apply_fast_state_backup`'s own bookkeeping) — ordinary production
    /// failure always passes `false` so surviving children are reparented.
    pub fn delete(&mut self, parent_will_be_deleted: bool) -> Result<NodeId, ParseFault> {
        self.context
            .delete_context(parent_will_be_deleted)
            .map_err(ParseFault::from)
    }

    // ── Speculative read ─────────────────────────────────────────────────

    /// Snapshot `{tokenIndex, idCounter, currentContextId}` before a
    /// tentative parse (§4.3 "fastStateBackup").
    pub fn fast_state_backup(&self) -> FastStateBackup {
        FastStateBackup {
            token_index: self.token_index,
            id_counter: self.context.next_id(),
            current_context_id: self.context.current_context_id,
        }
    }

    /// Undo everything done since `backup` was captured: restore the token
    /// cursor, delete every node allocated since, and restore the current
    /// context pointer (§4.3 "applyFastStateBackup"). Correctness rests on
    /// strict id monotonicity (§3 invariant 3, §8 property 1).
    pub fn apply_fast_state_backup(&mut self, backup: FastStateBackup) {
        self.token_index = backup.token_index;
        self.context.delete_subtree_above(backup.id_counter);
        self.context.current_context_id = backup.current_context_id;
    }
}

/// The successful half of a top-level parse (§6 "ParseOk").
///
/// `tokens` is carried alongside the graph (spec.md §6 lists `state` — the
/// token stream included — as part of `ParseOk`) because inspection needs
/// more than the id map: the trailing, not-yet-incorporated token after a
/// caret (§4.6.1 step 5) only exists in the token stream, never in a node.
pub struct ParseOk {
    pub root_id: NodeId,
    pub map: NodeIdMapCollection,
    pub leaf_node_ids: FxHashSet<NodeId>,
    pub tokens: Vec<Token>,
}

/// The failed half (§6 "ParseError"): the partial graph and token stream
/// are preserved so autocomplete/inspection can still run over them (§7
/// "User-visible behavior"). `stopped_at_token_index` is where the cursor
/// sat when the fault was raised — the trailing token autocomplete needs
/// (§4.6.1 step 5) is `tokens[stopped_at_token_index]`.
pub struct ParseFailure {
    pub map: NodeIdMapCollection,
    pub leaf_node_ids: FxHashSet<NodeId>,
    pub tokens: Vec<Token>,
    pub stopped_at_token_index: usize,
    pub fault: ParseFault,
}

/// Drive a production to completion, converting faults to the boundary
/// result and asserting post-conditions (§4.3 "tryRead").
#[tracing::instrument(level = "debug", skip_all)]
pub fn try_read(
    settings: &Settings,
    tokens: Vec<Token>,
    parse_fn: impl FnOnce(&mut ParserState<'_>) -> Result<NodeId, ParseFault>,
) -> Result<ParseOk, ParseFailure> {
    try_read_with_state(ParserState::new(settings, tokens), parse_fn)
}

/// Like `try_read`, but drives `parse_fn` against a state dispatching
/// through `productions` instead of the built-in readers.
pub fn try_read_with_productions(
    settings: &Settings,
    tokens: Vec<Token>,
    productions: Productions,
    parse_fn: impl FnOnce(&mut ParserState<'_>) -> Result<NodeId, ParseFault>,
) -> Result<ParseOk, ParseFailure> {
    try_read_with_state(ParserState::with_productions(settings, tokens, productions), parse_fn)
}

fn try_read_with_state(
    mut state: ParserState<'_>,
    parse_fn: impl FnOnce(&mut ParserState<'_>) -> Result<NodeId, ParseFault>,
) -> Result<ParseOk, ParseFailure> {
    let outcome = parse_fn(&mut state).and_then(|root_id| {
        if state.current_context_id().is_some() {
            return Err(ParseFault::Common(invariant_error(
                "tryRead completed with an open context remaining",
            )));
        }
        if !state.is_eof() {
            return Err(ParseFault::Parse(ParseError::UnusedTokensRemain {
                position: state.current_position(),
            }));
        }
        Ok(root_id)
    });

    let leaf_node_ids = state.context.map().leaf_node_ids().clone();
    let stopped_at_token_index = state.token_index();
    let ParserState { tokens, context, .. } = state;

    match outcome {
        Ok(root_id) => Ok(ParseOk {
            root_id,
            leaf_node_ids,
            tokens,
            map: context.into_map(),
        }),
        Err(fault) => Err(ParseFailure {
            leaf_node_ids,
            tokens,
            stopped_at_token_index,
            map: context.into_map(),
            fault,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pq_common::TokenRange;

    fn token(kind: TokenKind, data: &str) -> Token {
        Token::new(kind, data, TokenRange::new(Position::ZERO, Position::ZERO))
    }

    #[test]
    fn expect_consumes_matching_token() {
        let settings = Settings::default();
        let mut state = ParserState::new(&settings, vec![token(TokenKind::Let, "let")]);
        let consumed = state.expect(TokenKind::Let).unwrap();
        assert_eq!(consumed.kind, TokenKind::Let);
        assert!(state.is_eof());
    }

    #[test]
    fn expect_mismatch_raises_expected_token_kind() {
        let settings = Settings::default();
        let mut state = ParserState::new(&settings, vec![token(TokenKind::Identifier, "x")]);
        let err = state.expect(TokenKind::Let).unwrap_err();
        assert!(matches!(
            err,
            ParseFault::Parse(ParseError::ExpectedTokenKind { expected: TokenKind::Let, .. })
        ));
    }

    #[test]
    fn backup_and_restore_undoes_speculative_context() {
        let settings = Settings::default();
        let mut state = ParserState::new(&settings, vec![token(TokenKind::Identifier, "x")]);

        let root = state.start(AstNodeKind::Document).unwrap();
        let backup = state.fast_state_backup();

        let speculative = state.start(AstNodeKind::LetExpression).unwrap();
        assert_ne!(speculative, root);
        assert_eq!(state.map().child_ids(root), &[speculative]);

        state.apply_fast_state_backup(backup);

        assert_eq!(state.current_context_id(), Some(root));
        assert!(state.map().child_ids(root).is_empty());
        assert!(state.map().get_context(speculative).is_none());
    }

    #[test]
    fn try_read_rejects_unused_tokens() {
        let settings = Settings::default();
        let tokens = vec![token(TokenKind::Identifier, "x"), token(TokenKind::Identifier, "y")];

        let result = try_read(&settings, tokens, |state| {
            let root = state.start(AstNodeKind::Document)?;
            state.expect(TokenKind::Identifier)?;
            state.end(TokenRange::new(Position::ZERO, Position::ZERO), AstPayload::None)?;
            Ok(root)
        });

        let failure = result.err().expect("trailing token should fail tryRead");
        assert!(matches!(failure.fault, ParseFault::Parse(ParseError::UnusedTokensRemain { .. })));
    }

    #[test]
    fn try_read_succeeds_on_clean_document() {
        let settings = Settings::default();
        let tokens = vec![token(TokenKind::Identifier, "x")];

        let result = try_read(&settings, tokens, |state| {
            let root = state.start(AstNodeKind::Document)?;
            state.expect(TokenKind::Identifier)?;
            state.end(TokenRange::new(Position::ZERO, Position::ZERO), AstPayload::None)?;
            Ok(root)
        });

        let ok = result.ok().expect("clean document should parse");
        assert!(ok.map.get_ast(ok.root_id).is_some());
    }
}
