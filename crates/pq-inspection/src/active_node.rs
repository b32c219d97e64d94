//! Active-node resolution (§4.5): turn a caret position into the XorNode
//! the caret is "on", together with its ancestry, for the autocomplete and
//! type-inference engines to walk.

use pq_common::{Position, Token, TokenKind};
use pq_parser::{AstPayload, NodeId, NodeIdMapCollection, XorNode};
use rustc_hash::FxHashSet;

/// How the caret relates to the active node's own extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// Caret sits strictly inside a finished leaf's token range.
    OnAstNode,
    /// Caret sits exactly at a finished leaf's end boundary.
    AfterAstNode,
    /// The active node is still an open, unfinished context.
    ContextNode,
}

/// The caret's resolved focus: the winning node plus its leaf-first
/// ancestry, ready for the autocomplete and type-inference engines.
#[derive(Debug)]
pub struct ActiveNode<'a> {
    pub position: Position,
    /// Leaf-first: `ancestry[0]` is the active node itself.
    pub ancestry: Vec<XorNode<'a>>,
    pub leaf_kind: LeafKind,
    pub maybe_identifier_under_position: Option<&'a str>,
}

impl<'a> ActiveNode<'a> {
    pub fn node(&self) -> XorNode<'a> {
        self.ancestry[0]
    }

    pub fn parent(&self) -> Option<XorNode<'a>> {
        self.ancestry.get(1).copied()
    }
}

/// Resolve `position` against the finished leaves in `leaf_node_ids` and the
/// still-open contexts in `map` (§4.5).
///
/// `maybe_rejected_token` is the real (non-`Eof`) token the parser found but
/// couldn't use — the token sitting at `ParseFailure::stopped_at_token_index`
/// when the failure was a token-kind mismatch rather than running out of
/// input. It isn't itself part of the tree, so `position` vs. its start is
/// what tells "still inside the open production's pending slot" (`if |`)
/// apart from "caret has moved past whatever it rejected" (`let x = 1 a|`):
/// in the latter the open context's expectation was already overtaken by
/// real text, so the nearest *finished* construct is the more useful
/// answer, not the context still nominally waiting on a token that's no
/// longer next. Pass `None` for a successful parse or a failure caused by
/// running out of input.
#[tracing::instrument(level = "trace", skip_all, fields(position = position.code_unit))]
pub fn resolve<'a>(
    map: &'a NodeIdMapCollection,
    leaf_node_ids: &FxHashSet<NodeId>,
    position: Position,
    maybe_rejected_token: Option<&Token>,
) -> Option<ActiveNode<'a>> {
    let caret_at_or_before_rejected_token = match maybe_rejected_token {
        Some(token) => position.code_unit <= token.range.start.code_unit,
        None => true,
    };

    let winner = if caret_at_or_before_rejected_token {
        match best_leaf_match(map, leaf_node_ids, position) {
            // Mid-token edits always win outright, open context or not.
            Some((leaf_id, LeafKind::OnAstNode)) => Some((leaf_id, LeafKind::OnAstNode)),
            _ => map
                .open_context_ids()
                .max()
                .map(|context_id| (context_id, LeafKind::ContextNode))
                .or_else(|| best_leaf_match(map, leaf_node_ids, position)),
        }
    } else {
        None
    };

    let (winner_id, leaf_kind) = winner
        .or_else(|| best_leaf_match(map, leaf_node_ids, position))
        .or_else(|| nearest_preceding_leaf(map, leaf_node_ids, position).map(|id| (id, LeafKind::AfterAstNode)))?;

    let ancestry = map.ancestry(winner_id);
    let maybe_identifier_under_position = ancestry
        .first()
        .and_then(|node| node.as_ast())
        .and_then(|node| match &node.payload {
            AstPayload::Identifier { name } => Some(name.as_str()),
            AstPayload::GeneralizedIdentifier { name } => Some(name.as_str()),
            _ => None,
        });

    Some(ActiveNode {
        position,
        ancestry,
        leaf_kind,
        maybe_identifier_under_position,
    })
}

/// The real (non-`Eof`) token the parser stumbled over, if the failure was
/// a token-kind mismatch rather than simply running out of input. Feeds
/// `resolve`'s `maybe_rejected_token` parameter.
pub fn rejected_token(tokens: &[Token], stopped_at_token_index: usize) -> Option<&Token> {
    tokens.get(stopped_at_token_index).filter(|token| token.kind != TokenKind::Eof)
}

fn best_leaf_match(map: &NodeIdMapCollection, leaf_node_ids: &FxHashSet<NodeId>, position: Position) -> Option<(NodeId, LeafKind)> {
    let mut best: Option<(NodeId, LeafKind)> = None;
    for &id in leaf_node_ids {
        let Some(node) = map.get_ast(id) else { continue };
        let kind = if node.token_range.contains_strict(position) {
            LeafKind::OnAstNode
        } else if node.token_range.ends_at(position) {
            LeafKind::AfterAstNode
        } else {
            continue;
        };
        let is_better = match best {
            None => true,
            Some((best_id, best_kind)) => rank(kind) > rank(best_kind) || (rank(kind) == rank(best_kind) && id > best_id),
        };
        if is_better {
            best = Some((id, kind));
        }
    }
    best
}

/// The rightmost finished leaf ending at or before `position` — the active
/// node when a rejected token has carried the caret past the tree entirely
/// (§4.5: nothing "ends exactly at" a position sitting beyond dangling,
/// never-incorporated text, so the nearest preceding construct stands in).
fn nearest_preceding_leaf(map: &NodeIdMapCollection, leaf_node_ids: &FxHashSet<NodeId>, position: Position) -> Option<NodeId> {
    leaf_node_ids
        .iter()
        .filter_map(|&id| map.get_ast(id).map(|node| (id, node.token_range.end)))
        .filter(|(_, end)| end.code_unit <= position.code_unit)
        .max_by_key(|(id, end)| (end.code_unit, *id))
        .map(|(id, _)| id)
}

fn rank(kind: LeafKind) -> u8 {
    match kind {
        LeafKind::AfterAstNode => 0,
        LeafKind::OnAstNode => 1,
        LeafKind::ContextNode => 2,
    }
}
