//! Autocomplete engine (C7, §4.6): keyword and primitive-type suggestions
//! derived from the active node's ancestry plus the trailing (not yet
//! incorporated) token, grounded on `mesh-lsp/src/completion.rs`'s
//! ancestry-walk-up-from-cursor shape (generalized here from a rowan
//! `SyntaxNode` parent chain to an `XorNode` ancestry slice, since the
//! active node here may still be an open `ContextNode`).

use pq_common::{KeywordKind, PrimitiveTypeConstantKind, Token, TokenKind};
use pq_parser::xor_node::maybe_nth_previous;
use pq_parser::{AstNodeKind, AstPayload, NodeIdMapCollection, XorNode};

use crate::active_node::{ActiveNode, LeafKind};

/// §6 "Autocomplete result": the union of keyword and primitive-type
/// recommendations; presentation is left to the consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutocompleteResult {
    pub keywords: Vec<KeywordKind>,
    pub primitive_types: Vec<PrimitiveTypeConstantKind>,
}

/// Production kinds a completed child can sit under with no operator yet
/// consumed — the "unary-type-expression" leaf shape §4.6.1 step 4's
/// conjunction rule looks for. A bare `Identifier`/`Constant`/
/// `GeneralizedIdentifier` leaf does *not* count (scenario S1): only a
/// finished *expression*-level node does.
const UNARY_TYPE_EXPRESSION_KINDS: &[AstNodeKind] = &[
    AstNodeKind::IdentifierExpression,
    AstNodeKind::LiteralExpression,
    AstNodeKind::ParenthesizedExpression,
    AstNodeKind::ListExpression,
    AstNodeKind::RecordExpression,
    AstNodeKind::FunctionExpression,
    AstNodeKind::TypePrimaryType,
    AstNodeKind::UnaryExpression,
];

/// Run both autocomplete pipelines and return their union (§4.6.3).
#[tracing::instrument(level = "debug", skip_all)]
pub fn autocomplete(
    map: &NodeIdMapCollection,
    active: &ActiveNode<'_>,
    maybe_trailing_token: Option<&Token>,
) -> AutocompleteResult {
    AutocompleteResult {
        keywords: autocomplete_keyword(map, active, maybe_trailing_token),
        primitive_types: autocomplete_primitive_type(map, active, maybe_trailing_token),
    }
}

// ── 4.6.1 Keyword autocomplete ───────────────────────────────────────────

pub fn autocomplete_keyword(
    map: &NodeIdMapCollection,
    active: &ActiveNode<'_>,
    maybe_trailing_token: Option<&Token>,
) -> Vec<KeywordKind> {
    let position_name = position_name(active, maybe_trailing_token);

    if let Some(edge_case) = edge_case_suggestions(map, active, position_name) {
        return edge_case;
    }

    let mut suggestions = ancestry_keyword_suggestions(map, &active.ancestry).unwrap_or_default();

    if is_completed_unary_type_expression(active) {
        append_deduped(&mut suggestions, KeywordKind::CONJUNCTIONS);
    }

    if let Some(trailing) = maybe_trailing_token {
        if touches(trailing, active.position) {
            suggestions = autocomplete_keyword_trailing_text(suggestions, trailing, None);
        }
    }

    filter_by_prefix(suggestions, position_name)
}

/// §4.6.1 step 2: the two highest-priority edge cases, checked (and
/// returned on immediately, short-circuiting every later step) before the
/// general ancestry walk.
fn edge_case_suggestions(
    map: &NodeIdMapCollection,
    active: &ActiveNode<'_>,
    position_name: Option<&str>,
) -> Option<Vec<KeywordKind>> {
    // Empty document / lone identifier under `IdentifierExpression`
    // directly below the document root (scenario S10).
    let ancestry = &active.ancestry;
    if ancestry.len() >= 3
        && ancestry[0].kind() == AstNodeKind::Identifier
        && ancestry[1].kind() == AstNodeKind::IdentifierExpression
        && ancestry[2].kind() == AstNodeKind::Document
    {
        return Some(filter_by_prefix(KeywordKind::START_OF_DOCUMENT.to_vec(), position_name));
    }

    // `(_ |) => _`: caret right after a parameter name, nothing else
    // consumed in that `Parameter` yet. Checked across the whole ancestry,
    // not just the active node itself: a trailing, not-yet-incorporated
    // token (`(foo a|) => _`) resolves the active node onto the parameter
    // name leaf rather than the open `ParameterList` context directly, but
    // that context is still this caret's nearest enclosing production.
    for node in &active.ancestry {
        let XorNode::Context(ctx) = node else { continue };
        if ctx.kind == AstNodeKind::Parameter && ctx.attribute_counter == 1 {
            return Some(vec![KeywordKind::As]);
        }
        if ctx.kind == AstNodeKind::ParameterList && parameter_list_has_untyped_parameter(map, ctx.id) {
            return Some(vec![KeywordKind::As]);
        }
    }

    None
}

fn parameter_list_has_untyped_parameter(map: &NodeIdMapCollection, parameter_list_id: pq_parser::NodeId) -> bool {
    map.child_ids(parameter_list_id).iter().any(|&child_id| {
        map.get_ast(child_id)
            .filter(|child| child.kind == AstNodeKind::Parameter)
            .is_some_and(|_| {
                !map.child_ids(child_id)
                    .iter()
                    .any(|&grandchild_id| map.get_ast(grandchild_id).is_some_and(|n| n.kind == AstNodeKind::NullablePrimitiveType))
            })
    })
}

/// §4.6.1 step 3: walk `(parent, child)` pairs leaf-first from index 1
/// upward, dispatching on `parent.kind()`. The first routine to return
/// `Some` halts the walk.
fn ancestry_keyword_suggestions(map: &NodeIdMapCollection, ancestry: &[XorNode<'_>]) -> Option<Vec<KeywordKind>> {
    for i in 1..ancestry.len() {
        let parent = ancestry[i];
        let child = maybe_nth_previous(ancestry, i, 1, None)?;
        if let Some(result) = dispatch_on_parent_kind(map, parent, child) {
            return Some(result);
        }
    }
    None
}

fn dispatch_on_parent_kind(map: &NodeIdMapCollection, parent: XorNode<'_>, child: XorNode<'_>) -> Option<Vec<KeywordKind>> {
    match parent {
        XorNode::Context(ctx) if ctx.kind == AstNodeKind::ErrorHandlingExpression => {
            (child.attribute_index() == Some(0) && ctx.attribute_counter == 1).then(|| vec![KeywordKind::Otherwise])
        }
        XorNode::Context(ctx) if ctx.kind == AstNodeKind::LetExpression => {
            let child_is_last_pair = child.kind() == AstNodeKind::IdentifierPairedExpression
                && child.attribute_index().map(|idx| idx + 1) == Some(ctx.attribute_counter);
            child_is_last_pair.then(|| vec![KeywordKind::In])
        }
        XorNode::Context(ctx) if ctx.kind == AstNodeKind::ListExpression => {
            let just_opened = child.attribute_index() == Some(0) && constant_kind(child) == Some(TokenKind::LeftBrace);
            let after_comma = constant_kind(child) == Some(TokenKind::Comma);
            (just_opened || after_comma).then(|| KeywordKind::START_OF_DOCUMENT.to_vec())
        }
        XorNode::Context(ctx) if ctx.kind == AstNodeKind::SectionMember => {
            let nothing_consumed_yet = ctx.attribute_counter == 0;
            let _ = map;
            (nothing_consumed_yet && child.attribute_index().is_none()).then(|| vec![KeywordKind::Shared])
        }
        _ => None,
    }
}

fn constant_kind(node: XorNode<'_>) -> Option<TokenKind> {
    match node.as_ast()?.payload {
        AstPayload::Constant { token_kind, .. } => Some(token_kind),
        _ => None,
    }
}

/// §4.6.1 step 4: a completed unary-or-below expression with the caret
/// sitting right at its end boundary (not mid-token) also admits the
/// binary-operator conjunction keywords.
fn is_completed_unary_type_expression(active: &ActiveNode<'_>) -> bool {
    active.leaf_kind != LeafKind::OnAstNode && UNARY_TYPE_EXPRESSION_KINDS.contains(&active.node().kind())
}

/// §4.6.1 step 5 / §9's open question: narrow `inspected` by the trailing
/// token's text. `previously_selected` is accepted for parity with the
/// source's optional third argument (see §9) but, per the resolution
/// recorded in DESIGN.md, only the early trailing-token branch would ever
/// pass `Some` — this grammar subset has no two-token keyword sequence
/// (e.g. `otherwise or`) to exercise that refinement, so `previously_selected`
/// is accepted but unused beyond the plain prefix narrow.
fn autocomplete_keyword_trailing_text(
    inspected: Vec<KeywordKind>,
    trailing: &Token,
    previously_selected: Option<&[KeywordKind]>,
) -> Vec<KeywordKind> {
    let base = previously_selected.map(|prev| prev.to_vec()).unwrap_or(inspected);
    if trailing.kind.is_keyword() || trailing.kind == TokenKind::Identifier {
        base.into_iter().filter(|kw| kw.spelling().starts_with(trailing.data.as_str())).collect()
    } else {
        base
    }
}

// ── 4.6.2 Primitive-type autocomplete ───────────────────────────────────

pub fn autocomplete_primitive_type(
    map: &NodeIdMapCollection,
    active: &ActiveNode<'_>,
    maybe_trailing_token: Option<&Token>,
) -> Vec<PrimitiveTypeConstantKind> {
    if !is_primitive_type_position(map, &active.ancestry) {
        return Vec::new();
    }

    let mut all = PrimitiveTypeConstantKind::ALL.to_vec();
    if let Some(trailing) = maybe_trailing_token {
        if trailing.kind == TokenKind::Identifier && touches(trailing, active.position) {
            all.retain(|kind| kind.spelling().starts_with(trailing.data.as_str()));
        }
    }
    all
}

/// §4.6.2: true when the active node sits in a `PrimitiveType` slot reached
/// either through `type <here>` (`TypePrimaryType`) or `(x as <here>)` (a
/// `Parameter` that has already consumed its `as` constant).
fn is_primitive_type_position(map: &NodeIdMapCollection, ancestry: &[XorNode<'_>]) -> bool {
    if ancestry.first().map(|node| node.kind()) != Some(AstNodeKind::PrimitiveType) {
        return false;
    }
    if ancestry.get(1).map(|node| node.kind()) != Some(AstNodeKind::NullablePrimitiveType) {
        return false;
    }
    match ancestry.get(2) {
        Some(node) if node.kind() == AstNodeKind::TypePrimaryType => true,
        Some(node) if node.kind() == AstNodeKind::Parameter => parameter_has_as_constant(map, node.id()),
        _ => false,
    }
}

fn parameter_has_as_constant(map: &NodeIdMapCollection, parameter_id: pq_parser::NodeId) -> bool {
    map.child_ids(parameter_id)
        .iter()
        .any(|&id| map.get_ast(id).is_some_and(|ast| matches!(&ast.payload, AstPayload::Constant { token_kind, .. } if *token_kind == TokenKind::As)))
}

// ── Shared helpers ───────────────────────────────────────────────────────

fn position_name<'a>(active: &ActiveNode<'a>, maybe_trailing_token: Option<&'a Token>) -> Option<&'a str> {
    if let Some(trailing) = maybe_trailing_token {
        if matches!(trailing.kind, TokenKind::Identifier | TokenKind::True | TokenKind::False | TokenKind::NullLiteral) {
            return Some(trailing.data.as_str());
        }
    }
    active.maybe_identifier_under_position
}

fn touches(token: &Token, position: pq_common::Position) -> bool {
    token.range.contains_strict(position) || token.range.ends_at(position) || token.range.start == position
}

fn filter_by_prefix(suggestions: Vec<KeywordKind>, position_name: Option<&str>) -> Vec<KeywordKind> {
    match position_name {
        Some(prefix) if !prefix.is_empty() => suggestions.into_iter().filter(|kw| kw.spelling().starts_with(prefix)).collect(),
        _ => suggestions,
    }
}

fn append_deduped(base: &mut Vec<KeywordKind>, additions: &[KeywordKind]) {
    for addition in additions {
        if !base.contains(addition) {
            base.push(*addition);
        }
    }
}
