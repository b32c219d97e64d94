//! Expected-type inference (§8 scenario S5): the type a caret's *position*
//! calls for, independent of what (if anything) has actually been typed
//! there. `spec.md` documents the binary-operator *computed*-type algorithm
//! (C8) in depth but only exercises "expected type" through a single
//! scenario (`if |` ⇒ `Logical`) without naming it as its own numbered
//! component — this module is the minimal real implementation behind that
//! scenario: a structural lookup, not a type-inference engine, since
//! `original_source/` carried no surviving file for this spec to resolve
//! the gap further (see DESIGN.md).

use pq_common::PrimitiveTypeConstantKind as Kind;
use pq_parser::{AstNodeKind, NodeIdMapCollection, XorNode};

use crate::ttype::TType;

/// The type expected at the position `ancestry` resolves to, or
/// `TType::Unknown` when the surrounding production has no fixed
/// expectation (most positions: an expression slot accepts any type).
pub fn expected_type(_map: &NodeIdMapCollection, ancestry: &[XorNode<'_>]) -> TType {
    for i in 0..ancestry.len() {
        if let Some(result) = expected_type_at(ancestry, i) {
            return result;
        }
    }
    TType::Unknown
}

fn expected_type_at(ancestry: &[XorNode<'_>], i: usize) -> Option<TType> {
    let node = ancestry[i];
    let is_constant_if = matches!(
        node.as_ast().map(|ast| &ast.payload),
        Some(pq_parser::AstPayload::Constant { token_kind, .. }) if *token_kind == pq_common::TokenKind::If
    );

    if !is_constant_if {
        return None;
    }

    match ancestry.get(i + 1) {
        Some(XorNode::Context(ctx)) if ctx.kind == AstNodeKind::IfExpression && ctx.attribute_counter == 1 => {
            Some(TType::primitive(Kind::Logical, false))
        }
        _ => None,
    }
}
