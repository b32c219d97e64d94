//! Binary-operator type inference (C8, §4.7): given a `TBinOpExpression`
//! node, compute its `TType` from a static operator table built once at
//! startup (the teacher carries no such table — this is new machinery,
//! grounded on `snow-typeck/src/ty.rs`'s tagged-union `Ty` shape for the
//! *result* type, composed here with the spec's own table-construction
//! recipe since no example repo owns a binary-operator lookup of this
//! shape).

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use pq_common::{PrimitiveTypeConstantKind as Kind, TokenKind};
use pq_parser::{AstNodeKind, AstPayload, NodeIdMapCollection, XorNode};

use crate::ttype::TType;

type FullKey = (Kind, TokenKind, Kind);
type PartialKey = (Kind, TokenKind);

/// `(leftKind, opKind, rightKind) -> resultKind`, built once (§4.7
/// "Operator tables ... Built once at startup").
fn full_table() -> &'static FxHashMap<FullKey, Kind> {
    static TABLE: OnceLock<FxHashMap<FullKey, Kind>> = OnceLock::new();
    TABLE.get_or_init(build_full_table)
}

/// `(leftKind, opKind) -> { resultKind, .. }`, derived from `full_table` by
/// "stripping the last component and collecting the resulting set" (§4.7) —
/// every distinct result kind reachable from `leftKind` and `opKind` for
/// *some* right-hand kind, used when the right operand hasn't been parsed
/// yet (§4.7 step 2, the partial-lookup path).
fn partial_table() -> &'static FxHashMap<PartialKey, Vec<Kind>> {
    static TABLE: OnceLock<FxHashMap<PartialKey, Vec<Kind>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut partial: FxHashMap<PartialKey, Vec<Kind>> = FxHashMap::default();
        for (&(left, op, _right), &result) in full_table() {
            let entry = partial.entry((left, op)).or_default();
            if !entry.contains(&result) {
                entry.push(result);
            }
        }
        partial
    })
}

const COMPARABLE_KINDS: &[Kind] = &[
    Kind::Number,
    Kind::Text,
    Kind::Date,
    Kind::DateTime,
    Kind::DateTimeZone,
    Kind::Duration,
    Kind::Time,
];

const CLOCK_KINDS: &[Kind] = &[Kind::Time, Kind::Date, Kind::DateTime, Kind::DateTimeZone];

fn build_full_table() -> FxHashMap<FullKey, Kind> {
    let mut table = FxHashMap::default();
    let mut put = |left: Kind, op: TokenKind, right: Kind, result: Kind| {
        table.insert((left, op, right), result);
    };

    for &k in COMPARABLE_KINDS {
        put(k, TokenKind::GreaterThan, k, Kind::Logical);
        put(k, TokenKind::GreaterThanEqualTo, k, Kind::Logical);
        put(k, TokenKind::LessThan, k, Kind::Logical);
        put(k, TokenKind::LessThanEqualTo, k, Kind::Logical);
    }

    for &k in Kind::ALL {
        put(k, TokenKind::Equal, k, Kind::Logical);
        put(k, TokenKind::NotEqual, k, Kind::Logical);
    }

    for op in [TokenKind::Plus, TokenKind::Minus, TokenKind::Asterisk, TokenKind::Division] {
        put(Kind::Number, op, Kind::Number, Kind::Number);
    }

    put(Kind::Logical, TokenKind::And, Kind::Logical, Kind::Logical);
    put(Kind::Logical, TokenKind::Or, Kind::Logical, Kind::Logical);

    for &k in CLOCK_KINDS {
        put(k, TokenKind::Plus, Kind::Duration, k);
        put(Kind::Duration, TokenKind::Plus, k, k);
        put(k, TokenKind::Minus, Kind::Duration, k);
        put(k, TokenKind::Minus, k, Kind::Duration);
    }
    put(Kind::Date, TokenKind::Ampersand, Kind::Time, Kind::DateTime);

    put(Kind::Duration, TokenKind::Plus, Kind::Duration, Kind::Duration);
    put(Kind::Duration, TokenKind::Minus, Kind::Duration, Kind::Duration);
    put(Kind::Duration, TokenKind::Asterisk, Kind::Number, Kind::Duration);
    put(Kind::Number, TokenKind::Asterisk, Kind::Duration, Kind::Duration);
    put(Kind::Duration, TokenKind::Division, Kind::Number, Kind::Duration);

    for &k in &[Kind::Text, Kind::List, Kind::Record, Kind::Table] {
        put(k, TokenKind::Ampersand, k, k);
    }

    table
}

/// Children of a `TBinOpExpression` node in the fixed `[left, op, right]`
/// shape every binary level's `read_binary_level` production builds.
struct BinOpChildren<'a> {
    left: Option<XorNode<'a>>,
    op: Option<XorNode<'a>>,
    right: Option<XorNode<'a>>,
}

fn bin_op_children<'a>(map: &'a NodeIdMapCollection, node: XorNode<'a>) -> BinOpChildren<'a> {
    let children = map.iter_children_xor(node.id());
    BinOpChildren {
        left: children.first().copied(),
        op: children.get(1).copied(),
        right: children.get(2).copied(),
    }
}

fn op_token_kind(op: XorNode<'_>) -> Option<TokenKind> {
    match op.as_ast()?.payload {
        AstPayload::Constant { token_kind, .. } => Some(token_kind),
        _ => None,
    }
}

/// Compute the `TType` of `node`, which must be one of the
/// `TBinOpExpression` variants (§4.7 contract). Never panics on malformed
/// or partial input — an absent/unresolvable operand yields `TType::Unknown`
/// rather than an error (§4.7, §7 "inspection algorithms never throw on
/// malformed user input").
#[tracing::instrument(level = "trace", skip_all, fields(node_id = node.id()))]
pub fn infer_bin_op_type(map: &NodeIdMapCollection, node: XorNode<'_>) -> TType {
    debug_assert!(node.kind().is_bin_op_expression(), "infer_bin_op_type called on a non-TBinOpExpression node");
    infer(map, node)
}

fn infer(map: &NodeIdMapCollection, node: XorNode<'_>) -> TType {
    let children = bin_op_children(map, node);

    let Some(left) = children.left else {
        return TType::Unknown;
    };

    let Some(op) = children.op.filter(|op| !op.is_context()) else {
        return infer_operand(map, left);
    };
    let Some(op_kind) = op_token_kind(op) else {
        return infer_operand(map, left);
    };

    let Some(right) = children.right.filter(|right| !right.is_context()) else {
        return partial_lookup(map, left, op_kind);
    };

    let left_type = infer_operand(map, left);
    let right_type = infer_operand(map, right);
    full_lookup(left_type, right_type, op_kind)
}

/// Type of an operand that may itself be a still-unresolved
/// `TBinOpExpression` (recursing into a lower-precedence level that hasn't
/// finished yet) or any other finished node.
fn infer_operand(map: &NodeIdMapCollection, operand: XorNode<'_>) -> TType {
    if operand.kind().is_bin_op_expression() {
        return infer(map, operand);
    }
    operand_type(map, operand)
}

/// Leaf-level type lookup for a non-`TBinOpExpression` operand: literals,
/// identifiers (unresolvable without scope information, hence `Unknown`),
/// list/record/type-primary productions, and parenthesized expressions
/// (transparent — the type of `(x)` is the type of `x`).
fn operand_type(map: &NodeIdMapCollection, operand: XorNode<'_>) -> TType {
    match operand.kind() {
        AstNodeKind::LiteralExpression => literal_type(operand),
        AstNodeKind::ParenthesizedExpression => map
            .iter_children_xor(operand.id())
            .into_iter()
            .find(|child| child.kind() != AstNodeKind::Constant)
            .map(|inner| infer_operand(map, inner))
            .unwrap_or(TType::Unknown),
        AstNodeKind::ListExpression => TType::primitive(Kind::List, false),
        AstNodeKind::RecordExpression => record_expression_type(map, operand),
        AstNodeKind::TypePrimaryType => TType::primitive(Kind::Type, false),
        AstNodeKind::FunctionExpression => TType::Function,
        AstNodeKind::UnaryExpression => map
            .iter_children_xor(operand.id())
            .into_iter()
            .find(|child| child.kind() != AstNodeKind::Constant)
            .map(|inner| infer_operand(map, inner))
            .unwrap_or(TType::Unknown),
        _ => TType::Unknown,
    }
}

fn literal_type(node: XorNode<'_>) -> TType {
    let Some(ast) = node.as_ast() else { return TType::Unknown };
    match &ast.payload {
        AstPayload::Literal { kind, .. } => {
            let primitive_kind = match kind {
                pq_parser::LiteralKind::Number => Kind::Number,
                pq_parser::LiteralKind::Text => Kind::Text,
                pq_parser::LiteralKind::Logical => Kind::Logical,
                pq_parser::LiteralKind::Null => Kind::Null,
            };
            TType::primitive(primitive_kind, *kind == pq_parser::LiteralKind::Null)
        }
        _ => TType::Unknown,
    }
}

fn record_expression_type(map: &NodeIdMapCollection, record: XorNode<'_>) -> TType {
    let mut fields = FxHashMap::default();
    for child in map.iter_children_xor(record.id()) {
        if child.kind() != AstNodeKind::GeneralizedIdentifierPairedExpression {
            continue;
        }
        let pair_children = map.iter_children_xor(child.id());
        let Some(name) = pair_children.first().and_then(|n| n.as_ast()).and_then(|n| match &n.payload {
            AstPayload::GeneralizedIdentifier { name } => Some(name.clone()),
            _ => None,
        }) else {
            continue;
        };
        let value_type = pair_children
            .get(2)
            .map(|value| infer_operand(map, *value))
            .unwrap_or(TType::Unknown);
        fields.insert(name, value_type);
    }
    TType::DefinedRecord {
        fields,
        is_nullable: false,
        is_open: false,
    }
}

/// §4.7 step 2's partial-lookup path: the right operand hasn't parsed (or
/// hasn't finished) yet, so only `(leftKind, opKind)` is known.
///
/// The spec's own wording ties the singleton result's nullability to
/// `left.isNullable`, but scenario S9 (`1 +` ⇒ `Primitive(Number,
/// nullable=true)`) is only consistent with always marking a partial result
/// nullable — the expression's eventual value depends on an operand that
/// hasn't been written yet, so its nullability genuinely isn't known.
/// Resolved in favor of the scenario (see DESIGN.md); multi-result unions
/// were already specified as "each marked nullable", so this makes both
/// branches of step 2 follow the same rule.
fn partial_lookup(map: &NodeIdMapCollection, left: XorNode<'_>, op_kind: TokenKind) -> TType {
    let left_type = infer_operand(map, left);
    let Some(left_kind) = left_type.kind() else {
        return TType::Unknown;
    };

    match partial_table().get(&(left_kind, op_kind)) {
        Some(kinds) if kinds.len() == 1 => TType::primitive(kinds[0], true),
        Some(kinds) if kinds.len() > 1 => TType::AnyUnion(kinds.iter().map(|k| TType::primitive(*k, true)).collect()),
        _ => TType::Unknown,
    }
}

fn full_lookup(left: TType, right: TType, op_kind: TokenKind) -> TType {
    let (Some(left_kind), Some(right_kind)) = (left.kind(), right.kind()) else {
        return TType::Unknown;
    };

    let Some(&result_kind) = full_table().get(&(left_kind, op_kind, right_kind)) else {
        return TType::Unknown;
    };

    if op_kind == TokenKind::Ampersand && matches!(result_kind, Kind::Record | Kind::Table) {
        return combine_record_or_table(left, right, result_kind);
    }

    TType::primitive(result_kind, left.is_nullable() || right.is_nullable())
}

/// §4.7 step 4: the `&` combine rule for record/table operands.
fn combine_record_or_table(left: TType, right: TType, result_kind: Kind) -> TType {
    let left_extended = left.extended_fields();
    let right_extended = right.extended_fields();

    match (left_extended, right_extended) {
        (None, None) => TType::primitive(result_kind, left.is_nullable() || right.is_nullable()),
        (Some((fields, is_nullable, _)), None) => wrap_extended(result_kind, fields.clone(), is_nullable, true),
        (None, Some((fields, is_nullable, _))) => wrap_extended(result_kind, fields.clone(), is_nullable, true),
        (Some((left_fields, left_n, left_open)), Some((right_fields, right_n, right_open))) => {
            let mut merged = left_fields.clone();
            for (name, ty) in right_fields {
                merged.insert(name.clone(), ty.clone());
            }
            wrap_extended(result_kind, merged, left_n && right_n, left_open || right_open)
        }
    }
}

fn wrap_extended(kind: Kind, fields: FxHashMap<String, TType>, is_nullable: bool, is_open: bool) -> TType {
    match kind {
        Kind::Record => TType::DefinedRecord { fields, is_nullable, is_open },
        Kind::Table => TType::DefinedTable { fields, is_nullable, is_open },
        _ => unreachable!("combine_record_or_table only ever called with Record or Table result kinds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pq_common::Settings;
    use pq_lexer::Lexer;
    use pq_parser::parse;

    fn parse_expr(source: &str) -> pq_parser::ParseOk {
        let settings = Settings::default();
        let tokens = Lexer::tokenize(source);
        parse(&settings, tokens).unwrap_or_else(|failure| panic!("{source:?} failed to parse: {:?}", failure.fault))
    }

    fn root_expr(ok: &pq_parser::ParseOk) -> XorNode<'_> {
        let document_child = ok.map.child_ids(ok.root_id)[0];
        ok.map.get_xor(document_child).unwrap()
    }

    #[test]
    fn text_concatenation_is_not_nullable() {
        let ok = parse_expr(r#""abc" & "def""#);
        let ty = infer_bin_op_type(&ok.map, root_expr(&ok));
        assert_eq!(ty, TType::primitive(Kind::Text, false));
    }

    #[test]
    fn record_merge_produces_defined_record_union() {
        let ok = parse_expr("[a=1] & [b=2]");
        let ty = infer_bin_op_type(&ok.map, root_expr(&ok));
        match ty {
            TType::DefinedRecord { fields, is_nullable, is_open } => {
                assert!(fields.contains_key("a"));
                assert!(fields.contains_key("b"));
                assert!(!is_nullable);
                assert!(!is_open);
            }
            other => panic!("expected DefinedRecord, got {other:?}"),
        }
    }

    #[test]
    fn record_merge_is_right_biased_on_conflicting_fields() {
        let ok = parse_expr("[a=1] & [a=true]");
        let ty = infer_bin_op_type(&ok.map, root_expr(&ok));
        match ty {
            TType::DefinedRecord { fields, .. } => {
                assert_eq!(fields.get("a"), Some(&TType::primitive(Kind::Logical, false)));
            }
            other => panic!("expected DefinedRecord, got {other:?}"),
        }
    }

    #[test]
    fn comparison_of_numbers_yields_logical() {
        let ok = parse_expr("1 < 2");
        let ty = infer_bin_op_type(&ok.map, root_expr(&ok));
        assert_eq!(ty, TType::primitive(Kind::Logical, false));
    }
}
