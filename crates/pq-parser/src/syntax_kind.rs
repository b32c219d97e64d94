use pq_common::{PrimitiveTypeConstantKind, TokenKind};
use serde::Serialize;

/// The closed AST-node-kind enumeration (§3 "AST node").
///
/// spec.md describes ~80 kinds in the full M grammar; SPEC_FULL.md §2
/// narrows the concrete productions this workspace implements to the
/// subset needed to exercise every inspection algorithm and every §8
/// scenario. Every kind here is a *real* grammar production, not a
/// placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AstNodeKind {
    Document,

    LetExpression,
    IfExpression,
    ErrorHandlingExpression,
    ErrorRaisingExpression,

    FunctionExpression,
    ParameterList,
    Parameter,

    ListExpression,
    RecordExpression,

    SectionDocument,
    SectionMember,

    NullablePrimitiveType,
    TypePrimaryType,
    PrimitiveType,

    IdentifierExpression,
    Identifier,
    GeneralizedIdentifier,
    IdentifierPairedExpression,
    GeneralizedIdentifierPairedExpression,

    LiteralExpression,
    Constant,
    ParenthesizedExpression,

    // ── TBinOpExpression variants (§3, §4.7) ────────────────────────────
    LogicalExpression,
    IsExpression,
    AsExpression,
    EqualityExpression,
    RelationalExpression,
    ArithmeticExpression,
    MetadataExpression,
    UnaryExpression,
}

impl AstNodeKind {
    /// Whether this kind is one of the `TBinOpExpression` variants (§3,
    /// §4.7's "Given an XorNode whose kind is any TBinOpExpression
    /// variant").
    pub fn is_bin_op_expression(self) -> bool {
        matches!(
            self,
            AstNodeKind::LogicalExpression
                | AstNodeKind::IsExpression
                | AstNodeKind::AsExpression
                | AstNodeKind::EqualityExpression
                | AstNodeKind::RelationalExpression
                | AstNodeKind::ArithmeticExpression
                | AstNodeKind::MetadataExpression
        )
    }

    /// Whether a finished AST node of this kind is always a leaf (§3
    /// invariant 6, "leafNodeIds contains exactly the ids of terminal AST
    /// nodes").
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            AstNodeKind::Constant
                | AstNodeKind::Identifier
                | AstNodeKind::GeneralizedIdentifier
                | AstNodeKind::LiteralExpression
                | AstNodeKind::PrimitiveType
        )
    }
}

/// The literal sub-kind carried by a `LiteralExpression` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiteralKind {
    Number,
    Text,
    Logical,
    Null,
}

/// Kind-specific data carried by a finished AST node (§3 "AST node ...
/// kind-specific payload"). Most node kinds carry no payload of their own
/// beyond their children (looked up through the node-id map); only true
/// leaves need one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AstPayload {
    None,
    Constant { token_kind: TokenKind, text: String },
    Identifier { name: String },
    GeneralizedIdentifier { name: String },
    Literal { kind: LiteralKind, text: String },
    PrimitiveType { kind: PrimitiveTypeConstantKind },
}
