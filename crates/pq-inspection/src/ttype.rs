//! The inferred-type data model (§4.7, §6 "Produced ... Inferred TType"): a
//! tagged union across `{Primitive, AnyUnion, DefinedRecord, DefinedTable,
//! Function, Unknown}`, `is_nullable` carried on every variant that needs
//! one, mirroring the teacher's `Ty` shape (`snow-typeck/src/ty.rs`) rather
//! than a Hindley-Milner term (this core has no unification engine — see
//! DESIGN.md on the typeck crate's trim).

use rustc_hash::FxHashMap;
use serde::Serialize;

use pq_common::PrimitiveTypeConstantKind;

/// The inferred type of a `TBinOpExpression` node (or any operand feeding
/// one). `DefinedRecord`/`DefinedTable` are the "extended" forms §4.7 step 4
/// distinguishes from a bare `Primitive(Record | Table, ..)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum TType {
    /// Could not be determined — an absent operand, or a kind the operator
    /// table has no entry for. Never a panic/invariant: malformed or
    /// partially-typed input is expected, not exceptional (§4.7 contract).
    Unknown,
    Primitive {
        kind: PrimitiveTypeConstantKind,
        is_nullable: bool,
    },
    /// A partial lookup (§4.7 step 2) that admitted more than one result
    /// kind: the union of the admissible primitives, each marked nullable
    /// per spec.
    AnyUnion(Vec<TType>),
    DefinedRecord {
        fields: FxHashMap<String, TType>,
        is_nullable: bool,
        is_open: bool,
    },
    DefinedTable {
        fields: FxHashMap<String, TType>,
        is_nullable: bool,
        is_open: bool,
    },
    Function,
}

impl TType {
    pub fn primitive(kind: PrimitiveTypeConstantKind, is_nullable: bool) -> TType {
        TType::Primitive { kind, is_nullable }
    }

    /// This value's primitive "kind" for operator-table lookup, or `None`
    /// when the value isn't a single-kind operand (`AnyUnion`, `Function`,
    /// `Unknown`) and so cannot appear on either side of a binary operator
    /// lookup.
    pub fn kind(&self) -> Option<PrimitiveTypeConstantKind> {
        match self {
            TType::Primitive { kind, .. } => Some(*kind),
            TType::DefinedRecord { .. } => Some(PrimitiveTypeConstantKind::Record),
            TType::DefinedTable { .. } => Some(PrimitiveTypeConstantKind::Table),
            TType::AnyUnion(_) | TType::Function | TType::Unknown => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            TType::Primitive { is_nullable, .. }
            | TType::DefinedRecord { is_nullable, .. }
            | TType::DefinedTable { is_nullable, .. } => *is_nullable,
            TType::AnyUnion(_) | TType::Function | TType::Unknown => false,
        }
    }

    /// `Some((fields, is_nullable, is_open))` when this is an "extended"
    /// record or table value carrying field types (§4.7 step 4), as opposed
    /// to a bare `Primitive(Record | Table, ..)`.
    pub fn extended_fields(&self) -> Option<(&FxHashMap<String, TType>, bool, bool)> {
        match self {
            TType::DefinedRecord { fields, is_nullable, is_open } => Some((fields, *is_nullable, *is_open)),
            TType::DefinedTable { fields, is_nullable, is_open } => Some((fields, *is_nullable, *is_open)),
            _ => None,
        }
    }

    pub fn is_record_shaped(&self) -> bool {
        matches!(self.kind(), Some(PrimitiveTypeConstantKind::Record))
    }

    pub fn is_table_shaped(&self) -> bool {
        matches!(self.kind(), Some(PrimitiveTypeConstantKind::Table))
    }
}
