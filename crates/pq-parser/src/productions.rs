//! Capability bundle (spec.md §4.3: "the production table is polymorphic
//! over the capability set... roughly one reader per grammar nonterminal").
//!
//! `ParserState` dispatches every overridable production through a
//! `Productions` value instead of calling the grammar's free functions
//! directly, so a caller can substitute an individual reader (e.g. its own
//! `read_let_expression`) without subclassing anything — there's nothing to
//! subclass in the first place. `Productions::default()` wires up the
//! grammar's built-in readers; `grammar::parse_with_productions` is the entry
//! point that takes an override bundle instead.

use crate::node_id_map::NodeId;
use crate::parser::{ParseFault, ParserState};

/// A single overridable production: read one node out of `state`, leaving
/// its context open on failure like every other production (see
/// `grammar::production`'s doc comment).
pub type ProductionFn = for<'settings> fn(&mut ParserState<'settings>) -> Result<NodeId, ParseFault>;

/// One function pointer per top-level grammar production a caller might
/// reasonably want to override. Defaults to the grammar's own readers;
/// `Copy` so dispatch sites can pull the whole bundle out of `&ParserState`
/// without holding a borrow across the call.
#[derive(Clone, Copy)]
pub struct Productions {
    pub read_document: ProductionFn,
    pub read_let_expression: ProductionFn,
    pub read_if_expression: ProductionFn,
    pub read_error_handling_expression: ProductionFn,
    pub read_error_raising_expression: ProductionFn,
    pub read_section_document: ProductionFn,
    pub read_logical_expression: ProductionFn,
    pub read_literal_expression: ProductionFn,
    pub read_identifier_expression: ProductionFn,
    pub read_list_expression: ProductionFn,
    pub read_record_expression: ProductionFn,
    pub read_type_primary_type: ProductionFn,
    pub read_parenthesized_or_function_expression: ProductionFn,
}
