//! Caret-driven inspection over a parsed M document: resolve a text
//! position to the node it lands on (C6), derive keyword and
//! primitive-type completions from there (C7), and infer the type of a
//! binary-operator expression (C8). Every entry point here takes a
//! `&NodeIdMapCollection` produced by `pq_parser::parse` — this crate never
//! re-parses or mutates the tree, only reads it.

pub mod active_node;
pub mod autocomplete;
pub mod binary_op;
pub mod expected_type;
pub mod ttype;

pub use active_node::{rejected_token, resolve, ActiveNode, LeafKind};
pub use autocomplete::{autocomplete, autocomplete_keyword, autocomplete_primitive_type, AutocompleteResult};
pub use binary_op::infer_bin_op_type;
pub use expected_type::expected_type;
pub use ttype::TType;
