//! M (Power Query) parser: a dual-mode node graph where finished AST nodes
//! and still-open parse contexts share a single id space, built to support
//! speculative reads and an active-node-aware inspection layer on top.
//!
//! Unlike a rowan-based green tree, a node here is never replayed from a
//! token-event log — `fast_state_backup` / `apply_fast_state_backup` roll
//! the graph back by id rather than by re-lexing, so a failed speculative
//! parse costs exactly the nodes it allocated.

pub mod context;
pub mod grammar;
pub mod node_id_map;
pub mod parser;
pub mod productions;
pub mod syntax_kind;
pub mod xor_node;

pub use context::ParseContextManager;
pub use grammar::{parse, parse_with_productions};
pub use node_id_map::{AstNode, ContextNode, NodeId, NodeIdMapCollection, XorNode};
pub use parser::{ParseFailure, ParseFault, ParseOk, ParserState};
pub use productions::{ProductionFn, Productions};
pub use syntax_kind::{AstNodeKind, AstPayload, LiteralKind};
