use rustc_hash::{FxHashMap, FxHashSet};

use pq_common::{CommonError, TokenRange};

use crate::syntax_kind::{AstNodeKind, AstPayload};

/// Stable integer identity shared by AST nodes and context nodes alike
/// (§3 "Entities" / GLOSSARY "XorNode" — "this unification is the central
/// design choice"). Strictly increasing in allocation order (§3 invariant 3).
pub type NodeId = u32;

/// A finished, immutable syntax node (§3 "AST node").
#[derive(Debug, Clone)]
pub struct AstNode {
    pub id: NodeId,
    pub kind: AstNodeKind,
    pub attribute_index: Option<u32>,
    pub token_range: TokenRange,
    pub payload: AstPayload,
}

/// An in-progress production (§3 "Parse-context node").
#[derive(Debug, Clone)]
pub struct ContextNode {
    pub id: NodeId,
    pub kind: AstNodeKind,
    pub token_index_start: usize,
    pub attribute_index: Option<u32>,
    pub attribute_counter: u32,
    pub maybe_parent_id: Option<NodeId>,
}

/// The dual-mode node graph (C2): every id in `parent_id_by_id` exists in
/// exactly one of `ast_node_by_id` / `context_node_by_id` (§3 invariant 1),
/// and `child_ids_by_id` is kept consistent with `parent_id_by_id` (§3
/// invariant 2) by every mutator in this module — there is no public way to
/// touch one without the other.
#[derive(Debug, Default)]
pub struct NodeIdMapCollection {
    ast_node_by_id: FxHashMap<NodeId, AstNode>,
    context_node_by_id: FxHashMap<NodeId, ContextNode>,
    parent_id_by_id: FxHashMap<NodeId, NodeId>,
    child_ids_by_id: FxHashMap<NodeId, Vec<NodeId>>,
    leaf_node_ids: FxHashSet<NodeId>,
}

/// The uniform "either AST or Context" view (C5 / GLOSSARY "XorNode").
#[derive(Debug, Clone, Copy)]
pub enum XorNode<'a> {
    Ast(&'a AstNode),
    Context(&'a ContextNode),
}

impl<'a> XorNode<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            XorNode::Ast(node) => node.id,
            XorNode::Context(node) => node.id,
        }
    }

    pub fn kind(&self) -> AstNodeKind {
        match self {
            XorNode::Ast(node) => node.kind,
            XorNode::Context(node) => node.kind,
        }
    }

    pub fn attribute_index(&self) -> Option<u32> {
        match self {
            XorNode::Ast(node) => node.attribute_index,
            XorNode::Context(node) => node.attribute_index,
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(self, XorNode::Context(_))
    }

    pub fn as_ast(&self) -> Option<&'a AstNode> {
        match self {
            XorNode::Ast(node) => Some(node),
            XorNode::Context(_) => None,
        }
    }
}

impl NodeIdMapCollection {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Lookups ──────────────────────────────────────────────────────────

    pub fn get_ast(&self, id: NodeId) -> Option<&AstNode> {
        self.ast_node_by_id.get(&id)
    }

    pub fn get_context(&self, id: NodeId) -> Option<&ContextNode> {
        self.context_node_by_id.get(&id)
    }

    pub fn get_context_mut(&mut self, id: NodeId) -> Option<&mut ContextNode> {
        self.context_node_by_id.get_mut(&id)
    }

    pub fn get_xor(&self, id: NodeId) -> Option<XorNode<'_>> {
        if let Some(node) = self.ast_node_by_id.get(&id) {
            Some(XorNode::Ast(node))
        } else {
            self.context_node_by_id.get(&id).map(XorNode::Context)
        }
    }

    pub fn get_parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent_id_by_id.get(&id).copied()
    }

    pub fn child_ids(&self, id: NodeId) -> &[NodeId] {
        self.child_ids_by_id
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn leaf_node_ids(&self) -> &FxHashSet<NodeId> {
        &self.leaf_node_ids
    }

    /// Every id currently representing an open (unfinished) production —
    /// the candidates a caret can resolve onto when no finished leaf
    /// reaches it (C6 "ContextNode" classification).
    pub fn open_context_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.context_node_by_id.keys().copied()
    }

    /// Children of `id`, as `XorNode`s, in syntactic (insertion) order
    /// (C2 "iterChildrenXor").
    pub fn iter_children_xor(&self, id: NodeId) -> Vec<XorNode<'_>> {
        self.child_ids(id)
            .iter()
            .filter_map(|child_id| self.get_xor(*child_id))
            .collect()
    }

    /// Leaf-first ancestry of `id`, i.e. `id` itself followed by each
    /// successive parent up to the root (C5 "assertGetAncestry").
    pub fn ancestry(&self, id: NodeId) -> Vec<XorNode<'_>> {
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(current_id) = current {
            match self.get_xor(current_id) {
                Some(node) => out.push(node),
                None => break,
            }
            current = self.get_parent(current_id);
        }
        out
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Register a brand-new context node with no children yet.
    pub fn insert_context(&mut self, node: ContextNode) {
        let id = node.id;
        let parent = node.maybe_parent_id;
        self.context_node_by_id.insert(id, node);
        if let Some(parent_id) = parent {
            self.parent_id_by_id.insert(id, parent_id);
            self.child_ids_by_id.entry(parent_id).or_default().push(id);
        }
        self.child_ids_by_id.entry(id).or_default();
    }

    /// Promote a context to an AST node in place: same id, same parent,
    /// same position among siblings (§3 invariant 4).
    pub fn promote_context_to_ast(&mut self, id: NodeId, ast: AstNode) -> Result<(), CommonError> {
        if self.context_node_by_id.remove(&id).is_none() {
            return Err(CommonError::Invariant(format!(
                "promote_context_to_ast: {id} is not a live context"
            )));
        }
        if ast.kind.is_leaf() {
            self.leaf_node_ids.insert(id);
        }
        self.ast_node_by_id.insert(id, ast);
        Ok(())
    }

    /// Insert `context` and wrap `wrapped_id` as its first child: `context`
    /// takes over `wrapped_id`'s old slot in its old parent's child list
    /// (the "forward-parent" pattern, C2 `replaceAncestorsChildReference`).
    ///
    /// Needed because a left-associative binary-operator chain only learns
    /// it needs a new parent for its left operand *after* that operand has
    /// already finished parsing as a sibling of where the binary node now
    /// belongs.
    pub fn wrap(&mut self, context: ContextNode, wrapped_id: NodeId) -> NodeId {
        let new_id = context.id;
        let old_parent = self.parent_id_by_id.get(&wrapped_id).copied();

        if let Some(old_parent) = old_parent {
            if let Some(siblings) = self.child_ids_by_id.get_mut(&old_parent) {
                for slot in siblings.iter_mut() {
                    if *slot == wrapped_id {
                        *slot = new_id;
                    }
                }
            }
            self.parent_id_by_id.insert(new_id, old_parent);
        }

        self.context_node_by_id.insert(new_id, context);
        self.parent_id_by_id.insert(wrapped_id, new_id);
        self.child_ids_by_id.insert(new_id, vec![wrapped_id]);
        new_id
    }

    /// Remove a live AST node, assumed to have no remaining children
    /// (used only by rollback, which deletes id-descending so children are
    /// always removed first).
    pub fn delete_ast(&mut self, id: NodeId, parent_will_be_deleted: bool) {
        self.ast_node_by_id.remove(&id);
        self.leaf_node_ids.remove(&id);
        self.detach(id, parent_will_be_deleted);
    }

    /// Remove a live context node. If `parent_will_be_deleted` is true (the
    /// rollback hint of §4.3), children are left dangling for the caller to
    /// also delete rather than reparented — the parent is about to go away
    /// too, so reparenting would be wasted work.
    pub fn delete_context(&mut self, id: NodeId, parent_will_be_deleted: bool) {
        self.context_node_by_id.remove(&id);
        self.detach(id, parent_will_be_deleted);
    }

    fn detach(&mut self, id: NodeId, parent_will_be_deleted: bool) {
        let parent_id = self.parent_id_by_id.remove(&id);
        if !parent_will_be_deleted {
            if let Some(parent_id) = parent_id {
                if let Some(siblings) = self.child_ids_by_id.get_mut(&parent_id) {
                    siblings.retain(|child| *child != id);
                }
            }
        }
        self.child_ids_by_id.remove(&id);
    }

    /// Reparent every child of `deleted_id` onto `new_parent_id`, preserving
    /// order, splicing them into `new_parent_id`'s child list at the
    /// position `deleted_id` used to occupy (§3 "Lifecycles", `deleteContext`
    /// detach-children policy). Used when a context is rolled back but its
    /// parent survives.
    ///
    /// `deleted_id` must still hold its own child-list entry and its slot in
    /// `new_parent_id`'s sibling list — i.e. this must run before (or in lieu
    /// of) a plain `detach`/`delete_context`, which would otherwise strip
    /// both before the splice gets a chance to use them. `delete_context_reparenting`
    /// is the entry point that gets this ordering right; call this directly
    /// only when `deleted_id`'s own bookkeeping is already known to be intact.
    pub fn reparent_children(&mut self, deleted_id: NodeId, new_parent_id: NodeId) {
        let orphans = self.child_ids_by_id.remove(&deleted_id).unwrap_or_default();
        for &child_id in &orphans {
            self.parent_id_by_id.insert(child_id, new_parent_id);
        }
        self.parent_id_by_id.remove(&deleted_id);

        let siblings = self.child_ids_by_id.entry(new_parent_id).or_default();
        if let Some(position) = siblings.iter().position(|id| *id == deleted_id) {
            siblings.splice(position..=position, orphans);
        } else {
            siblings.extend(orphans);
        }
    }

    /// Remove a live context node whose parent survives, reparenting its
    /// children into the slot it occupied (§3 "Lifecycles" detach-children
    /// policy). Unlike `delete_context(id, false)`, this never lets `detach`
    /// run first — `reparent_children` needs `id`'s own child list and its
    /// position in `new_parent_id`'s sibling list both still in place, and a
    /// prior `detach` call would have already erased them.
    pub fn delete_context_reparenting(&mut self, id: NodeId, new_parent_id: NodeId) {
        self.context_node_by_id.remove(&id);
        self.reparent_children(id, new_parent_id);
    }

    /// Replace a single child reference in `parent_id`'s child list,
    /// preserving position (C2 "replaceAncestorsChildReference").
    pub fn replace_ancestors_child_reference(
        &mut self,
        parent_id: NodeId,
        old_child_id: NodeId,
        new_child_id: NodeId,
    ) {
        if let Some(siblings) = self.child_ids_by_id.get_mut(&parent_id) {
            for slot in siblings.iter_mut() {
                if *slot == old_child_id {
                    *slot = new_child_id;
                }
            }
        }
        if let Some(parent) = self.parent_id_by_id.remove(&old_child_id) {
            self.parent_id_by_id.insert(new_child_id, parent);
        }
    }

    /// Every id at or above `floor`, descending, split into (ast ids,
    /// context ids) — the exact iteration order §4.3's
    /// `applyFastStateBackup` requires (AST first, descending, then context,
    /// descending). `floor` is the id counter a `fastStateBackup` captured:
    /// every id allocated at or after that moment is rolled back.
    pub fn ids_at_or_above(&self, floor: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
        let mut ast_ids: Vec<NodeId> = self
            .ast_node_by_id
            .keys()
            .copied()
            .filter(|id| *id >= floor)
            .collect();
        let mut context_ids: Vec<NodeId> = self
            .context_node_by_id
            .keys()
            .copied()
            .filter(|id| *id >= floor)
            .collect();
        ast_ids.sort_unstable_by(|a, b| b.cmp(a));
        context_ids.sort_unstable_by(|a, b| b.cmp(a));
        (ast_ids, context_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pq_common::Position;

    fn zero_range() -> TokenRange {
        TokenRange::new(Position::ZERO, Position::ZERO)
    }

    #[test]
    fn insert_context_links_parent_and_child() {
        let mut map = NodeIdMapCollection::new();
        map.insert_context(ContextNode {
            id: 0,
            kind: AstNodeKind::Document,
            token_index_start: 0,
            attribute_index: None,
            attribute_counter: 0,
            maybe_parent_id: None,
        });
        map.insert_context(ContextNode {
            id: 1,
            kind: AstNodeKind::LetExpression,
            token_index_start: 0,
            attribute_index: Some(0),
            attribute_counter: 0,
            maybe_parent_id: Some(0),
        });

        assert_eq!(map.get_parent(1), Some(0));
        assert_eq!(map.child_ids(0), &[1]);
    }

    #[test]
    fn promote_context_to_ast_keeps_same_id_and_parent() {
        let mut map = NodeIdMapCollection::new();
        map.insert_context(ContextNode {
            id: 0,
            kind: AstNodeKind::Document,
            token_index_start: 0,
            attribute_index: None,
            attribute_counter: 0,
            maybe_parent_id: None,
        });
        map.insert_context(ContextNode {
            id: 1,
            kind: AstNodeKind::Identifier,
            token_index_start: 0,
            attribute_index: Some(0),
            attribute_counter: 0,
            maybe_parent_id: Some(0),
        });

        map.promote_context_to_ast(
            1,
            AstNode {
                id: 1,
                kind: AstNodeKind::Identifier,
                attribute_index: Some(0),
                token_range: zero_range(),
                payload: AstPayload::Identifier {
                    name: "x".to_string(),
                },
            },
        )
        .unwrap();

        assert!(map.get_context(1).is_none());
        assert!(map.get_ast(1).is_some());
        assert_eq!(map.get_parent(1), Some(0));
        assert_eq!(map.child_ids(0), &[1]);
        assert!(map.leaf_node_ids().contains(&1));
    }

    #[test]
    fn reparent_children_preserves_order_and_position() {
        let mut map = NodeIdMapCollection::new();
        map.insert_context(ContextNode {
            id: 0,
            kind: AstNodeKind::Document,
            token_index_start: 0,
            attribute_index: None,
            attribute_counter: 0,
            maybe_parent_id: None,
        });
        // Root has children [A=1, Deleted=2, B=3].
        for (id, attr) in [(1u32, 0u32), (2, 1), (3, 2)] {
            map.insert_context(ContextNode {
                id,
                kind: AstNodeKind::Identifier,
                token_index_start: 0,
                attribute_index: Some(attr),
                attribute_counter: 0,
                maybe_parent_id: Some(0),
            });
        }
        // Deleted (id 2) has children [C=4, D=5].
        for id in [4u32, 5] {
            map.insert_context(ContextNode {
                id,
                kind: AstNodeKind::Identifier,
                token_index_start: 0,
                attribute_index: None,
                attribute_counter: 0,
                maybe_parent_id: Some(2),
            });
        }

        map.delete_context_reparenting(2, 0);

        assert_eq!(map.child_ids(0), &[1, 4, 5, 3]);
        assert_eq!(map.get_parent(4), Some(0));
        assert_eq!(map.get_parent(5), Some(0));
        assert!(map.get_parent(2).is_none());
        assert!(map.get_context(2).is_none());
    }

    #[test]
    fn ids_above_returns_descending_ast_then_context() {
        let mut map = NodeIdMapCollection::new();
        map.insert_context(ContextNode {
            id: 0,
            kind: AstNodeKind::Document,
            token_index_start: 0,
            attribute_index: None,
            attribute_counter: 0,
            maybe_parent_id: None,
        });
        map.insert_context(ContextNode {
            id: 1,
            kind: AstNodeKind::Identifier,
            token_index_start: 0,
            attribute_index: Some(0),
            attribute_counter: 0,
            maybe_parent_id: Some(0),
        });
        map.promote_context_to_ast(
            1,
            AstNode {
                id: 1,
                kind: AstNodeKind::Identifier,
                attribute_index: Some(0),
                token_range: zero_range(),
                payload: AstPayload::None,
            },
        )
        .unwrap();
        map.insert_context(ContextNode {
            id: 2,
            kind: AstNodeKind::Identifier,
            token_index_start: 1,
            attribute_index: Some(1),
            attribute_counter: 0,
            maybe_parent_id: Some(0),
        });

        let (ast_ids, context_ids) = map.ids_at_or_above(1);
        assert_eq!(ast_ids, vec![1]);
        assert_eq!(context_ids, vec![2]);
    }
}
