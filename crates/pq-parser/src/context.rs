//! Parse-context lifecycle (C3): `start_context` / `end_context` /
//! `delete_context`, the three operations that grow and shrink the live
//! node graph as a production is attempted (§3 "Lifecycles").

use pq_common::{CommonError, TokenRange};

use crate::node_id_map::{AstNode, ContextNode, NodeId, NodeIdMapCollection};
use crate::syntax_kind::AstNodeKind;

/// Owns the node-id map plus the bookkeeping needed to grow/shrink it:
/// the monotonic id counter and the id of the context currently being
/// built (§3 "Entities", "currentContextId").
#[derive(Debug, Default)]
pub struct ParseContextManager {
    map: NodeIdMapCollection,
    next_id: NodeId,
    pub current_context_id: Option<NodeId>,
    root_context_id: Option<NodeId>,
}

impl ParseContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> &NodeIdMapCollection {
        &self.map
    }

    pub fn into_map(self) -> NodeIdMapCollection {
        self.map
    }

    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    pub fn root_context_id(&self) -> Option<NodeId> {
        self.root_context_id
    }

    /// Begin a new production: allocate the next id, attach it as a child
    /// of `current_context_id`, and make it current (§3 "startContext").
    pub fn start_context(&mut self, kind: AstNodeKind, token_index_start: usize) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;

        let attribute_index = self.current_context_id.map(|parent_id| {
            let attribute_index = self
                .map
                .get_context(parent_id)
                .map(|parent| parent.attribute_counter)
                .unwrap_or(0);
            if let Some(parent) = self.map.get_context_mut(parent_id) {
                parent.attribute_counter += 1;
            }
            attribute_index
        });

        self.map.insert_context(ContextNode {
            id,
            kind,
            token_index_start,
            attribute_index,
            attribute_counter: 0,
            maybe_parent_id: self.current_context_id,
        });

        if self.current_context_id.is_none() {
            self.root_context_id = Some(id);
        }
        self.current_context_id = Some(id);
        id
    }

    /// Begin a new production that takes over an already-finished node's
    /// position (the forward-parent pattern a left-associative
    /// binary-operator chain needs: by the time an operator token reveals
    /// the left operand needs a new parent, that operand is already
    /// built). `wrapped_id`'s old attribute index is reused for the new
    /// context, since it occupies the same slot in the grandparent.
    pub fn wrap_context(&mut self, kind: AstNodeKind, wrapped_id: NodeId, token_index_start: usize) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;

        let attribute_index = self.map.get_xor(wrapped_id).and_then(|node| node.attribute_index());
        let wrapped_was_root = self.root_context_id == Some(wrapped_id) || self.map.get_parent(wrapped_id).is_none();

        let new_id = self.map.wrap(
            ContextNode {
                id,
                kind,
                token_index_start,
                attribute_index,
                attribute_counter: 1,
                maybe_parent_id: self.map.get_parent(wrapped_id),
            },
            wrapped_id,
        );

        if wrapped_was_root {
            self.root_context_id = Some(new_id);
        }
        self.current_context_id = Some(new_id);
        new_id
    }

    /// Finish the current production: promote it to an AST node in place
    /// (same id, per §3 invariant 4) and restore the parent as current
    /// (§3 "endContext").
    pub fn end_context(
        &mut self,
        token_range: TokenRange,
        payload: crate::syntax_kind::AstPayload,
    ) -> Result<NodeId, CommonError> {
        let context_id = self.current_context_id.ok_or_else(|| {
            pq_common::error::invariant_error("end_context called with no open context")
        })?;
        let kind = self
            .map
            .get_context(context_id)
            .ok_or_else(|| {
                pq_common::error::invariant_error(format!(
                    "end_context: {context_id} is not a live context"
                ))
            })?
            .kind;
        let attribute_index = self.map.get_context(context_id).unwrap().attribute_index;

        self.map.promote_context_to_ast(
            context_id,
            AstNode {
                id: context_id,
                kind,
                attribute_index,
                token_range,
                payload,
            },
        )?;

        self.current_context_id = self.map.get_parent(context_id);
        Ok(context_id)
    }

    /// Abandon the current production: it failed to parse. Its children
    /// are spliced into its parent's child list in its place (§3
    /// "deleteContext" detach-children policy), unless the caller knows the
    /// parent is also about to be rolled back, in which case reparenting
    /// would be wasted work.
    pub fn delete_context(&mut self, parent_will_be_deleted: bool) -> Result<NodeId, CommonError> {
        let context_id = self.current_context_id.ok_or_else(|| {
            pq_common::error::invariant_error("delete_context called with no open context")
        })?;
        let parent_id = self.map.get_parent(context_id);

        match (parent_will_be_deleted, parent_id) {
            (false, Some(parent_id)) => self.map.delete_context_reparenting(context_id, parent_id),
            _ => self.map.delete_context(context_id, parent_will_be_deleted),
        }

        self.current_context_id = parent_id;
        if self.root_context_id == Some(context_id) {
            self.root_context_id = None;
        }
        Ok(context_id)
    }

    /// Delete every node with id at or above `floor`, AST ids first then
    /// context ids, each in descending order (used only by `fastStateBackup`
    /// restoration, where everything allocated since the backup is being
    /// discarded together). `floor` is the id counter value the backup
    /// captured.
    ///
    /// Deletion always detaches from whatever the node's *current* parent
    /// is (rather than hinting `parentWillBeDeleted`): a failed production
    /// may already have reparented its survivors onto an ancestor that sits
    /// below `floor` and so is not itself being deleted here, and that
    /// ancestor's child list must not be left pointing at a dead id.
    pub fn delete_subtree_above(&mut self, floor: NodeId) {
        let (ast_ids, context_ids) = self.map.ids_at_or_above(floor);
        for id in ast_ids {
            self.map.delete_ast(id, false);
        }
        for id in context_ids {
            self.map.delete_context(id, false);
        }
        self.next_id = floor;
        if let Some(current) = self.current_context_id {
            if current >= floor {
                self.current_context_id = self.map.get_parent(current).filter(|p| *p < floor);
            }
        }
        if self.root_context_id.is_some_and(|id| id >= floor) {
            self.root_context_id = None;
        }
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
    fn start_then_end_context_promotes_same_id() {
        let mut manager = ParseContextManager::new();
        let id = manager.start_context(AstNodeKind::Document, 0);
        assert_eq!(manager.current_context_id, Some(id));

        let ended_id = manager
            .end_context(zero_range(), crate::syntax_kind::AstPayload::None)
            .unwrap();
        assert_eq!(ended_id, id);
        assert!(manager.map().get_ast(id).is_some());
        assert_eq!(manager.current_context_id, None);
    }

    #[test]
    fn delete_context_reparents_children_to_grandparent() {
        let mut manager = ParseContextManager::new();
        let root = manager.start_context(AstNodeKind::Document, 0);
        let failing = manager.start_context(AstNodeKind::IfExpression, 0);
        let surviving_child = manager.start_context(AstNodeKind::Identifier, 0);
        manager
            .end_context(zero_range(), crate::syntax_kind::AstPayload::None)
            .unwrap();
        assert_eq!(manager.current_context_id, Some(failing));

        manager.delete_context(false).unwrap();

        assert_eq!(manager.current_context_id, Some(root));
        assert_eq!(manager.map().get_parent(surviving_child), Some(root));
        assert_eq!(manager.map().child_ids(root), &[surviving_child]);
    }

    #[test]
    fn delete_subtree_above_resets_id_counter() {
        let mut manager = ParseContextManager::new();
        let root = manager.start_context(AstNodeKind::Document, 0);
        manager.start_context(AstNodeKind::Identifier, 0);
        manager.start_context(AstNodeKind::Identifier, 0);
        assert_eq!(manager.next_id(), 3);

        manager.delete_subtree_above(root + 1);

        assert_eq!(manager.next_id(), root + 1);
        assert_eq!(manager.current_context_id, Some(root));
        assert!(manager.map().child_ids(root).is_empty());
    }
}
