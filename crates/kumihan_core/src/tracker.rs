//! Ledger of structural changes made by post-processors.

use std::collections::HashSet;

use kumihan_ast::{Ast, NodeId};
use serde::Serialize;

use crate::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackerEventKind {
    Added,
    Removed,
}

/// One reported change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerEvent {
    pub node: NodeId,
    pub kind: TrackerEventKind,
}

/// Records nodes that post-processors insert into or remove from the tree.
///
/// Processors report every edit after performing it: a node is reported
/// added once it is linked, and reported removed once it is unlinked. The
/// tracker checks those preconditions and refuses inconsistent reports.
///
/// # Example
///
/// ```rust
/// use kumihan_ast::{Ast, Node, NodeType, Span};
/// use kumihan_core::NodeTracker;
///
/// let mut ast = Ast::new("a");
/// let text = ast.alloc(Node::new_text(NodeType::Str, Span::new(0, 1), "a"));
/// let mut tracker = NodeTracker::new();
///
/// // Not linked yet
/// assert!(tracker.node_added(&ast, text).is_err());
///
/// ast.append_child(ast.root(), text);
/// tracker.node_added(&ast, text).unwrap();
///
/// ast.unlink(text);
/// tracker.node_removed(&ast, text).unwrap();
/// assert!(tracker.was_removed(text));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeTracker {
    events: Vec<TrackerEvent>,
    removed: HashSet<NodeId>,
}

impl NodeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports that `node` was linked into the tree.
    pub fn node_added(&mut self, ast: &Ast, node: NodeId) -> Result<(), TrackerError> {
        self.check_added(ast, node)?;
        self.record(node, TrackerEventKind::Added);
        Ok(())
    }

    /// Reports `node` and its direct children as added.
    pub fn node_added_with_children(&mut self, ast: &Ast, node: NodeId) -> Result<(), TrackerError> {
        let nodes: Vec<_> = std::iter::once(node).chain(ast.children(node)).collect();
        self.added_all(ast, &nodes)
    }

    /// Reports `node` and its whole subtree as added.
    pub fn node_added_with_descendants(
        &mut self,
        ast: &Ast,
        node: NodeId,
    ) -> Result<(), TrackerError> {
        let nodes: Vec<_> = ast.descendants(node).collect();
        self.added_all(ast, &nodes)
    }

    /// Reports that `node` was unlinked from the tree.
    pub fn node_removed(&mut self, ast: &Ast, node: NodeId) -> Result<(), TrackerError> {
        self.check_detached(ast, node)?;
        self.check_not_removed(node)?;
        self.record(node, TrackerEventKind::Removed);
        Ok(())
    }

    /// Reports `node` and its direct children as removed.
    ///
    /// Only `node` itself needs to be detached; its children stay attached
    /// to it.
    pub fn node_removed_with_children(
        &mut self,
        ast: &Ast,
        node: NodeId,
    ) -> Result<(), TrackerError> {
        let nodes: Vec<_> = std::iter::once(node).chain(ast.children(node)).collect();
        self.removed_all(ast, &nodes)
    }

    /// Reports `node` and its whole subtree as removed.
    pub fn node_removed_with_descendants(
        &mut self,
        ast: &Ast,
        node: NodeId,
    ) -> Result<(), TrackerError> {
        let nodes: Vec<_> = ast.descendants(node).collect();
        self.removed_all(ast, &nodes)
    }

    /// All reported changes, in report order.
    pub fn events(&self) -> &[TrackerEvent] {
        &self.events
    }

    /// Nodes reported added, in report order.
    pub fn added(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.of_kind(TrackerEventKind::Added)
    }

    /// Nodes reported removed, in report order.
    pub fn removed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.of_kind(TrackerEventKind::Removed)
    }

    #[inline]
    pub fn was_removed(&self, node: NodeId) -> bool {
        self.removed.contains(&node)
    }

    /// Consumes the tracker, returning the event log.
    pub fn into_events(self) -> Vec<TrackerEvent> {
        self.events
    }

    fn of_kind(&self, kind: TrackerEventKind) -> impl Iterator<Item = NodeId> + '_ {
        self.events
            .iter()
            .filter(move |event| event.kind == kind)
            .map(|event| event.node)
    }

    fn added_all(&mut self, ast: &Ast, nodes: &[NodeId]) -> Result<(), TrackerError> {
        for &node in nodes {
            self.check_added(ast, node)?;
        }
        for &node in nodes {
            self.record(node, TrackerEventKind::Added);
        }
        Ok(())
    }

    /// The first node is the removed subtree root and must be detached.
    fn removed_all(&mut self, ast: &Ast, nodes: &[NodeId]) -> Result<(), TrackerError> {
        if let Some(&first) = nodes.first() {
            self.check_detached(ast, first)?;
        }
        for &node in nodes {
            self.check_not_removed(node)?;
        }
        for &node in nodes {
            self.record(node, TrackerEventKind::Removed);
        }
        Ok(())
    }

    fn check_added(&self, ast: &Ast, node: NodeId) -> Result<(), TrackerError> {
        self.check_not_removed(node)?;
        if ast.node(node).parent().is_none() {
            return Err(TrackerError::NotLinked { node });
        }
        Ok(())
    }

    fn check_detached(&self, ast: &Ast, node: NodeId) -> Result<(), TrackerError> {
        if !ast.node(node).is_detached() {
            return Err(TrackerError::NotDetached { node });
        }
        Ok(())
    }

    fn check_not_removed(&self, node: NodeId) -> Result<(), TrackerError> {
        if self.removed.contains(&node) {
            return Err(TrackerError::AlreadyRemoved { node });
        }
        Ok(())
    }

    fn record(&mut self, node: NodeId, kind: TrackerEventKind) {
        if kind == TrackerEventKind::Removed {
            self.removed.insert(node);
        }
        self.events.push(TrackerEvent { node, kind });
    }
}
