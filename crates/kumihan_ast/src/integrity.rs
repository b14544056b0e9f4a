//! Structural consistency checks.

use std::collections::HashSet;

use thiserror::Error;

use crate::{Ast, NodeId, Span};

/// A broken tree invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A child does not point back at the parent that lists it.
    #[error("node {child} is listed under {parent} but its parent link is {actual:?}")]
    ParentMismatch {
        parent: NodeId,
        child: NodeId,
        actual: Option<NodeId>,
    },

    /// Sibling links disagree with the parent's child order.
    #[error("sibling links of {node} are inconsistent")]
    SiblingMismatch { node: NodeId },

    /// The parent's last-child link does not match its actual last child.
    #[error("last child link of {node} is inconsistent")]
    LastChildMismatch { node: NodeId },

    /// A node is reachable twice, which means a cycle or a shared node.
    #[error("node {node} is reachable more than once")]
    Revisited { node: NodeId },

    /// A child's span escapes its parent's span.
    #[error("span {child_span:?} of {child} is not covered by span {parent_span:?} of {parent}")]
    SpanNotCovered {
        parent: NodeId,
        parent_span: Span,
        child: NodeId,
        child_span: Span,
    },
}

/// Verifies link consistency, acyclicity and span coverage for every node
/// reachable from the root.
///
/// Returns the set of reachable nodes on success.
pub fn check_integrity(ast: &Ast) -> Result<HashSet<NodeId>, IntegrityError> {
    let mut visited = HashSet::new();
    let mut pending = vec![ast.root()];

    if ast.node(ast.root()).parent().is_some() {
        return Err(IntegrityError::SiblingMismatch { node: ast.root() });
    }

    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            return Err(IntegrityError::Revisited { node: id });
        }

        let node = ast.node(id);
        let mut prev: Option<NodeId> = None;
        let mut cursor = node.first_child();
        while let Some(child_id) = cursor {
            if visited.contains(&child_id) || pending.contains(&child_id) {
                return Err(IntegrityError::Revisited { node: child_id });
            }

            let child = ast.node(child_id);
            if child.parent() != Some(id) {
                return Err(IntegrityError::ParentMismatch {
                    parent: id,
                    child: child_id,
                    actual: child.parent(),
                });
            }
            if child.prev_sibling() != prev {
                return Err(IntegrityError::SiblingMismatch { node: child_id });
            }
            if !node.span.covers(&child.span) {
                return Err(IntegrityError::SpanNotCovered {
                    parent: id,
                    parent_span: node.span,
                    child: child_id,
                    child_span: child.span,
                });
            }

            pending.push(child_id);
            prev = Some(child_id);
            cursor = child.next_sibling();
        }

        if node.last_child() != prev {
            return Err(IntegrityError::LastChildMismatch { node: id });
        }
    }

    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, NodeType};

    fn sample() -> (Ast, NodeId, NodeId) {
        let mut ast = Ast::new("hello");
        let paragraph = ast.alloc(Node::new_parent(NodeType::Paragraph, Span::new(0, 5)));
        let text = ast.alloc(Node::new_text(NodeType::Str, Span::new(0, 5), "hello"));
        ast.append_child(ast.root(), paragraph);
        ast.append_child(paragraph, text);
        (ast, paragraph, text)
    }

    #[test]
    fn test_valid_tree() {
        let (ast, paragraph, text) = sample();
        let reachable = check_integrity(&ast).unwrap();

        assert_eq!(reachable.len(), 3);
        assert!(reachable.contains(&paragraph));
        assert!(reachable.contains(&text));
    }

    #[test]
    fn test_unlinked_nodes_are_not_reachable() {
        let (mut ast, paragraph, text) = sample();
        ast.unlink(paragraph);
        let reachable = check_integrity(&ast).unwrap();

        assert_eq!(reachable.len(), 1);
        assert!(!reachable.contains(&text));
    }

    #[test]
    fn test_parent_mismatch() {
        let (mut ast, paragraph, text) = sample();
        ast.node_mut(text).parent = None;

        assert_eq!(
            check_integrity(&ast),
            Err(IntegrityError::ParentMismatch {
                parent: paragraph,
                child: text,
                actual: None,
            })
        );
    }

    #[test]
    fn test_last_child_mismatch() {
        let (mut ast, paragraph, _) = sample();
        ast.node_mut(paragraph).last_child = None;

        assert_eq!(
            check_integrity(&ast),
            Err(IntegrityError::LastChildMismatch { node: paragraph })
        );
    }

    #[test]
    fn test_span_not_covered() {
        let (mut ast, paragraph, text) = sample();
        ast.node_mut(text).span = Span::new(0, 6);

        assert!(matches!(
            check_integrity(&ast),
            Err(IntegrityError::SpanNotCovered { parent, child, .. })
                if parent == paragraph && child == text
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let (mut ast, paragraph, text) = sample();
        // Make the paragraph its own grandchild
        ast.node_mut(text).first_child = Some(paragraph);
        ast.node_mut(text).last_child = Some(paragraph);

        assert!(matches!(
            check_integrity(&ast),
            Err(IntegrityError::Revisited { .. }) | Err(IntegrityError::ParentMismatch { .. })
        ));
    }
}
