//! Index arena holding the document tree.
//!
//! All nodes of one document live in a single `Vec` owned by [`Ast`] and are
//! addressed by [`NodeId`]. Unlinking a node only clears its own parent and
//! sibling links; the slot stays allocated until the arena is dropped, so ids
//! held by trackers or processors never dangle.

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

use crate::{Node, NodeId, NodeType, Span};

/// A parsed document: the source buffer plus its node arena.
///
/// # Example
///
/// ```rust
/// use kumihan_ast::{Ast, Node, NodeType, Span};
///
/// let mut ast = Ast::new("ab");
/// let a = ast.alloc(Node::new_text(NodeType::Str, Span::new(0, 1), "a"));
/// let b = ast.alloc(Node::new_text(NodeType::Str, Span::new(1, 2), "b"));
/// ast.append_child(ast.root(), a);
/// ast.insert_after(a, b);
///
/// let texts: Vec<_> = ast
///     .children(ast.root())
///     .filter_map(|id| ast.node(id).text())
///     .collect();
/// assert_eq!(texts, ["a", "b"]);
/// ```
#[derive(Debug, Clone)]
pub struct Ast {
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    /// Creates an arena whose root is a `Document` node spanning `source`.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let root = Node::new_parent(NodeType::Document, Span::new(0, source.len() as u32));
        Self {
            source,
            nodes: vec![root],
            root: NodeId::new(0),
        }
    }

    /// Returns the source buffer every span points into.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the source text covered by `span`.
    #[inline]
    pub fn slice(&self, span: Span) -> &str {
        self.source.get(span.range()).unwrap_or("")
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of allocated slots, linked or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached node and returns its id.
    pub fn alloc(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.first_child = None;
        node.last_child = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Returns every allocated id in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// A linked `child` is unlinked from its current position first, so this
    /// doubles as a re-parenting operation.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child, "a node cannot be its own child");
        self.unlink(child);

        let last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = Some(parent);
            node.prev_sibling = last;
        }
        match last {
            Some(last) => self.nodes[last.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
    }

    /// Inserts `new` directly after `anchor`, under the same parent.
    pub fn insert_after(&mut self, anchor: NodeId, new: NodeId) {
        debug_assert_ne!(anchor, new, "a node cannot be its own sibling");
        self.unlink(new);

        let parent = self.nodes[anchor.index()].parent;
        let next = self.nodes[anchor.index()].next_sibling;
        {
            let node = &mut self.nodes[new.index()];
            node.parent = parent;
            node.prev_sibling = Some(anchor);
            node.next_sibling = next;
        }
        self.nodes[anchor.index()].next_sibling = Some(new);
        match next {
            Some(next) => self.nodes[next.index()].prev_sibling = Some(new),
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].last_child = Some(new);
                }
            }
        }
    }

    /// Inserts `new` directly before `anchor`, under the same parent.
    pub fn insert_before(&mut self, anchor: NodeId, new: NodeId) {
        debug_assert_ne!(anchor, new, "a node cannot be its own sibling");
        self.unlink(new);

        let parent = self.nodes[anchor.index()].parent;
        let prev = self.nodes[anchor.index()].prev_sibling;
        {
            let node = &mut self.nodes[new.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = Some(anchor);
        }
        self.nodes[anchor.index()].prev_sibling = Some(new);
        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = Some(new),
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].first_child = Some(new);
                }
            }
        }
    }

    /// Detaches `id` from its parent and siblings in O(1).
    ///
    /// The node keeps its own children, so a detached subtree stays intact.
    pub fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[id.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };

        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.nodes[next.index()].prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].last_child = prev;
                }
            }
        }

        let node = &mut self.nodes[id.index()];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Iterates over the direct children of `id`.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            ast: self,
            next: self.nodes[id.index()].first_child,
        }
    }

    /// Iterates over `id` and its descendants in document (pre-)order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            ast: self,
            start: id,
            next: Some(id),
        }
    }

    /// Iterates over the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.index()].parent, |p| {
            self.nodes[p.index()].parent
        })
    }

    /// Returns true if `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).last() == Some(self.root)
    }

    /// Returns the topmost ancestor of `id` (itself when detached).
    pub fn subtree_root(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Concatenates the text values of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|n| self.node(n).text())
            .collect()
    }

    /// Returns a serializable view of the subtree rooted at `id`.
    pub fn view(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { ast: self, id }
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.ast.node(current).next_sibling;
        Some(current)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    ast: &'a Ast,
    start: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        let node = self.ast.node(current);

        self.next = if let Some(child) = node.first_child {
            Some(child)
        } else {
            let mut cursor = current;
            loop {
                if cursor == self.start {
                    break None;
                }
                let n = self.ast.node(cursor);
                if let Some(sibling) = n.next_sibling {
                    break Some(sibling);
                }
                match n.parent {
                    Some(parent) => cursor = parent,
                    None => break None,
                }
            }
        };

        Some(current)
    }
}

/// Borrowed view of one node, serialized in the TxtAST-like
/// `{ type, range, children, value, ... }` shape.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    ast: &'a Ast,
    id: NodeId,
}

struct ChildrenRef<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl Serialize for ChildrenRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.ast.children(self.id).map(|id| NodeRef { ast: self.ast, id }))
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.ast.node(self.id);
        let has_children = node.node_type.is_parent() || node.has_children();

        let mut len = 2; // type, range
        if has_children {
            len += 1;
        }
        if node.value.is_some() {
            len += 1;
        }
        len += node.data.present_field_count();

        let mut state = serializer.serialize_struct("Node", len)?;
        state.serialize_field("type", &node.node_type)?;
        state.serialize_field("range", &[node.span.start, node.span.end])?;
        if has_children {
            state.serialize_field(
                "children",
                &ChildrenRef {
                    ast: self.ast,
                    id: self.id,
                },
            )?;
        }
        if let Some(value) = &node.value {
            state.serialize_field("value", value)?;
        }
        node.data.serialize_fields(&mut state)?;
        state.end()
    }
}

impl Serialize for Ast {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view(self.root).serialize(serializer)
    }
}
