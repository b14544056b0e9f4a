//! Node definition.
//!
//! A [`Node`] lives in an [`Ast`](crate::Ast) arena and is addressed by a
//! [`NodeId`]. Tree links are owned by the arena; only the payload fields
//! are public.

use serde::Serialize;

use crate::{NodeType, Span};

/// Stable index of a node inside its [`Ast`](crate::Ast).
///
/// Ids stay valid for the lifetime of the arena, including after the node
/// has been unlinked from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the arena slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the document tree.
///
/// # Example
///
/// ```rust
/// use kumihan_ast::{Ast, Node, NodeType, Span};
///
/// let mut ast = Ast::new("Hello");
/// let paragraph = ast.alloc(Node::new_parent(NodeType::Paragraph, Span::new(0, 5)));
/// let text = ast.alloc(Node::new_text(NodeType::Str, Span::new(0, 5), "Hello"));
/// ast.append_child(ast.root(), paragraph);
/// ast.append_child(paragraph, text);
///
/// assert_eq!(ast.node(text).parent(), Some(paragraph));
/// ```
#[derive(Debug, Clone)]
pub struct Node {
    /// The type of this node.
    pub node_type: NodeType,

    /// Byte span in the source text.
    pub span: Span,

    /// Text value (for text nodes like Str, Code, CodeBlock).
    pub value: Option<String>,

    /// Additional node-specific data.
    pub data: NodeData,

    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeData {
    #[default]
    None,
    Header(u8),
    List(bool),
    CodeBlock(Option<String>),
    Link(LinkData),
    Reference(ReferenceData),
    Definition(DefinitionData),
    Delimited(DelimitedData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    pub url: String,
    pub title: Option<String>,
    /// Source span of the link text or image alt text.
    pub label: Span,
    /// Decoded alt text of an image.
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceData {
    pub identifier: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionData {
    pub identifier: String,
    pub url: String,
    pub title: Option<String>,
    pub label: Option<String>,
}

/// Marker and content spans of a node built from a matched delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedData {
    pub opening_marker: Span,
    pub text: Span,
    pub closing_marker: Span,
}

impl Node {
    /// Creates a new parent node. Children are attached through the arena.
    #[inline]
    pub fn new_parent(node_type: NodeType, span: Span) -> Self {
        Self::with_value(node_type, span, None)
    }

    /// Creates a new text node with a value.
    #[inline]
    pub fn new_text(node_type: NodeType, span: Span, value: impl Into<String>) -> Self {
        Self::with_value(node_type, span, Some(value.into()))
    }

    /// Creates a new leaf node (no children, no value).
    #[inline]
    pub fn new_leaf(node_type: NodeType, span: Span) -> Self {
        Self::with_value(node_type, span, None)
    }

    /// Sets the node data, builder style.
    #[inline]
    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    fn with_value(node_type: NodeType, span: Span, value: Option<String>) -> Self {
        Self {
            node_type,
            span,
            value,
            data: NodeData::None,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    #[inline]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub const fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[inline]
    pub const fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    #[inline]
    pub const fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    #[inline]
    pub const fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Returns true if this node has children.
    #[inline]
    pub const fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Returns true if the node has no parent and no siblings.
    #[inline]
    pub const fn is_detached(&self) -> bool {
        self.parent.is_none() && self.prev_sibling.is_none() && self.next_sibling.is_none()
    }

    /// Returns the text value of this node, if any.
    #[inline]
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl NodeData {
    /// Returns the number of present (non-None) fields for serialization.
    pub(crate) fn present_field_count(&self) -> usize {
        match self {
            NodeData::None => 0,
            NodeData::Header(_) | NodeData::List(_) => 1,
            NodeData::CodeBlock(lang) => usize::from(lang.is_some()),
            NodeData::Link(link) => {
                1 + usize::from(link.title.is_some()) + usize::from(link.alt.is_some())
            }
            NodeData::Reference(reference) => 1 + usize::from(reference.label.is_some()),
            NodeData::Definition(def) => {
                2 + usize::from(def.title.is_some()) + usize::from(def.label.is_some())
            }
            NodeData::Delimited(_) => 3,
        }
    }

    /// Serializes present fields into the given struct serializer state.
    pub(crate) fn serialize_fields<S: serde::ser::SerializeStruct>(
        &self,
        state: &mut S,
    ) -> Result<(), S::Error> {
        match self {
            NodeData::None => {}
            NodeData::Header(depth) => {
                state.serialize_field("depth", depth)?;
            }
            NodeData::List(ordered) => {
                state.serialize_field("ordered", ordered)?;
            }
            NodeData::CodeBlock(lang) => {
                if let Some(l) = lang {
                    state.serialize_field("lang", l)?;
                }
            }
            NodeData::Link(link) => {
                state.serialize_field("url", &link.url)?;
                if let Some(title) = &link.title {
                    state.serialize_field("title", title)?;
                }
                if let Some(alt) = &link.alt {
                    state.serialize_field("alt", alt)?;
                }
            }
            NodeData::Reference(reference) => {
                state.serialize_field("identifier", &reference.identifier)?;
                if let Some(label) = &reference.label {
                    state.serialize_field("label", label)?;
                }
            }
            NodeData::Definition(def) => {
                state.serialize_field("identifier", &def.identifier)?;
                state.serialize_field("url", &def.url)?;
                if let Some(title) = &def.title {
                    state.serialize_field("title", title)?;
                }
                if let Some(label) = &def.label {
                    state.serialize_field("label", label)?;
                }
            }
            NodeData::Delimited(delimited) => {
                let range = |span: Span| [span.start, span.end];
                state.serialize_field("openingMarker", &range(delimited.opening_marker))?;
                state.serialize_field("text", &range(delimited.text))?;
                state.serialize_field("closingMarker", &range(delimited.closing_marker))?;
            }
        }
        Ok(())
    }

    /// Creates node data for a header.
    #[inline]
    pub const fn header(depth: u8) -> Self {
        Self::Header(depth)
    }

    /// Creates node data for a list.
    #[inline]
    pub const fn list(ordered: bool) -> Self {
        Self::List(ordered)
    }

    /// Creates node data for a link.
    pub fn link(url: impl Into<String>, title: Option<String>, label: Span) -> Self {
        Self::Link(LinkData {
            url: url.into(),
            title,
            label,
            alt: None,
        })
    }

    /// Creates node data for an image with its decoded alt text.
    pub fn image(
        url: impl Into<String>,
        title: Option<String>,
        alt: impl Into<String>,
        label: Span,
    ) -> Self {
        Self::Link(LinkData {
            url: url.into(),
            title,
            label,
            alt: Some(alt.into()),
        })
    }

    /// Creates node data for a matched delimiter pair.
    #[inline]
    pub const fn delimited(opening_marker: Span, text: Span, closing_marker: Span) -> Self {
        Self::Delimited(DelimitedData {
            opening_marker,
            text,
            closing_marker,
        })
    }

    /// Returns the link payload, if this is link data.
    pub fn as_link(&self) -> Option<&LinkData> {
        match self {
            NodeData::Link(link) => Some(link),
            _ => None,
        }
    }

    /// Returns the delimiter spans, if this is delimited data.
    pub fn as_delimited(&self) -> Option<&DelimitedData> {
        match self {
            NodeData::Delimited(delimited) => Some(delimited),
            _ => None,
        }
    }
}
