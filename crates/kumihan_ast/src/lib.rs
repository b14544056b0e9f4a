//! # kumihan_ast
//!
//! Document tree definitions for Kumihan.
//!
//! The tree is an index arena: every node of a document lives in one
//! [`Ast`] and is addressed by a stable [`NodeId`]. Parent, child and
//! sibling links are indices, so passes can detach and re-attach nodes in
//! O(1) without invalidating ids that other components still hold.
//!
//! ## Architecture
//!
//! - [`Ast`] owns the source buffer and the node arena
//! - [`Node`] carries a [`NodeType`] tag, a [`Span`] into the source, an
//!   optional text value and a [`NodeData`] payload
//! - [`check_integrity`] verifies that links, acyclicity and span coverage
//!   still hold after a pass has mutated the tree
//!
//! ## Example
//!
//! ```rust
//! use kumihan_ast::{Ast, Node, NodeType, Span};
//!
//! let mut ast = Ast::new("Hello");
//! let paragraph = ast.alloc(Node::new_parent(NodeType::Paragraph, Span::new(0, 5)));
//! ast.append_child(ast.root(), paragraph);
//!
//! assert!(ast.is_attached(paragraph));
//! ```

mod arena;
mod integrity;
mod node;
mod node_type;
mod span;

pub use arena::{Ast, Children, Descendants, NodeRef};
pub use integrity::{IntegrityError, check_integrity};
pub use node::{DefinitionData, DelimitedData, LinkData, Node, NodeData, NodeId, ReferenceData};
pub use node_type::NodeType;
pub use span::Span;
