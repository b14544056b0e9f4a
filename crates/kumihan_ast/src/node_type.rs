//! Node type tags.

use serde::{Deserialize, Serialize};

/// Type tag carried by every node in the tree.
///
/// Post-processors declare their interest in terms of these tags, and the
/// dispatcher routes nodes to processors by tag rather than by inspecting
/// node payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub enum NodeType {
    // Document structure
    /// Root document node.
    Document,

    // Block elements
    /// Paragraph containing inline content.
    Paragraph,
    /// Header/Heading (H1-H6).
    Header,
    /// Block quote.
    BlockQuote,
    /// Ordered or unordered list.
    List,
    /// Item in a list.
    ListItem,
    /// Fenced or indented code block.
    CodeBlock,
    /// Horizontal rule / thematic break.
    HorizontalRule,
    /// Raw HTML.
    Html,

    // Inline elements
    /// Plain text string.
    Str,
    /// Soft or hard line break.
    Break,
    /// Emphasis (italic).
    Emphasis,
    /// Strong emphasis (bold).
    Strong,
    /// Strikethrough text.
    Delete,
    /// Underlined (inserted) text.
    Underline,
    /// Inline code.
    Code,
    /// Hyperlink.
    Link,
    /// Image.
    Image,

    // Reference elements
    /// Link reference.
    LinkReference,
    /// Image reference.
    ImageReference,
    /// Reference definition.
    Definition,

    // Extension elements (GFM, etc.)
    /// Table (GFM).
    Table,
    /// Table row (GFM).
    TableRow,
    /// Table cell (GFM).
    TableCell,
    /// Footnote definition.
    FootnoteDefinition,
    /// Footnote reference.
    FootnoteReference,
}

impl NodeType {
    /// Returns true if this node type can contain children.
    #[inline]
    pub const fn is_parent(&self) -> bool {
        matches!(
            self,
            NodeType::Document
                | NodeType::Paragraph
                | NodeType::Header
                | NodeType::BlockQuote
                | NodeType::List
                | NodeType::ListItem
                | NodeType::Emphasis
                | NodeType::Strong
                | NodeType::Delete
                | NodeType::Underline
                | NodeType::Link
                | NodeType::LinkReference
                | NodeType::Table
                | NodeType::TableRow
                | NodeType::TableCell
                | NodeType::FootnoteDefinition
        )
    }

    /// Returns true if this node type carries a text value.
    #[inline]
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            NodeType::Str | NodeType::Code | NodeType::CodeBlock | NodeType::Html
        )
    }

    /// Returns true if nodes of this type are produced by pairing delimiter runs.
    #[inline]
    pub const fn is_delimited(&self) -> bool {
        matches!(
            self,
            NodeType::Emphasis | NodeType::Strong | NodeType::Delete | NodeType::Underline
        )
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Use the same casing as serde serialization
        let name = match self {
            NodeType::Document => "Document",
            NodeType::Paragraph => "Paragraph",
            NodeType::Header => "Header",
            NodeType::BlockQuote => "BlockQuote",
            NodeType::List => "List",
            NodeType::ListItem => "ListItem",
            NodeType::CodeBlock => "CodeBlock",
            NodeType::HorizontalRule => "HorizontalRule",
            NodeType::Html => "Html",
            NodeType::Str => "Str",
            NodeType::Break => "Break",
            NodeType::Emphasis => "Emphasis",
            NodeType::Strong => "Strong",
            NodeType::Delete => "Delete",
            NodeType::Underline => "Underline",
            NodeType::Code => "Code",
            NodeType::Link => "Link",
            NodeType::Image => "Image",
            NodeType::LinkReference => "LinkReference",
            NodeType::ImageReference => "ImageReference",
            NodeType::Definition => "Definition",
            NodeType::Table => "Table",
            NodeType::TableRow => "TableRow",
            NodeType::TableCell => "TableCell",
            NodeType::FootnoteDefinition => "FootnoteDefinition",
            NodeType::FootnoteReference => "FootnoteReference",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NodeType::Emphasis)]
    #[case(NodeType::Strong)]
    #[case(NodeType::Delete)]
    #[case(NodeType::Underline)]
    fn test_delimited_types_are_parents(#[case] node_type: NodeType) {
        assert!(node_type.is_delimited());
        assert!(node_type.is_parent());
        assert!(!node_type.is_text());
    }

    #[test]
    fn test_is_text() {
        assert!(NodeType::Str.is_text());
        assert!(NodeType::Code.is_text());
        assert!(!NodeType::Paragraph.is_text());
        assert!(!NodeType::Link.is_text());
    }

    #[test]
    fn test_image_is_leaf() {
        // Image keeps its label as alt text, not as children
        assert!(!NodeType::Image.is_parent());
        assert!(NodeType::Link.is_parent());
    }

    #[test]
    fn test_display_matches_serde() {
        for node_type in [
            NodeType::Document,
            NodeType::Str,
            NodeType::Underline,
            NodeType::FootnoteReference,
        ] {
            let json = serde_json::to_string(&node_type).unwrap();
            assert_eq!(json, format!("\"{}\"", node_type));
        }
    }
}
