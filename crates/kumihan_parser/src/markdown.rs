//! Markdown parser using markdown-rs (wooorm/markdown-rs).
//!
//! markdown-rs handles block structure and every inline construct except
//! delimiter runs: attention (`*`, `_`) and GFM strikethrough (`~`) are
//! switched off so those characters reach the tree as plain text. The
//! converted tree is then handed to [`resolve_delimiters`].

use std::sync::Arc;

use kumihan_ast::{Ast, DefinitionData, Node, NodeData, NodeId, NodeType, ReferenceData, Span};
use markdown::mdast;
use markdown::{ParseOptions, to_mdast};
use tracing::debug;

use crate::inline::{DelimiterProcessors, resolve_delimiters};
use crate::{ParseError, Parser};

/// Markdown parser implementation.
///
/// Uses `markdown-rs` for CommonMark and GFM block parsing, and the
/// configured [`DelimiterProcessors`] for emphasis-like inline markup.
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    delimiters: Arc<DelimiterProcessors>,
}

impl MarkdownParser {
    /// Creates a Markdown parser with the built-in delimiter processors.
    pub fn new() -> Self {
        Self::with_delimiters(Arc::new(DelimiterProcessors::builtin()))
    }

    /// Creates a Markdown parser with a custom delimiter registry.
    pub fn with_delimiters(delimiters: Arc<DelimiterProcessors>) -> Self {
        Self { delimiters }
    }

    /// Returns the delimiter registry used for inline markup.
    pub fn delimiters(&self) -> &DelimiterProcessors {
        &self.delimiters
    }

    /// GFM options with delimiter-based constructs disabled.
    fn default_options() -> ParseOptions {
        let mut options = ParseOptions::gfm();
        options.constructs.attention = false;
        options.constructs.gfm_strikethrough = false;
        options
    }

    /// Converts an mdast node and appends it under `parent`.
    fn convert_node(&self, ast: &mut Ast, node: &mdast::Node, parent: NodeId) {
        use mdast::Node as Md;

        let id = match node {
            Md::Root(root) => {
                self.convert_children(ast, &root.children, parent);
                return;
            }

            Md::Paragraph(para) => {
                self.create_parent_node(ast, node, &para.children, NodeType::Paragraph)
            }

            Md::Heading(heading) => {
                let id =
                    self.create_parent_node(ast, node, &heading.children, NodeType::Header);
                ast.node_mut(id).data = NodeData::header(heading.depth);
                id
            }

            Md::Text(text) => self.create_text_node(ast, node, &text.value, NodeType::Str),

            Md::Emphasis(em) => {
                self.create_parent_node(ast, node, &em.children, NodeType::Emphasis)
            }

            Md::Strong(strong) => {
                self.create_parent_node(ast, node, &strong.children, NodeType::Strong)
            }

            Md::Delete(del) => {
                self.create_parent_node(ast, node, &del.children, NodeType::Delete)
            }

            Md::InlineCode(code) => {
                self.create_text_node(ast, node, &code.value, NodeType::Code)
            }

            Md::Code(code) => {
                let id = self.create_text_node(ast, node, &code.value, NodeType::CodeBlock);
                ast.node_mut(id).data = NodeData::CodeBlock(code.lang.clone());
                id
            }

            Md::Link(link) => {
                let id = self.create_parent_node(ast, node, &link.children, NodeType::Link);
                let span = ast.node(id).span;
                let label = ast
                    .children(id)
                    .map(|child| ast.node(child).span)
                    .reduce(|a, b| a.merge(&b))
                    .unwrap_or_else(|| Span::empty((span.start + 1).min(span.end)));
                ast.node_mut(id).data = NodeData::link(&link.url, link.title.clone(), label);
                id
            }

            Md::Image(image) => {
                let id = self.create_leaf_node(ast, node, NodeType::Image);
                let span = ast.node(id).span;
                let label = alt_span(ast, span);
                ast.node_mut(id).data =
                    NodeData::image(&image.url, image.title.clone(), &image.alt, label);
                id
            }

            Md::List(list) => {
                let id = self.create_parent_node(ast, node, &list.children, NodeType::List);
                ast.node_mut(id).data = NodeData::list(list.ordered);
                id
            }

            Md::ListItem(item) => {
                self.create_parent_node(ast, node, &item.children, NodeType::ListItem)
            }

            Md::Blockquote(quote) => {
                self.create_parent_node(ast, node, &quote.children, NodeType::BlockQuote)
            }

            Md::ThematicBreak(_) => {
                self.create_leaf_node(ast, node, NodeType::HorizontalRule)
            }

            Md::Break(_) => self.create_leaf_node(ast, node, NodeType::Break),

            Md::Html(html) => self.create_text_node(ast, node, &html.value, NodeType::Html),

            // Table support (GFM)
            Md::Table(table) => {
                self.create_parent_node(ast, node, &table.children, NodeType::Table)
            }

            Md::TableRow(row) => {
                self.create_parent_node(ast, node, &row.children, NodeType::TableRow)
            }

            Md::TableCell(cell) => {
                self.create_parent_node(ast, node, &cell.children, NodeType::TableCell)
            }

            // Footnotes (GFM)
            Md::FootnoteDefinition(def) => {
                let id = self.create_parent_node(
                    ast,
                    node,
                    &def.children,
                    NodeType::FootnoteDefinition,
                );
                ast.node_mut(id).data = reference(&def.identifier, &def.label);
                id
            }

            Md::FootnoteReference(ref_node) => {
                let id = self.create_leaf_node(ast, node, NodeType::FootnoteReference);
                ast.node_mut(id).data = reference(&ref_node.identifier, &ref_node.label);
                id
            }

            // Reference nodes
            Md::LinkReference(ref_node) => {
                let id = self.create_parent_node(
                    ast,
                    node,
                    &ref_node.children,
                    NodeType::LinkReference,
                );
                ast.node_mut(id).data = reference(&ref_node.identifier, &ref_node.label);
                id
            }

            Md::ImageReference(ref_node) => {
                let id = self.create_leaf_node(ast, node, NodeType::ImageReference);
                ast.node_mut(id).data = reference(&ref_node.identifier, &ref_node.label);
                id
            }

            Md::Definition(def) => {
                let id = self.create_leaf_node(ast, node, NodeType::Definition);
                ast.node_mut(id).data = NodeData::Definition(DefinitionData {
                    identifier: def.identifier.clone(),
                    url: def.url.clone(),
                    title: def.title.clone(),
                    label: def.label.clone(),
                });
                id
            }

            // Fallback for unsupported nodes
            _ => self.create_leaf_node(ast, node, NodeType::Html),
        };

        ast.append_child(parent, id);
    }

    /// Helper to create a parent node. Children are attached to it; the
    /// node itself is left for the caller to attach.
    fn create_parent_node(
        &self,
        ast: &mut Ast,
        node: &mdast::Node,
        children: &[mdast::Node],
        node_type: NodeType,
    ) -> NodeId {
        let id = ast.alloc(Node::new_parent(node_type, node_span(node)));
        self.convert_children(ast, children, id);
        id
    }

    /// Helper to create a text node.
    fn create_text_node(
        &self,
        ast: &mut Ast,
        node: &mdast::Node,
        text: &str,
        node_type: NodeType,
    ) -> NodeId {
        ast.alloc(Node::new_text(node_type, node_span(node), text))
    }

    /// Helper to create a leaf node.
    fn create_leaf_node(
        &self,
        ast: &mut Ast,
        node: &mdast::Node,
        node_type: NodeType,
    ) -> NodeId {
        ast.alloc(Node::new_leaf(node_type, node_span(node)))
    }

    /// Converts a list of mdast children under `parent`.
    fn convert_children(&self, ast: &mut Ast, children: &[mdast::Node], parent: NodeId) {
        for child in children {
            self.convert_node(ast, child, parent);
        }
    }
}

/// Gets the span for an mdast node.
fn node_span(node: &mdast::Node) -> Span {
    if let Some(pos) = node.position() {
        Span::new(pos.start.offset as u32, pos.end.offset as u32)
    } else {
        Span::new(0, 0)
    }
}

/// Locates the alt text of `![alt](...)` inside the image span: everything
/// up to the `]` that balances the opening bracket. Falls back to an empty
/// span when the brackets do not close.
fn alt_span(ast: &Ast, span: Span) -> Span {
    let text = ast.slice(span);
    let start = (span.start + 2).min(span.end);
    if !text.starts_with("![") {
        return Span::empty(start);
    }

    let mut depth = 0usize;
    let mut chars = text.char_indices().skip(2);
    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' => depth += 1,
            ']' if depth == 0 => return Span::new(start, span.start + offset as u32),
            ']' => depth -= 1,
            _ => {}
        }
    }
    Span::empty(start)
}

fn reference(identifier: &str, label: &Option<String>) -> NodeData {
    NodeData::Reference(ReferenceData {
        identifier: identifier.to_owned(),
        label: label.clone(),
    })
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MarkdownParser {
    fn name(&self) -> &str {
        "markdown"
    }

    fn parse(&self, source: &str) -> Result<Ast, ParseError> {
        let options = Self::default_options();
        let mdast =
            to_mdast(source, &options).map_err(|e| ParseError::invalid_source(e.to_string()))?;

        let mut ast = Ast::new(source);
        let root = ast.root();
        self.convert_node(&mut ast, &mdast, root);

        let stats = resolve_delimiters(&mut ast, &self.delimiters);
        debug!(
            nodes = ast.len(),
            composites = stats.matched,
            "Parsed markdown document"
        );

        Ok(ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::{DelimiterProcessor, DelimiterRun};
    use kumihan_ast::check_integrity;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Returns the children of the first paragraph.
    fn inline(ast: &Ast) -> Vec<NodeId> {
        let paragraph = ast.children(ast.root()).next().unwrap();
        assert_eq!(ast.node(paragraph).node_type, NodeType::Paragraph);
        ast.children(paragraph).collect()
    }

    fn only_child(ast: &Ast, id: NodeId) -> NodeId {
        let children: Vec<_> = ast.children(id).collect();
        assert_eq!(children.len(), 1, "expected one child of {id}");
        children[0]
    }

    fn parse(source: &str) -> Ast {
        let ast = MarkdownParser::new().parse(source).unwrap();
        check_integrity(&ast).unwrap();
        ast
    }

    #[test]
    fn test_parse_simple_markdown() {
        let ast = parse("# Hello\n\nThis is a paragraph.");

        assert_eq!(ast.node(ast.root()).node_type, NodeType::Document);
        assert_eq!(ast.children(ast.root()).count(), 2);
    }

    #[test]
    fn test_parse_heading() {
        let ast = parse("# Level 1\n\n## Level 2");
        let headings: Vec<_> = ast.children(ast.root()).collect();

        assert_eq!(headings.len(), 2);
        assert_eq!(ast.node(headings[0]).node_type, NodeType::Header);
        assert_eq!(ast.node(headings[0]).data, NodeData::Header(1));
        assert_eq!(ast.node(headings[1]).data, NodeData::Header(2));
    }

    #[test]
    fn test_parse_link() {
        let ast = parse("[Example](https://example.com)");
        let link = inline(&ast)[0];

        assert_eq!(ast.node(link).node_type, NodeType::Link);
        let data = ast.node(link).data.as_link().unwrap();
        assert_eq!(data.url, "https://example.com");
        assert_eq!(ast.slice(data.label), "Example");
    }

    #[test]
    fn test_parse_image_alt_span() {
        let ast = parse("![bar](http://example.com)");
        let image = inline(&ast)[0];

        assert_eq!(ast.node(image).node_type, NodeType::Image);
        let data = ast.node(image).data.as_link().unwrap();
        assert_eq!(ast.slice(data.label), "bar");
    }

    #[rstest]
    #[case::escaped_delimiter("![a\\*b](u)", "a\\*b", "a*b")]
    #[case::nested_brackets("![a [b] c](u)", "a [b] c", "a [b] c")]
    #[case::reference_in_alt("![Tom &amp; Jerry](u)", "Tom &amp; Jerry", "Tom & Jerry")]
    fn test_parse_image_alt_decoded(
        #[case] source: &str,
        #[case] label: &str,
        #[case] alt: &str,
    ) {
        let ast = parse(source);
        let image = inline(&ast)[0];

        let data = ast.node(image).data.as_link().unwrap();
        assert_eq!(ast.slice(data.label), label);
        assert_eq!(data.alt.as_deref(), Some(alt));
    }

    #[test]
    fn test_parse_empty_document() {
        let ast = parse("");

        assert_eq!(ast.node(ast.root()).node_type, NodeType::Document);
        assert_eq!(ast.children(ast.root()).count(), 0);
    }

    #[test]
    fn test_plain_text_no_op() {
        let ast = parse("just some words");
        let children = inline(&ast);

        assert_eq!(children.len(), 1);
        assert_eq!(ast.node(children[0]).text(), Some("just some words"));
    }

    #[test]
    fn test_underline_pair() {
        let ast = parse("+underline+");
        let children = inline(&ast);

        assert_eq!(children.len(), 1);
        let underline = children[0];
        assert_eq!(ast.node(underline).node_type, NodeType::Underline);
        assert_eq!(ast.text_content(underline), "underline");

        let delimited = *ast.node(underline).data.as_delimited().unwrap();
        assert_eq!(delimited.opening_marker.len(), 1);
        assert_eq!(delimited.closing_marker.len(), 1);
        assert_eq!(ast.slice(delimited.text), "underline");
    }

    #[test]
    fn test_nested_distinct_markers() {
        let ast = parse("*+bold and underline+*");
        let children = inline(&ast);

        assert_eq!(children.len(), 1);
        let emphasis = children[0];
        assert_eq!(ast.node(emphasis).node_type, NodeType::Emphasis);
        let underline = only_child(&ast, emphasis);
        assert_eq!(ast.node(underline).node_type, NodeType::Underline);
        let text = only_child(&ast, underline);
        assert_eq!(ast.node(text).text(), Some("bold and underline"));
    }

    #[test]
    fn test_unmatched_opener_is_text() {
        let ast = parse("+bold");
        let children = inline(&ast);

        assert_eq!(children.len(), 1);
        assert_eq!(ast.node(children[0]).node_type, NodeType::Str);
        assert_eq!(ast.node(children[0]).text(), Some("+bold"));
    }

    #[test]
    fn test_multi_unit_emphasis() {
        let ast = parse("***x***");
        let emphasis = inline(&ast)[0];

        assert_eq!(ast.node(emphasis).node_type, NodeType::Emphasis);
        let strong = only_child(&ast, emphasis);
        assert_eq!(ast.node(strong).node_type, NodeType::Strong);
        let text = only_child(&ast, strong);
        assert_eq!(ast.node(text).text(), Some("x"));
    }

    #[test]
    fn test_strikethrough() {
        let ast = parse("~~del~~ and ~x~");
        let children = inline(&ast);

        assert_eq!(ast.node(children[0]).node_type, NodeType::Delete);
        assert_eq!(ast.text_content(children[0]), "del");
        assert_eq!(children.len(), 2);
        assert_eq!(ast.node(children[1]).text(), Some(" and ~x~"));
    }

    #[test]
    fn test_intraword_underscore() {
        let ast = parse("snake_case_word");
        let children = inline(&ast);

        assert_eq!(children.len(), 1);
        assert_eq!(ast.node(children[0]).text(), Some("snake_case_word"));
    }

    #[rstest]
    #[case::character_reference("*Tom &amp; Jerry*", "Tom & Jerry")]
    #[case::backslash_escape("*a\\_b*", "a_b")]
    #[case::trailing_space("*foo \nbar*", "foo\nbar")]
    #[case::blockquote("> *a\n> b*", "a\nb")]
    #[case::indented_continuation("*a\n  b*", "a\nb")]
    fn test_emphasis_around_decoded_text(#[case] source: &str, #[case] text: &str) {
        let ast = parse(source);
        let emphasis: Vec<_> = ast
            .descendants(ast.root())
            .filter(|&id| ast.node(id).node_type == NodeType::Emphasis)
            .collect();

        assert_eq!(emphasis.len(), 1);
        assert_eq!(ast.text_content(emphasis[0]), text);
    }

    #[test]
    fn test_escaped_delimiter_is_literal() {
        let ast = parse("\\*a*");
        let children = inline(&ast);

        assert_eq!(children.len(), 1);
        assert_eq!(ast.node(children[0]).text(), Some("*a*"));
    }

    #[test]
    fn test_rule_of_three_skips_inner_run() {
        let ast = parse("*foo**bar*");
        let children = inline(&ast);

        assert_eq!(children.len(), 1);
        assert_eq!(ast.node(children[0]).node_type, NodeType::Emphasis);
        assert_eq!(ast.text_content(children[0]), "foo**bar");
    }

    #[test]
    fn test_delimiters_stay_inside_links() {
        let ast = parse("*[a*](http://example.com)");
        let children = inline(&ast);

        assert_eq!(ast.node(children[0]).text(), Some("*"));
        assert_eq!(ast.node(children[1]).node_type, NodeType::Link);
        assert_eq!(ast.text_content(children[1]), "a*");
    }

    /// `=` pairs that ask for more characters than a run holds.
    struct Greedy;

    impl DelimiterProcessor for Greedy {
        fn opening_char(&self) -> char {
            '='
        }

        fn closing_char(&self) -> char {
            '='
        }

        fn min_length(&self) -> usize {
            1
        }

        fn delimiter_use(&self, _opener: &DelimiterRun, _closer: &DelimiterRun) -> usize {
            5
        }

        fn node_type(&self, _units: usize) -> NodeType {
            NodeType::Underline
        }
    }

    /// `=` runs that disappear when left unmatched.
    struct Vanishing;

    impl DelimiterProcessor for Vanishing {
        fn opening_char(&self) -> char {
            '='
        }

        fn closing_char(&self) -> char {
            '='
        }

        fn min_length(&self) -> usize {
            1
        }

        fn delimiter_use(&self, _opener: &DelimiterRun, _closer: &DelimiterRun) -> usize {
            1
        }

        fn node_type(&self, _units: usize) -> NodeType {
            NodeType::Underline
        }

        fn unmatched_delimiter(&self, _run: &DelimiterRun) -> Option<String> {
            Some(String::new())
        }
    }

    #[test]
    fn test_contract_violation_is_rejected() {
        let plain = MarkdownParser::with_delimiters(Arc::new(DelimiterProcessors::default()));
        let mut ast = plain.parse("=a=").unwrap();
        let registry = DelimiterProcessors::new([Arc::new(Greedy) as Arc<dyn DelimiterProcessor>])
            .unwrap();

        let stats = resolve_delimiters(&mut ast, &registry);

        assert_eq!(stats.matched, 0);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.unmatched, 2);
        check_integrity(&ast).unwrap();
        let children = inline(&ast);
        assert_eq!(children.len(), 1);
        assert_eq!(ast.node(children[0]).text(), Some("=a="));
    }

    #[test]
    fn test_unmatched_fallback_replaces_text() {
        let registry =
            DelimiterProcessors::new([Arc::new(Vanishing) as Arc<dyn DelimiterProcessor>]).unwrap();
        let parser = MarkdownParser::with_delimiters(Arc::new(registry));
        let ast = parser.parse("=a").unwrap();

        let children = inline(&ast);
        assert_eq!(children.len(), 1);
        assert_eq!(ast.node(children[0]).text(), Some("a"));
        assert_eq!(ast.node(children[0]).span, Span::new(0, 2));
    }
}
