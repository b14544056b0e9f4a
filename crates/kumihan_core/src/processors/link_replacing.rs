//! Replaces links and images with their plain text.

use kumihan_ast::{Ast, Node, NodeId, NodeType, Span};

use crate::{NodePostProcessor, NodePostProcessorFactory, NodeTracker, PostProcessError};

/// Swaps each `Link` or `Image` for a `Str` holding the raw source text of
/// its label: the link text of `[foo](url)` or the alt text of
/// `![bar](url)`. An image whose alt text could not be located in the
/// source gets its decoded alt instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkReplacingPostProcessor;

impl NodePostProcessor for LinkReplacingPostProcessor {
    fn process(
        &mut self,
        tracker: &mut NodeTracker,
        ast: &mut Ast,
        node: NodeId,
    ) -> Result<(), PostProcessError> {
        let target = ast.node(node);
        let (label, alt) = match target.data.as_link() {
            Some(link) => (link.label, link.alt.as_deref()),
            None => (Span::empty(target.span.start), None),
        };

        let value = match alt {
            Some(alt) if label.is_empty() => alt.to_owned(),
            _ => ast.slice(label).to_owned(),
        };
        let text = ast.alloc(Node::new_text(NodeType::Str, label, value));
        ast.insert_after(node, text);
        tracker.node_added(ast, text)?;

        ast.unlink(node);
        tracker.node_removed(ast, node)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkReplacingPostProcessorFactory;

impl NodePostProcessorFactory for LinkReplacingPostProcessorFactory {
    fn name(&self) -> &str {
        "replace-links"
    }

    fn interest(&self) -> &[NodeType] {
        &[NodeType::Link, NodeType::Image]
    }

    fn create(&self, _ast: &Ast) -> Box<dyn NodePostProcessor> {
        Box::new(LinkReplacingPostProcessor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PostProcessorManager;
    use kumihan_ast::NodeData;
    use kumihan_parser::{MarkdownParser, Parser};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_replaces_link_with_label() {
        let mut ast = MarkdownParser::new()
            .parse("see [the docs](http://example.com) now")
            .unwrap();
        let manager = PostProcessorManager::new()
            .with_node_factory(Arc::new(LinkReplacingPostProcessorFactory));

        let tracker = manager.run(&mut ast).unwrap();

        let paragraph = ast.children(ast.root()).next().unwrap();
        let texts: Vec<_> = ast
            .children(paragraph)
            .filter_map(|id| ast.node(id).text())
            .collect();
        assert_eq!(texts, vec!["see ", "the docs", " now"]);
        assert_eq!(tracker.added().count(), 1);
        assert_eq!(tracker.removed().count(), 1);
    }

    #[test]
    fn test_link_with_markup_keeps_raw_label() {
        let mut ast = MarkdownParser::new()
            .parse("[*em*](http://example.com)")
            .unwrap();
        let manager = PostProcessorManager::new()
            .with_node_factory(Arc::new(LinkReplacingPostProcessorFactory));

        manager.run(&mut ast).unwrap();

        let paragraph = ast.children(ast.root()).next().unwrap();
        let text = ast.node(paragraph).first_child().unwrap();
        assert_eq!(ast.node(text).node_type, NodeType::Str);
        assert_eq!(ast.node(text).text(), Some("*em*"));
    }

    #[test]
    fn test_image_without_label_span_uses_alt() {
        let source = "![x](u)";
        let mut ast = Ast::new(source);
        let span = Span::new(0, source.len() as u32);
        let paragraph = ast.alloc(Node::new_parent(NodeType::Paragraph, span));
        let mut image = Node::new_leaf(NodeType::Image, span);
        image.data = NodeData::image("u", None, "alt", Span::empty(2));
        let image = ast.alloc(image);
        ast.append_child(ast.root(), paragraph);
        ast.append_child(paragraph, image);
        let manager = PostProcessorManager::new()
            .with_node_factory(Arc::new(LinkReplacingPostProcessorFactory));

        manager.run(&mut ast).unwrap();

        let text = ast.node(paragraph).first_child().unwrap();
        assert_eq!(ast.node(text).node_type, NodeType::Str);
        assert_eq!(ast.node(text).text(), Some("alt"));
    }

    #[test]
    fn test_image_alt_with_escape() {
        let mut ast = MarkdownParser::new().parse("![a\\*b](u)").unwrap();
        let manager = PostProcessorManager::new()
            .with_node_factory(Arc::new(LinkReplacingPostProcessorFactory));

        manager.run(&mut ast).unwrap();

        let paragraph = ast.children(ast.root()).next().unwrap();
        let text = ast.node(paragraph).first_child().unwrap();
        assert_eq!(ast.node(text).text(), Some("a\\*b"));
    }
}
