//! Delimiter matching.
//!
//! Pairs openers and closers on a [`DelimiterStack`] and splices the
//! resulting composite nodes into the tree. Every run that is not consumed
//! stays behind as literal text.

use kumihan_ast::{Ast, Node, NodeData, NodeId, NodeType, Span};
use tracing::{trace, warn};

use super::{DelimiterProcessor, DelimiterProcessors, DelimiterRun, DelimiterStack, ProcessorId};

/// Counters collected while matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Composite nodes created.
    pub matched: usize,
    /// Runs left over with unconsumed characters.
    pub unmatched: usize,
    /// Candidate pairs dropped because `delimiter_use` exceeded a run length.
    pub rejected: usize,
}

impl std::ops::AddAssign for MatchStats {
    fn add_assign(&mut self, other: Self) {
        self.matched += other.matched;
        self.unmatched += other.unmatched;
        self.rejected += other.rejected;
    }
}

/// Resolves the runs on `stack` into composite nodes.
///
/// All runs must hold sibling `Str` nodes of one container, in document
/// order. Never fails: runs that find no partner degrade to text.
pub fn process_delimiters(
    ast: &mut Ast,
    processors: &DelimiterProcessors,
    stack: &mut DelimiterStack,
) -> MatchStats {
    let mut stats = MatchStats::default();
    let Some(container) = stack.runs.first().and_then(|run| ast.node(run.node).parent()) else {
        return stats;
    };

    let runs = &mut stack.runs;
    let mut composites = Vec::new();
    let mut closer_idx = 0;

    while closer_idx < runs.len() {
        let closer = &runs[closer_idx];
        let processor = processors.get(closer.processor);
        let min_length = processors.min_length(closer.delimiter_char).unwrap_or(1);
        if !closer.active
            || !closer.can_close
            || closer.delimiter_char != processor.closing_char()
            || closer.length < min_length
        {
            closer_idx += 1;
            continue;
        }

        let Some((opener_idx, id, units)) = find_opener(runs, closer_idx, processors, &mut stats)
        else {
            if !runs[closer_idx].can_open {
                retire(ast, processor, &mut runs[closer_idx], &mut stats);
            }
            closer_idx += 1;
            continue;
        };

        let processor = processors.get(id);
        let composite =
            insert_composite(ast, processor, &runs[opener_idx], &runs[closer_idx], units);
        composites.push(composite);
        stats.matched += 1;

        for run in &mut runs[opener_idx + 1..closer_idx] {
            if run.active {
                let processor = processors.get(run.processor);
                retire(ast, processor, run, &mut stats);
            }
        }

        consume(ast, &mut runs[opener_idx], units, true);
        consume(ast, &mut runs[closer_idx], units, false);

        if !runs[closer_idx].active {
            closer_idx += 1;
        }
    }

    for run in runs.iter_mut().filter(|run| run.active) {
        let processor = processors.get(run.processor);
        retire(ast, processor, run, &mut stats);
    }

    merge_text(ast, container);
    for composite in composites {
        merge_text(ast, composite);
    }

    trace!(
        container = %container,
        matched = stats.matched,
        unmatched = stats.unmatched,
        "Processed delimiter stack"
    );
    stats
}

/// Scans backwards from `closer_idx` for the nearest opener that pairs with
/// the closer. The processor is picked by the opener's remaining length.
///
/// Returns the opener index, the processor and the units to consume.
fn find_opener(
    runs: &[DelimiterRun],
    closer_idx: usize,
    processors: &DelimiterProcessors,
    stats: &mut MatchStats,
) -> Option<(usize, ProcessorId, usize)> {
    let closer = &runs[closer_idx];
    let opening_char = processors.get(closer.processor).opening_char();

    for opener_idx in (0..closer_idx).rev() {
        let opener = &runs[opener_idx];
        if !opener.active || !opener.can_open || opener.delimiter_char != opening_char {
            continue;
        }
        let Some(id) = processors.resolve(opener.delimiter_char, opener.length) else {
            continue;
        };
        let processor = processors.get(id);
        let min_length = processor.min_length();
        if processor.closing_char() != closer.delimiter_char || opener.length < min_length {
            continue;
        }

        let units = processor.delimiter_use(opener, closer);
        if units == 0 || units < min_length {
            continue;
        }
        if units > opener.length || units > closer.length {
            warn!(
                delimiter = %closer.delimiter_char,
                units,
                opener_length = opener.length,
                closer_length = closer.length,
                "Delimiter processor requested more characters than the runs hold"
            );
            stats.rejected += 1;
            continue;
        }

        return Some((opener_idx, id, units));
    }

    None
}

/// Wraps every node between the two runs in a new composite node and
/// inserts it after the opener.
fn insert_composite(
    ast: &mut Ast,
    processor: &dyn DelimiterProcessor,
    opener: &DelimiterRun,
    closer: &DelimiterRun,
    units: usize,
) -> NodeId {
    let opener_span = ast.node(opener.node).span;
    let closer_span = ast.node(closer.node).span;
    let opening_bytes = (units * opener.delimiter_char.len_utf8()) as u32;
    let closing_bytes = (units * closer.delimiter_char.len_utf8()) as u32;

    let opening_marker = opener_span.split_at(opener_span.len() - opening_bytes).1;
    let closing_marker = closer_span.split_at(closing_bytes).0;
    let text = Span::new(opening_marker.end, closing_marker.start);

    let composite = ast.alloc(
        Node::new_parent(
            processor.node_type(units),
            Span::new(opening_marker.start, closing_marker.end),
        )
        .with_data(NodeData::delimited(opening_marker, text, closing_marker)),
    );

    let mut cursor = ast.node(opener.node).next_sibling();
    while let Some(id) = cursor {
        if id == closer.node {
            break;
        }
        cursor = ast.node(id).next_sibling();
        ast.append_child(composite, id);
    }
    ast.insert_after(opener.node, composite);

    composite
}

/// Removes `units` characters from a run: the trailing ones of an opener,
/// the leading ones of a closer. An exhausted run leaves the tree.
fn consume(ast: &mut Ast, run: &mut DelimiterRun, units: usize, is_opener: bool) {
    run.length -= units;
    if run.length == 0 {
        run.active = false;
        ast.unlink(run.node);
        return;
    }

    let consumed = (units * run.delimiter_char.len_utf8()) as u32;
    let node = ast.node_mut(run.node);
    let span = node.span;
    node.span = if is_opener {
        span.split_at(span.len() - consumed).0
    } else {
        span.split_at(consumed).1
    };
    node.value = Some(run.delimiter_char.to_string().repeat(run.length));
}

/// Takes a run off the stack, applying its processor's unmatched fallback.
fn retire(
    ast: &mut Ast,
    processor: &dyn DelimiterProcessor,
    run: &mut DelimiterRun,
    stats: &mut MatchStats,
) {
    run.active = false;
    stats.unmatched += 1;
    if let Some(text) = processor.unmatched_delimiter(run) {
        ast.node_mut(run.node).value = Some(text);
    }
}

/// Joins adjacent `Str` children of `parent` whose spans touch.
fn merge_text(ast: &mut Ast, parent: NodeId) {
    let mut cursor = ast.node(parent).first_child();
    while let Some(id) = cursor {
        let next = ast.node(id).next_sibling();
        let Some(next_id) = next else { break };

        let (current, following) = (ast.node(id), ast.node(next_id));
        let mergeable = current.node_type == NodeType::Str
            && following.node_type == NodeType::Str
            && current.span.end == following.span.start;
        if !mergeable {
            cursor = next;
            continue;
        }

        let tail = following.text().unwrap_or_default().to_owned();
        let tail_span = following.span;
        ast.unlink(next_id);
        let node = ast.node_mut(id);
        node.value.get_or_insert_with(String::new).push_str(&tail);
        node.span = node.span.merge(&tail_span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::FlankContext;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Builds `Document > Paragraph > Str*` with one node per piece and a
    /// run for every piece made of one repeated delimiter character.
    fn build(pieces: &[&str], processors: &DelimiterProcessors) -> (Ast, NodeId, DelimiterStack) {
        let source: String = pieces.concat();
        let mut ast = Ast::new(source.clone());
        let paragraph = ast.alloc(Node::new_parent(
            NodeType::Paragraph,
            Span::new(0, source.len() as u32),
        ));
        ast.append_child(ast.root(), paragraph);

        let mut stack = DelimiterStack::new();
        let mut offset = 0u32;
        for piece in pieces {
            let span = Span::new(offset, offset + piece.len() as u32);
            let id = ast.alloc(Node::new_text(NodeType::Str, span, *piece));
            ast.append_child(paragraph, id);

            let first = piece.chars().next().unwrap();
            if processors.contains(first) && piece.chars().all(|c| c == first) {
                let before = source[..span.start as usize].chars().next_back();
                let after = source[span.end as usize..].chars().next();
                let flank = FlankContext::new(before, after);
                if let Some(run) = processors.classify(id, first, piece.chars().count(), flank) {
                    stack.push(run);
                }
            }
            offset = span.end;
        }
        (ast, paragraph, stack)
    }

    fn types(ast: &Ast, parent: NodeId) -> Vec<NodeType> {
        ast.children(parent).map(|id| ast.node(id).node_type).collect()
    }

    #[test]
    fn test_simple_pair() {
        let processors = DelimiterProcessors::builtin();
        let (mut ast, paragraph, mut stack) = build(&["+", "under", "+"], &processors);

        let stats = process_delimiters(&mut ast, &processors, &mut stack);

        assert_eq!(stats.matched, 1);
        assert_eq!(stats.unmatched, 0);
        assert_eq!(types(&ast, paragraph), vec![NodeType::Underline]);

        let underline = ast.node(paragraph).first_child().unwrap();
        let delimited = *ast.node(underline).data.as_delimited().unwrap();
        assert_eq!(delimited.opening_marker, Span::new(0, 1));
        assert_eq!(delimited.text, Span::new(1, 6));
        assert_eq!(delimited.closing_marker, Span::new(6, 7));
        assert_eq!(ast.text_content(underline), "under");
    }

    #[test]
    fn test_unmatched_opener_merges_into_text() {
        let processors = DelimiterProcessors::builtin();
        let (mut ast, paragraph, mut stack) = build(&["+", "bold"], &processors);

        let stats = process_delimiters(&mut ast, &processors, &mut stack);

        assert_eq!(stats.matched, 0);
        assert_eq!(stats.unmatched, 1);
        assert_eq!(types(&ast, paragraph), vec![NodeType::Str]);
        let text = ast.node(paragraph).first_child().unwrap();
        assert_eq!(ast.node(text).text(), Some("+bold"));
        assert_eq!(ast.node(text).span, Span::new(0, 5));
    }

    #[test]
    fn test_multi_unit_nesting() {
        let processors = DelimiterProcessors::builtin();
        let (mut ast, paragraph, mut stack) = build(&["***", "x", "***"], &processors);

        let stats = process_delimiters(&mut ast, &processors, &mut stack);

        assert_eq!(stats.matched, 2);
        assert_eq!(types(&ast, paragraph), vec![NodeType::Emphasis]);
        let emphasis = ast.node(paragraph).first_child().unwrap();
        assert_eq!(types(&ast, emphasis), vec![NodeType::Strong]);
        let strong = ast.node(emphasis).first_child().unwrap();
        assert_eq!(ast.text_content(strong), "x");
        assert_eq!(ast.node(emphasis).span, Span::new(0, 7));
        assert_eq!(ast.node(strong).span, Span::new(1, 6));
    }

    #[test]
    fn test_runs_between_pair_are_retired() {
        let processors = DelimiterProcessors::builtin();
        // "*a +b* c+"
        let (mut ast, paragraph, mut stack) =
            build(&["*", "a ", "+", "b", "*", " c", "+"], &processors);

        let stats = process_delimiters(&mut ast, &processors, &mut stack);

        assert_eq!(stats.matched, 1);
        assert_eq!(stats.unmatched, 2);
        assert_eq!(types(&ast, paragraph), vec![NodeType::Emphasis, NodeType::Str]);
        let emphasis = ast.node(paragraph).first_child().unwrap();
        assert_eq!(ast.text_content(emphasis), "a +b");
        assert_eq!(types(&ast, emphasis), vec![NodeType::Str]);
    }

    /// `=` pairs consuming `units` from both runs when both hold enough.
    struct Units {
        min: usize,
        node_type: NodeType,
    }

    impl DelimiterProcessor for Units {
        fn opening_char(&self) -> char {
            '='
        }

        fn closing_char(&self) -> char {
            '='
        }

        fn min_length(&self) -> usize {
            self.min
        }

        fn delimiter_use(&self, opener: &DelimiterRun, closer: &DelimiterRun) -> usize {
            if opener.length() >= self.min && closer.length() >= self.min {
                self.min
            } else {
                0
            }
        }

        fn node_type(&self, _units: usize) -> NodeType {
            self.node_type
        }
    }

    /// `=` pairs that refuse openers scanned as `==`.
    struct NoDoubleOpener;

    impl DelimiterProcessor for NoDoubleOpener {
        fn opening_char(&self) -> char {
            '='
        }

        fn closing_char(&self) -> char {
            '='
        }

        fn min_length(&self) -> usize {
            1
        }

        fn delimiter_use(&self, opener: &DelimiterRun, _closer: &DelimiterRun) -> usize {
            if opener.original_length() == 2 { 0 } else { 1 }
        }

        fn node_type(&self, _units: usize) -> NodeType {
            NodeType::Underline
        }
    }

    fn registry(processors: Vec<Arc<dyn DelimiterProcessor>>) -> DelimiterProcessors {
        DelimiterProcessors::new(processors).unwrap()
    }

    #[test]
    fn test_rejected_opener_does_not_stop_search() {
        let processors = registry(vec![Arc::new(NoDoubleOpener)]);
        // "=x ==y= z"
        let (mut ast, paragraph, mut stack) =
            build(&["=", "x ", "==", "y", "=", " z"], &processors);

        let stats = process_delimiters(&mut ast, &processors, &mut stack);

        assert_eq!(stats.matched, 1);
        assert_eq!(stats.unmatched, 1);
        assert_eq!(stats.rejected, 0);
        assert_eq!(types(&ast, paragraph), vec![NodeType::Underline, NodeType::Str]);
        let underline = ast.node(paragraph).first_child().unwrap();
        assert_eq!(ast.text_content(underline), "x ==y");
        assert_eq!(types(&ast, underline), vec![NodeType::Str]);
    }

    #[test]
    fn test_staggered_processor_picked_by_opener() {
        let processors = registry(vec![
            Arc::new(Units {
                min: 2,
                node_type: NodeType::Strong,
            }),
            Arc::new(Units {
                min: 1,
                node_type: NodeType::Emphasis,
            }),
        ]);
        // "=a==": the closer alone resolves to the two-character processor
        let (mut ast, paragraph, mut stack) = build(&["=", "a", "=="], &processors);

        let stats = process_delimiters(&mut ast, &processors, &mut stack);

        assert_eq!(stats.matched, 1);
        assert_eq!(types(&ast, paragraph), vec![NodeType::Emphasis, NodeType::Str]);
        let emphasis = ast.node(paragraph).first_child().unwrap();
        assert_eq!(ast.text_content(emphasis), "a");
        let rest = ast.node(paragraph).last_child().unwrap();
        assert_eq!(ast.node(rest).text(), Some("="));
        assert_eq!(ast.node(rest).span, Span::new(3, 4));
    }

    #[test]
    fn test_empty_stack_is_noop() {
        let processors = DelimiterProcessors::builtin();
        let (mut ast, paragraph, mut stack) = build(&["plain"], &processors);
        let before = ast.len();

        let stats = process_delimiters(&mut ast, &processors, &mut stack);

        assert_eq!(stats, MatchStats::default());
        assert_eq!(ast.len(), before);
        assert_eq!(types(&ast, paragraph), vec![NodeType::Str]);
    }
}
