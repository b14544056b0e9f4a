//! Splits delimiter runs out of text nodes and feeds them to the engine.

use kumihan_ast::{Ast, Node, NodeId, NodeType, Span};
use tracing::{debug, trace};

use super::{
    DelimiterProcessors, DelimiterRun, DelimiterStack, FlankContext, MatchStats, process_delimiters,
};

/// A piece of a text node: plain text or a delimiter run.
struct Segment {
    span: Span,
    text: String,
    run: Option<DelimiterRun>,
}

/// How a stretch of a text node's source reads in its value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    /// Source text that appears unchanged in the value.
    Verbatim(Span),
    /// Source the value shows decoded or not at all: escapes, character
    /// references, and indentation or quote markers dropped by the block
    /// parser.
    Decoded(Span, String),
}

/// Resolves delimiter runs in every inline container of `ast`.
///
/// Containers are visited in document order. Each container's `Str`
/// children form one delimiter stack, so runs never pair across a link or
/// any other inline boundary.
pub fn resolve_delimiters(ast: &mut Ast, processors: &DelimiterProcessors) -> MatchStats {
    let mut stats = MatchStats::default();
    if processors.is_empty() {
        return stats;
    }

    let containers: Vec<NodeId> = ast
        .descendants(ast.root())
        .filter(|&id| {
            ast.children(id)
                .any(|child| ast.node(child).node_type == NodeType::Str)
        })
        .collect();

    for container in containers {
        let mut stack = scan_container(ast, container, processors);
        if stack.is_empty() {
            continue;
        }
        stats += process_delimiters(ast, processors, &mut stack);
    }

    debug!(
        matched = stats.matched,
        unmatched = stats.unmatched,
        rejected = stats.rejected,
        "Resolved delimiter runs"
    );
    stats
}

/// Builds the delimiter stack of one container, splitting run characters
/// into their own `Str` nodes.
fn scan_container(
    ast: &mut Ast,
    container: NodeId,
    processors: &DelimiterProcessors,
) -> DelimiterStack {
    let mut stack = DelimiterStack::new();
    let children: Vec<NodeId> = ast.children(container).collect();

    for child in children {
        let node = ast.node(child);
        if node.node_type != NodeType::Str {
            continue;
        }
        let Some(value) = node.text() else {
            continue;
        };
        let Some(pieces) = align(ast.slice(node.span), value, node.span.start) else {
            trace!(node = %child, "Text does not line up with its source");
            continue;
        };

        let segments = segment(ast, child, &pieces, processors);
        if segments.iter().all(|segment| segment.run.is_none()) {
            continue;
        }

        for Segment { span, text, run } in segments {
            let id = ast.alloc(Node::new_text(NodeType::Str, span, text));
            ast.insert_before(child, id);
            if let Some(mut run) = run {
                run.node = id;
                stack.push(run);
            }
        }
        ast.unlink(child);
    }

    stack
}

/// Cuts the verbatim pieces of `id` into maximal runs of registered
/// characters and the text between them. Decoded pieces and runs no
/// processor accepts are folded into text.
fn segment(
    ast: &Ast,
    id: NodeId,
    pieces: &[Piece],
    processors: &DelimiterProcessors,
) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Decoded(span, text) => push_text(&mut segments, *span, text),
            Piece::Verbatim(span) => scan_verbatim(ast, id, *span, processors, &mut segments),
        }
    }
    segments
}

fn scan_verbatim(
    ast: &Ast,
    id: NodeId,
    span: Span,
    processors: &DelimiterProcessors,
    segments: &mut Vec<Segment>,
) {
    let source = ast.source();
    let text = ast.slice(span);

    let mut chars = text.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        let start = span.start + offset as u32;
        if !processors.contains(c) {
            let end = start + c.len_utf8() as u32;
            push_text(segments, Span::new(start, end), &text[offset..offset + c.len_utf8()]);
            continue;
        }

        let mut length = 1;
        while chars.next_if(|&(_, next)| next == c).is_some() {
            length += 1;
        }
        let end = start + (length * c.len_utf8()) as u32;
        let piece = Span::new(start, end);

        let before = source[..start as usize].chars().next_back();
        let after = source[end as usize..].chars().next();
        match processors.classify(id, c, length, FlankContext::new(before, after)) {
            Some(run) => segments.push(Segment {
                span: piece,
                text: ast.slice(piece).to_owned(),
                run: Some(run),
            }),
            None => push_text(segments, piece, ast.slice(piece)),
        }
    }
}

/// Appends text, extending the previous text segment when it touches.
fn push_text(segments: &mut Vec<Segment>, piece: Span, text: &str) {
    match segments.last_mut() {
        Some(last) if last.run.is_none() && last.span.end == piece.start => {
            last.span.end = piece.end;
            last.text.push_str(text);
        }
        _ => segments.push(Segment {
            span: piece,
            text: text.to_owned(),
            run: None,
        }),
    }
}

/// Lines up the source of a text node, starting at byte `offset`, with the
/// value the block parser gave it.
///
/// Returns `None` when the two cannot be matched up; such a node is left
/// as it is.
fn align(source: &str, value: &str, offset: u32) -> Option<Vec<Piece>> {
    let end = offset + source.len() as u32;
    if source == value {
        return Some(vec![Piece::Verbatim(Span::new(offset, end))]);
    }

    let mut pieces = Vec::new();
    let (mut src, mut val) = (0usize, 0usize);
    while src < source.len() {
        let rest = &source[src..];
        let value_rest = &value[val..];
        let start = offset + src as u32;

        if let Some((consumed, decoded)) =
            escape(rest, value_rest).or_else(|| reference(rest, value_rest))
        {
            let span = Span::new(start, start + consumed as u32);
            push_decoded(&mut pieces, span, &value_rest[..decoded]);
            src += consumed;
            val += decoded;
            continue;
        }

        let c = rest.chars().next()?;
        let span = Span::new(start, start + c.len_utf8() as u32);
        if value_rest.starts_with(c) {
            push_verbatim(&mut pieces, span);
            val += c.len_utf8();
        } else if is_stripped(c) {
            push_decoded(&mut pieces, span, "");
        } else {
            return None;
        }
        src += c.len_utf8();
    }

    (val == value.len()).then_some(pieces)
}

/// A backslash escape: `\*` in the source reads `*` in the value.
///
/// Returns the source and value byte lengths.
fn escape(rest: &str, value_rest: &str) -> Option<(usize, usize)> {
    let mut chars = rest.chars();
    if chars.next()? != '\\' {
        return None;
    }
    let escaped = chars.next().filter(char::is_ascii_punctuation)?;
    value_rest.starts_with(escaped).then_some((2, 1))
}

/// A character reference: `&amp;` in the source reads `&` in the value.
///
/// Returns the source and value byte lengths. A named reference may decode
/// to two characters; the shorter reading that lets the source continue
/// wins.
fn reference(rest: &str, value_rest: &str) -> Option<(usize, usize)> {
    let len = reference_len(rest)?;
    // Unknown names stay literal
    if value_rest.starts_with(&rest[..len]) {
        return None;
    }

    let after = &rest[len..];
    let max_chars = if rest[1..].starts_with('#') { 1 } else { 2 };
    let mut decoded = 0;
    let mut shortest = None;
    for c in value_rest.chars().take(max_chars) {
        decoded += c.len_utf8();
        shortest.get_or_insert(decoded);
        if resumes(after, &value_rest[decoded..]) {
            return Some((len, decoded));
        }
    }
    shortest.map(|decoded| (len, decoded))
}

/// Byte length of a `&name;`, `&#123;` or `&#x7B;` reference at the start
/// of `rest`.
fn reference_len(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix('&')?;
    let end = body.find(';')?;
    let name = &body[..end];

    let valid = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        (1..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else if let Some(digits) = name.strip_prefix('#') {
        (1..=7).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
    } else {
        (1..=31).contains(&name.len())
            && name.starts_with(|c: char| c.is_ascii_alphabetic())
            && name.chars().all(|c| c.is_ascii_alphanumeric())
    };
    valid.then_some(end + 2)
}

/// True if the source after a decoded stretch can carry on into the value.
fn resumes(source: &str, value: &str) -> bool {
    match (source.chars().next(), value.chars().next()) {
        (None, None) => true,
        (Some(s), Some(v)) => s == v || matches!(s, '\\' | '&') || is_stripped(s),
        (Some(s), None) => is_stripped(s),
        (None, Some(_)) => false,
    }
}

/// Characters the block parser drops from text: indentation, spaces before
/// a line ending and blockquote markers.
fn is_stripped(c: char) -> bool {
    matches!(c, ' ' | '\t' | '>')
}

fn push_verbatim(pieces: &mut Vec<Piece>, span: Span) {
    if let Some(Piece::Verbatim(last)) = pieces.last_mut()
        && last.end == span.start
    {
        last.end = span.end;
        return;
    }
    pieces.push(Piece::Verbatim(span));
}

fn push_decoded(pieces: &mut Vec<Piece>, span: Span, text: &str) {
    if let Some(Piece::Decoded(last, value)) = pieces.last_mut()
        && last.end == span.start
    {
        last.end = span.end;
        value.push_str(text);
        return;
    }
    pieces.push(Piece::Decoded(span, text.to_owned()));
}
