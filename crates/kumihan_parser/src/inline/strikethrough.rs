//! `~~strikethrough~~`.

use kumihan_ast::NodeType;

use super::{DelimiterProcessor, DelimiterRun};

/// Pairs runs of at least two `~` into `Delete` nodes.
///
/// A single `~` never matches and stays literal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrikethroughDelimiterProcessor;

impl DelimiterProcessor for StrikethroughDelimiterProcessor {
    fn opening_char(&self) -> char {
        '~'
    }

    fn closing_char(&self) -> char {
        '~'
    }

    fn min_length(&self) -> usize {
        2
    }

    fn delimiter_use(&self, opener: &DelimiterRun, closer: &DelimiterRun) -> usize {
        if opener.length >= 2 && closer.length >= 2 {
            2
        } else {
            0
        }
    }

    fn node_type(&self, _units: usize) -> NodeType {
        NodeType::Delete
    }
}
