//! `+underline+`.

use kumihan_ast::NodeType;

use super::{DelimiterProcessor, DelimiterRun};

/// Pairs single `+` runs into `Underline` nodes, one character per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnderlineDelimiterProcessor;

impl DelimiterProcessor for UnderlineDelimiterProcessor {
    fn opening_char(&self) -> char {
        '+'
    }

    fn closing_char(&self) -> char {
        '+'
    }

    fn min_length(&self) -> usize {
        1
    }

    fn delimiter_use(&self, opener: &DelimiterRun, closer: &DelimiterRun) -> usize {
        if opener.length >= 1 && closer.length >= 1 {
            1
        } else {
            0
        }
    }

    fn node_type(&self, _units: usize) -> NodeType {
        NodeType::Underline
    }
}
