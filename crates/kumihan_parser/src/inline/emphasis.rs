//! Emphasis and strong emphasis with `*` and `_`.

use kumihan_ast::NodeType;

use super::{DelimiterProcessor, DelimiterRun, FlankContext};

/// `*em*`, `**strong**` and the `_` equivalents.
///
/// A pair of runs that both hold two or more characters becomes `Strong`,
/// otherwise `Emphasis`. `_` does not open or close inside a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmphasisDelimiterProcessor {
    delimiter: char,
}

impl EmphasisDelimiterProcessor {
    pub const fn asterisk() -> Self {
        Self { delimiter: '*' }
    }

    pub const fn underscore() -> Self {
        Self { delimiter: '_' }
    }
}

impl DelimiterProcessor for EmphasisDelimiterProcessor {
    fn opening_char(&self) -> char {
        self.delimiter
    }

    fn closing_char(&self) -> char {
        self.delimiter
    }

    fn min_length(&self) -> usize {
        1
    }

    fn delimiter_use(&self, opener: &DelimiterRun, closer: &DelimiterRun) -> usize {
        // "Rule of 3": a run that can both open and close only pairs when the
        // combined original lengths are not a multiple of 3, unless both are.
        if (opener.can_close || closer.can_open)
            && (opener.original_length + closer.original_length) % 3 == 0
            && !(opener.original_length % 3 == 0 && closer.original_length % 3 == 0)
        {
            return 0;
        }

        if opener.length >= 2 && closer.length >= 2 {
            2
        } else {
            1
        }
    }

    fn can_be_opener(&self, flank: &FlankContext) -> bool {
        match self.delimiter {
            '_' => {
                flank.left_flanking && (!flank.right_flanking || flank.before_is_punctuation)
            }
            _ => flank.left_flanking,
        }
    }

    fn can_be_closer(&self, flank: &FlankContext) -> bool {
        match self.delimiter {
            '_' => {
                flank.right_flanking && (!flank.left_flanking || flank.after_is_punctuation)
            }
            _ => flank.right_flanking,
        }
    }

    fn node_type(&self, units: usize) -> NodeType {
        if units == 2 {
            NodeType::Strong
        } else {
            NodeType::Emphasis
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::asterisk_intraword(EmphasisDelimiterProcessor::asterisk(), true, true)]
    #[case::underscore_intraword(EmphasisDelimiterProcessor::underscore(), false, false)]
    fn test_intraword(
        #[case] processor: EmphasisDelimiterProcessor,
        #[case] opens: bool,
        #[case] closes: bool,
    ) {
        // "a*b" / "a_b"
        let flank = FlankContext::new(Some('a'), Some('b'));

        assert_eq!(processor.can_be_opener(&flank), opens);
        assert_eq!(processor.can_be_closer(&flank), closes);
    }

    #[test]
    fn test_underscore_after_punctuation_opens() {
        // "(_foo"
        let flank = FlankContext::new(Some('('), Some('f'));

        assert!(EmphasisDelimiterProcessor::underscore().can_be_opener(&flank));
    }

    #[rstest]
    #[case(1, NodeType::Emphasis)]
    #[case(2, NodeType::Strong)]
    fn test_node_type(#[case] units: usize, #[case] expected: NodeType) {
        assert_eq!(
            EmphasisDelimiterProcessor::asterisk().node_type(units),
            expected
        );
    }
}
