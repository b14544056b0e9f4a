//! Delimiter runs and their flanking context.

use kumihan_ast::NodeId;

use super::ProcessorId;

/// Characters immediately around a delimiter run, classified the way the
/// CommonMark flanking rules need them.
///
/// The start and end of the input count as whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlankContext {
    pub before: Option<char>,
    pub after: Option<char>,
    pub before_is_whitespace: bool,
    pub after_is_whitespace: bool,
    pub before_is_punctuation: bool,
    pub after_is_punctuation: bool,
    pub left_flanking: bool,
    pub right_flanking: bool,
}

impl FlankContext {
    /// Classifies the characters before and after a run.
    pub fn new(before: Option<char>, after: Option<char>) -> Self {
        let before_is_whitespace = before.is_none_or(char::is_whitespace);
        let after_is_whitespace = after.is_none_or(char::is_whitespace);
        let before_is_punctuation = before.is_some_and(is_punctuation);
        let after_is_punctuation = after.is_some_and(is_punctuation);

        let left_flanking = !after_is_whitespace
            && (!after_is_punctuation || before_is_whitespace || before_is_punctuation);
        let right_flanking = !before_is_whitespace
            && (!before_is_punctuation || after_is_whitespace || after_is_punctuation);

        Self {
            before,
            after,
            before_is_whitespace,
            after_is_whitespace,
            before_is_punctuation,
            after_is_punctuation,
            left_flanking,
            right_flanking,
        }
    }
}

/// ASCII punctuation plus any non-ASCII symbol that is neither alphanumeric
/// nor whitespace.
pub(crate) fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_punctuation()
    } else {
        !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control()
    }
}

/// A run of identical delimiter characters waiting to be matched.
///
/// The run's text lives in the tree as a `Str` node; `length` tracks how
/// many characters of it are still unconsumed.
#[derive(Debug, Clone)]
pub struct DelimiterRun {
    pub(crate) node: NodeId,
    pub(crate) delimiter_char: char,
    pub(crate) length: usize,
    pub(crate) original_length: usize,
    pub(crate) flank: FlankContext,
    pub(crate) can_open: bool,
    pub(crate) can_close: bool,
    pub(crate) processor: ProcessorId,
    pub(crate) active: bool,
}

impl DelimiterRun {
    /// The `Str` node holding the run's remaining characters.
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn delimiter_char(&self) -> char {
        self.delimiter_char
    }

    /// Number of characters not yet consumed by a match.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of characters the run had when it was scanned.
    #[inline]
    pub fn original_length(&self) -> usize {
        self.original_length
    }

    #[inline]
    pub fn flank(&self) -> &FlankContext {
        &self.flank
    }

    #[inline]
    pub fn can_open(&self) -> bool {
        self.can_open
    }

    #[inline]
    pub fn can_close(&self) -> bool {
        self.can_close
    }

    /// The processor this run is matched against.
    #[inline]
    pub fn processor(&self) -> ProcessorId {
        self.processor
    }
}

/// Delimiter runs of one inline container, in document order.
#[derive(Debug, Clone, Default)]
pub struct DelimiterStack {
    pub(crate) runs: Vec<DelimiterRun>,
}

impl DelimiterStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a run. Runs must be pushed in document order and their nodes
    /// must be siblings under one container.
    pub fn push(&mut self, run: DelimiterRun) {
        self.runs.push(run);
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DelimiterRun> {
        self.runs.iter()
    }
}
