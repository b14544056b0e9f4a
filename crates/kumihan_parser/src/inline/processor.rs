//! Delimiter processor trait and the per-character registry.

use std::collections::HashMap;
use std::sync::Arc;

use kumihan_ast::{NodeId, NodeType};

use super::{DelimiterRun, FlankContext};
use crate::RegistryError;

/// Policy for one kind of delimiter run.
///
/// A processor decides which runs may open or close, how many characters a
/// matched pair consumes and which node type the pair becomes.
///
/// # Example
///
/// ```rust
/// use kumihan_ast::NodeType;
/// use kumihan_parser::{DelimiterProcessor, DelimiterRun};
///
/// /// `=highlight=`
/// struct Highlight;
///
/// impl DelimiterProcessor for Highlight {
///     fn opening_char(&self) -> char {
///         '='
///     }
///
///     fn closing_char(&self) -> char {
///         '='
///     }
///
///     fn min_length(&self) -> usize {
///         1
///     }
///
///     fn delimiter_use(&self, _opener: &DelimiterRun, _closer: &DelimiterRun) -> usize {
///         1
///     }
///
///     fn node_type(&self, _units: usize) -> NodeType {
///         NodeType::Underline
///     }
/// }
/// ```
pub trait DelimiterProcessor: Send + Sync {
    /// Character that opens a run.
    fn opening_char(&self) -> char;

    /// Character that closes a run. Usually the same as [`Self::opening_char`].
    fn closing_char(&self) -> char;

    /// Minimum number of characters a run needs before it can take part in a
    /// match.
    fn min_length(&self) -> usize;

    /// Number of characters to consume from both runs of a candidate pair.
    ///
    /// Returning 0 (or less than [`Self::min_length`]) rejects the candidate;
    /// the engine then keeps looking for an earlier opener. The result must
    /// not exceed either run's remaining length.
    fn delimiter_use(&self, opener: &DelimiterRun, closer: &DelimiterRun) -> usize;

    /// Whether a run with this flanking context may open.
    fn can_be_opener(&self, flank: &FlankContext) -> bool {
        flank.left_flanking
    }

    /// Whether a run with this flanking context may close.
    fn can_be_closer(&self, flank: &FlankContext) -> bool {
        flank.right_flanking
    }

    /// Node type of the composite built from a pair consuming `units`
    /// characters.
    fn node_type(&self, units: usize) -> NodeType;

    /// Text that replaces a run left unmatched, or `None` to keep the run's
    /// characters as they are.
    fn unmatched_delimiter(&self, _run: &DelimiterRun) -> Option<String> {
        None
    }

    /// If true, runs that can neither open nor close are not pushed at all.
    fn skip_non_opener_closer(&self) -> bool {
        false
    }
}

/// Index of a processor inside a [`DelimiterProcessors`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessorId(usize);

impl ProcessorId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Registry mapping delimiter characters to processors.
///
/// Several processors may share a character as long as their minimum
/// lengths differ. A run is assigned to the processor with the largest
/// minimum length it satisfies, falling back to the smallest minimum. When
/// a pair is matched, the opener's remaining length picks the processor.
#[derive(Clone, Default)]
pub struct DelimiterProcessors {
    processors: Vec<Arc<dyn DelimiterProcessor>>,
    /// Processor ids per character, by descending minimum length.
    by_char: HashMap<char, Vec<ProcessorId>>,
}

impl std::fmt::Debug for DelimiterProcessors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut chars: Vec<_> = self.by_char.keys().copied().collect();
        chars.sort_unstable();
        f.debug_struct("DelimiterProcessors")
            .field("len", &self.processors.len())
            .field("chars", &chars)
            .finish()
    }
}

impl DelimiterProcessors {
    /// Builds a registry from a list of processors.
    pub fn new(
        processors: impl IntoIterator<Item = Arc<dyn DelimiterProcessor>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for processor in processors {
            registry.register(processor)?;
        }
        Ok(registry)
    }

    /// Registry holding emphasis (`*`, `_`), strikethrough (`~`) and
    /// underline (`+`).
    pub fn builtin() -> Self {
        let result = Self::new([
            Arc::new(super::EmphasisDelimiterProcessor::asterisk()) as Arc<dyn DelimiterProcessor>,
            Arc::new(super::EmphasisDelimiterProcessor::underscore()),
            Arc::new(super::StrikethroughDelimiterProcessor),
            Arc::new(super::UnderlineDelimiterProcessor),
        ]);
        debug_assert!(result.is_ok(), "built-in processors must not conflict");
        result.unwrap_or_default()
    }

    /// Adds a processor under its opening and closing characters.
    pub fn register(&mut self, processor: Arc<dyn DelimiterProcessor>) -> Result<(), RegistryError> {
        let opening = processor.opening_char();
        let closing = processor.closing_char();
        let min_length = processor.min_length();

        if min_length == 0 {
            return Err(RegistryError::ZeroMinLength { delimiter: opening });
        }

        let chars: &[char] = if opening == closing {
            &[opening]
        } else {
            &[opening, closing]
        };

        for &c in chars {
            if let Some(group) = self.by_char.get(&c)
                && group
                    .iter()
                    .any(|id| self.processors[id.0].min_length() == min_length)
            {
                return Err(RegistryError::Conflict {
                    delimiter: c,
                    min_length,
                });
            }
        }

        let id = ProcessorId(self.processors.len());
        self.processors.push(processor);
        for &c in chars {
            let group = self.by_char.entry(c).or_default();
            group.push(id);
            let processors = &self.processors;
            group.sort_by_key(|id| std::cmp::Reverse(processors[id.0].min_length()));
        }
        Ok(())
    }

    /// Returns true if any processor uses `c`.
    #[inline]
    pub fn contains(&self, c: char) -> bool {
        self.by_char.contains_key(&c)
    }

    /// Picks the processor for a run of `length` characters `c`.
    pub fn resolve(&self, c: char, length: usize) -> Option<ProcessorId> {
        let group = self.by_char.get(&c)?;
        group
            .iter()
            .find(|id| self.processors[id.0].min_length() <= length)
            .or_else(|| group.last())
            .copied()
    }

    /// Smallest minimum length among the processors using `c`.
    pub fn min_length(&self, c: char) -> Option<usize> {
        let group = self.by_char.get(&c)?;
        group.last().map(|id| self.processors[id.0].min_length())
    }

    #[inline]
    pub fn get(&self, id: ProcessorId) -> &dyn DelimiterProcessor {
        self.processors[id.0].as_ref()
    }

    /// Builds a delimiter run for `length` characters `c` held by `node`.
    ///
    /// Returns `None` if no processor uses `c`, or if the run can neither
    /// open nor close and its processor skips such runs.
    pub fn classify(
        &self,
        node: NodeId,
        c: char,
        length: usize,
        flank: FlankContext,
    ) -> Option<DelimiterRun> {
        let id = self.resolve(c, length)?;
        let processor = self.get(id);

        let can_open = c == processor.opening_char() && processor.can_be_opener(&flank);
        let can_close = c == processor.closing_char() && processor.can_be_closer(&flank);
        if !can_open && !can_close && processor.skip_non_opener_closer() {
            return None;
        }

        Some(DelimiterRun {
            node,
            delimiter_char: c,
            length,
            original_length: length,
            flank,
            can_open,
            can_close,
            processor: id,
            active: true,
        })
    }

    /// Number of registered processors.
    #[inline]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kumihan_ast::Ast;
    use rstest::rstest;

    struct Fixed {
        c: char,
        min: usize,
        node_type: NodeType,
    }

    impl DelimiterProcessor for Fixed {
        fn opening_char(&self) -> char {
            self.c
        }

        fn closing_char(&self) -> char {
            self.c
        }

        fn min_length(&self) -> usize {
            self.min
        }

        fn delimiter_use(&self, _opener: &DelimiterRun, _closer: &DelimiterRun) -> usize {
            self.min
        }

        fn node_type(&self, _units: usize) -> NodeType {
            self.node_type
        }
    }

    fn fixed(c: char, min: usize, node_type: NodeType) -> Arc<dyn DelimiterProcessor> {
        Arc::new(Fixed { c, min, node_type })
    }

    #[test]
    fn test_builtin_chars() {
        let registry = DelimiterProcessors::builtin();

        assert_eq!(registry.len(), 4);
        for c in ['*', '_', '~', '+'] {
            assert!(registry.contains(c), "missing {c}");
        }
        assert!(!registry.contains('='));
    }

    #[test]
    fn test_conflict_same_char_same_min() {
        let result = DelimiterProcessors::new([
            fixed('=', 1, NodeType::Underline),
            fixed('=', 1, NodeType::Emphasis),
        ]);

        assert_eq!(
            result.unwrap_err(),
            RegistryError::Conflict {
                delimiter: '=',
                min_length: 1
            }
        );
    }

    #[test]
    fn test_zero_min_length_rejected() {
        let result = DelimiterProcessors::new([fixed('=', 0, NodeType::Underline)]);

        assert_eq!(
            result.unwrap_err(),
            RegistryError::ZeroMinLength { delimiter: '=' }
        );
    }

    #[rstest]
    #[case::below_all_minimums(1, 1)]
    #[case::exact_small(2, 1)]
    #[case::exact_large(3, 0)]
    #[case::above_all(5, 0)]
    fn test_staggered_resolution(#[case] length: usize, #[case] expected_index: usize) {
        let registry = DelimiterProcessors::new([
            fixed('=', 3, NodeType::Strong),
            fixed('=', 2, NodeType::Emphasis),
        ])
        .unwrap();

        let id = registry.resolve('=', length).unwrap();
        assert_eq!(id.index(), expected_index);
        assert_eq!(registry.min_length('='), Some(2));
        assert_eq!(registry.min_length('*'), None);
    }

    #[test]
    fn test_classify_unknown_char() {
        let ast = Ast::new("");
        let registry = DelimiterProcessors::builtin();

        let flank = FlankContext::new(None, Some('a'));
        assert!(registry.classify(ast.root(), '=', 1, flank).is_none());
    }

    #[test]
    fn test_classify_flags() {
        let ast = Ast::new("");
        let registry = DelimiterProcessors::builtin();

        let run = registry
            .classify(ast.root(), '+', 1, FlankContext::new(None, Some('a')))
            .unwrap();
        assert!(run.can_open());
        assert!(!run.can_close());
        assert_eq!(run.length(), 1);
        assert_eq!(run.original_length(), 1);
    }
}
