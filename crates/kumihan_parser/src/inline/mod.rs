//! Inline delimiter resolution.
//!
//! The block parser leaves every delimiter character as plain text. This
//! module turns runs like `*`, `**`, `~~` or `+` into nested composite
//! nodes:
//!
//! 1. [`resolve_delimiters`] walks each inline container, splits runs of
//!    registered characters into their own `Str` nodes and classifies them
//!    with the CommonMark flanking rules.
//! 2. [`process_delimiters`] pairs openers with closers on the resulting
//!    [`DelimiterStack`], asking the run's [`DelimiterProcessor`] how many
//!    characters to consume and which node to build.
//!
//! Processors are looked up by character in a [`DelimiterProcessors`]
//! registry, which may hold several processors per character as long as
//! their minimum run lengths differ.

mod emphasis;
mod engine;
mod processor;
mod run;
mod scanner;
mod strikethrough;
mod underline;

pub use emphasis::EmphasisDelimiterProcessor;
pub use engine::{MatchStats, process_delimiters};
pub use processor::{DelimiterProcessor, DelimiterProcessors, ProcessorId};
pub use run::{DelimiterRun, DelimiterStack, FlankContext};
pub use scanner::resolve_delimiters;
pub use strikethrough::StrikethroughDelimiterProcessor;
pub use underline::UnderlineDelimiterProcessor;
