//! # kumihan_parser
//!
//! Parser layer for Kumihan.
//!
//! This crate provides:
//! - A `Parser` trait for implementing custom parsers
//! - Built-in Markdown parser using `markdown-rs`
//! - The inline delimiter engine: a pluggable [`DelimiterProcessor`] per
//!   marker character, a [`DelimiterProcessors`] registry and the matching
//!   algorithm that turns runs like `+text+` into composite nodes
//!
//! ## Architecture
//!
//! markdown-rs produces the block structure and non-delimiter inline nodes.
//! Delimiter characters arrive as plain text and are resolved afterwards
//! by [`resolve_delimiters`], so new markers only need a new processor.
//!
//! ## Example
//!
//! ```rust
//! use kumihan_ast::NodeType;
//! use kumihan_parser::{MarkdownParser, Parser};
//!
//! let parser = MarkdownParser::new();
//! let ast = parser.parse("+underline+").unwrap();
//!
//! let paragraph = ast.children(ast.root()).next().unwrap();
//! let underline = ast.children(paragraph).next().unwrap();
//! assert_eq!(ast.node(underline).node_type, NodeType::Underline);
//! ```

mod error;
pub mod inline;
mod markdown;
mod traits;

pub use error::{ParseError, RegistryError};
pub use inline::{
    DelimiterProcessor, DelimiterProcessors, DelimiterRun, DelimiterStack,
    EmphasisDelimiterProcessor, FlankContext, MatchStats, ProcessorId,
    StrikethroughDelimiterProcessor, UnderlineDelimiterProcessor, process_delimiters,
    resolve_delimiters,
};
pub use markdown::MarkdownParser;
pub use traits::Parser;
