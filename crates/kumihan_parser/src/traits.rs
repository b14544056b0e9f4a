//! Parser trait definition.

use kumihan_ast::Ast;

use crate::ParseError;

/// Trait for parsing source text into a document tree.
///
/// Implementations produce a finished [`Ast`]: block structure, inline
/// tokens and resolved delimiter runs. Post-processing happens afterwards,
/// outside the parser.
///
/// # Example
///
/// ```rust,ignore
/// use kumihan_parser::Parser;
/// use kumihan_ast::Ast;
///
/// struct MyParser;
///
/// impl Parser for MyParser {
///     fn name(&self) -> &str {
///         "my-parser"
///     }
///
///     fn parse(&self, source: &str) -> Result<Ast, ParseError> {
///         // Parse implementation
///         todo!()
///     }
/// }
/// ```
pub trait Parser: Send + Sync {
    /// Returns the name of this parser.
    fn name(&self) -> &str;

    /// Parses the source text into a document tree.
    fn parse(&self, source: &str) -> Result<Ast, ParseError>;
}
