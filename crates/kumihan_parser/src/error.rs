//! Parse error types.

use thiserror::Error;

/// Errors that can occur during parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source text is invalid.
    #[error("Invalid source: {message}")]
    InvalidSource {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a new invalid source error.
    pub fn invalid_source(message: impl Into<String>) -> Self {
        Self::InvalidSource {
            message: message.into(),
        }
    }
}

/// Errors raised while assembling a delimiter processor registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two processors claim the same character with the same minimum length,
    /// so a run could not be assigned to exactly one of them.
    #[error("Delimiter processor conflict with delimiter char '{delimiter}' (min length {min_length})")]
    Conflict {
        /// The contested delimiter character.
        delimiter: char,
        /// The minimum run length both processors declare.
        min_length: usize,
    },

    /// A processor declared a minimum run length of zero.
    #[error("Delimiter processor for '{delimiter}' must have a minimum length of at least 1")]
    ZeroMinLength {
        /// The processor's opening character.
        delimiter: char,
    },
}
