//! Error types for post-processing and pipeline runs.

use std::path::PathBuf;

use kumihan_ast::{IntegrityError, NodeId};
use kumihan_parser::{ParseError, RegistryError};
use thiserror::Error;

/// A post-processor reported a structural change that did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// A node reported as added has no parent.
    #[error("node {node} was reported added but is not linked into the tree")]
    NotLinked { node: NodeId },

    /// A node reported as removed still has a parent or siblings.
    #[error("node {node} was reported removed but is still linked")]
    NotDetached { node: NodeId },

    /// A node was reported removed twice, or reported added after removal.
    #[error("node {node} was already reported removed")]
    AlreadyRemoved { node: NodeId },
}

/// Errors that fail a post-processing run.
#[derive(Debug, Error)]
pub enum PostProcessError {
    /// A processor broke a tracker precondition.
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// The tree is structurally inconsistent.
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// A node left the tree without being reported removed.
    #[error("node {node} became unreachable without being reported removed")]
    Unreported { node: NodeId },

    /// A node reported removed is still reachable from the root.
    #[error("node {node} was reported removed but is still reachable")]
    RemovedButReachable { node: NodeId },

    /// A processor failed for its own reasons.
    #[error("Post-processor {name} failed: {message}")]
    Processor { name: String, message: String },
}

impl PostProcessError {
    /// Creates a processor-specific error.
    pub fn processor(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processor {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is malformed or fails schema validation.
    #[error("Configuration error: {0}")]
    Invalid(String),

    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured delimiter processors cannot share a registry.
    #[error("Delimiter conflict: {0}")]
    DelimiterConflict(#[from] RegistryError),
}

impl ConfigError {
    /// Creates an invalid configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Errors returned by [`Pipeline::process`](crate::Pipeline::process).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Post-processing error.
    #[error("Post-processing error: {0}")]
    PostProcess(#[from] PostProcessError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
