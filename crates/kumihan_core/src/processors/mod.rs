//! Built-in post-processors.

mod link_replacing;

pub use link_replacing::{LinkReplacingPostProcessor, LinkReplacingPostProcessorFactory};
