//! Parse-then-post-process orchestration.

use std::sync::Arc;

use kumihan_ast::Ast;
use kumihan_parser::{MarkdownParser, Parser};
use tracing::debug;

use crate::{ConfigError, NodeTracker, PipelineConfig, PipelineError, PostProcessorManager};

/// Result of one pipeline run.
#[derive(Debug)]
pub struct Processed {
    /// The final tree.
    pub ast: Ast,
    /// Changes made by post-processors.
    pub tracker: NodeTracker,
}

/// A parser plus the post-processors to run on its output.
///
/// A pipeline holds no per-document state and can be shared across
/// threads; every [`Self::process`] call builds its own tree and tracker.
///
/// # Example
///
/// ```rust
/// use kumihan_core::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::from_json(r#"{ "post_processors": ["replace-links"] }"#).unwrap();
/// let pipeline = Pipeline::from_config(&config).unwrap();
///
/// let processed = pipeline.process("[foo](http://example.com) +bar+").unwrap();
/// assert_eq!(processed.tracker.removed().count(), 1);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    parser: Arc<dyn Parser>,
    post_processors: PostProcessorManager,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("parser", &self.parser.name())
            .field("post_processors", &self.post_processors)
            .finish()
    }
}

impl Pipeline {
    pub fn new(parser: impl Parser + 'static, post_processors: PostProcessorManager) -> Self {
        Self {
            parser: Arc::new(parser),
            post_processors,
        }
    }

    /// Assembles the built-in processors named by `config`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let delimiters = config.delimiter_processors()?;
        let parser = MarkdownParser::with_delimiters(Arc::new(delimiters));
        Ok(Self::new(parser, config.post_processor_manager()))
    }

    pub fn parser(&self) -> &dyn Parser {
        self.parser.as_ref()
    }

    pub fn post_processors(&self) -> &PostProcessorManager {
        &self.post_processors
    }

    /// Parses `source` and runs the post-processors on the result.
    pub fn process(&self, source: &str) -> Result<Processed, PipelineError> {
        let mut ast = self.parser.parse(source)?;
        let tracker = self.post_processors.run(&mut ast)?;

        debug!(
            parser = self.parser.name(),
            events = tracker.events().len(),
            "Processed document"
        );
        Ok(Processed { ast, tracker })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(MarkdownParser::new(), PostProcessorManager::new())
    }
}
