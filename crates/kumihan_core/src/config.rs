//! Pipeline configuration.

use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use jsonschema::Validator;
use kumihan_parser::{
    DelimiterProcessor, DelimiterProcessors, EmphasisDelimiterProcessor,
    StrikethroughDelimiterProcessor, UnderlineDelimiterProcessor,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::processors::LinkReplacingPostProcessorFactory;
use crate::{ConfigError, PostProcessorManager};

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Configuration for a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Delimiter processors to register.
    #[serde(default = "default_delimiters")]
    pub delimiters: Vec<DelimiterKind>,

    /// Post-processors to run, in order.
    #[serde(default)]
    pub post_processors: Vec<PostProcessorKind>,
}

fn default_delimiters() -> Vec<DelimiterKind> {
    vec![
        DelimiterKind::Emphasis,
        DelimiterKind::Strikethrough,
        DelimiterKind::Underline,
    ]
}

/// Built-in delimiter processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelimiterKind {
    /// `*` and `_`.
    Emphasis,
    /// `~~`.
    Strikethrough,
    /// `+`.
    Underline,
}

/// Built-in post-processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostProcessorKind {
    /// Replaces links and images with their label text.
    ReplaceLinks,
}

impl PipelineConfig {
    /// Creates the default configuration: all built-in delimiters, no
    /// post-processors.
    pub fn new() -> Self {
        Self {
            delimiters: default_delimiters(),
            post_processors: Vec::new(),
        }
    }

    /// Loads configuration from a file.
    ///
    /// The file may contain comments and trailing commas.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Loading pipeline config from {}", path.display());
        Self::from_jsonc(&content)
    }

    /// Parses configuration from a JSON string with schema validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ConfigError::invalid(format!("Invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Parses configuration from a JSONC string with schema validation.
    ///
    /// An empty document yields the default configuration.
    pub fn from_jsonc(jsonc: &str) -> Result<Self, ConfigError> {
        let options = jsonc_parser::ParseOptions::default();
        let value = jsonc_parser::parse_to_serde_value(jsonc, &options)
            .map_err(|e| ConfigError::invalid(format!("Invalid JSONC: {}", e)))?
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
        Self::from_value(value)
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        // Initialize and check schema
        let schema = CONFIG_SCHEMA.get_or_init(|| {
            let schema_json: serde_json::Value =
                serde_json::from_str(SCHEMA_JSON).expect("Invalid embedded config schema");
            Validator::new(&schema_json).expect("Invalid config schema compilation")
        });

        if let Err(e) = schema.validate(&value) {
            let error_msg = format!("{} at {}", e, e.instance_path());
            return Err(ConfigError::invalid(format!(
                "Config validation failed: {}",
                error_msg
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| ConfigError::invalid(format!("Invalid config: {}", e)))
    }

    /// Builds the delimiter registry named by [`Self::delimiters`].
    ///
    /// Listing a kind twice is a conflict.
    pub fn delimiter_processors(&self) -> Result<DelimiterProcessors, ConfigError> {
        let mut processors: Vec<Arc<dyn DelimiterProcessor>> = Vec::new();
        for kind in &self.delimiters {
            match kind {
                DelimiterKind::Emphasis => {
                    processors.push(Arc::new(EmphasisDelimiterProcessor::asterisk()));
                    processors.push(Arc::new(EmphasisDelimiterProcessor::underscore()));
                }
                DelimiterKind::Strikethrough => {
                    processors.push(Arc::new(StrikethroughDelimiterProcessor));
                }
                DelimiterKind::Underline => processors.push(Arc::new(UnderlineDelimiterProcessor)),
            }
        }
        Ok(DelimiterProcessors::new(processors)?)
    }

    /// Builds the post-processor manager named by [`Self::post_processors`].
    pub fn post_processor_manager(&self) -> PostProcessorManager {
        let mut manager = PostProcessorManager::new();
        for kind in &self.post_processors {
            match kind {
                PostProcessorKind::ReplaceLinks => {
                    manager.add_node_factory(Arc::new(LinkReplacingPostProcessorFactory));
                }
            }
        }
        manager
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
