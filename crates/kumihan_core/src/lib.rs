//! # kumihan_core
//!
//! Post-processing engine for Kumihan.
//!
//! This crate provides:
//! - The `NodeTracker` change ledger
//! - Post-processor traits and the `PostProcessorManager` dispatcher
//! - Built-in post-processors
//! - Configuration loading
//! - The `Pipeline` orchestrator tying parsing and post-processing together
//!
//! ## Example
//!
//! ```rust
//! use kumihan_core::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::from_json(r#"{ "post_processors": ["replace-links"] }"#)?;
//! let pipeline = Pipeline::from_config(&config)?;
//!
//! let processed = pipeline.process("[foo](http://example.com) **baz**")?;
//! let json = serde_json::to_string(&processed.ast).unwrap();
//! assert!(json.contains("\"Strong\""));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod manager;
mod pipeline;
mod post_processor;
pub mod processors;
mod tracker;

pub use config::{DelimiterKind, PipelineConfig, PostProcessorKind};
pub use error::{ConfigError, PipelineError, PostProcessError, TrackerError};
pub use manager::PostProcessorManager;
pub use pipeline::{Pipeline, Processed};
pub use post_processor::{
    DocumentPostProcessor, DocumentPostProcessorFactory, NodePostProcessor,
    NodePostProcessorFactory,
};
pub use tracker::{NodeTracker, TrackerEvent, TrackerEventKind};
