//! Post-processor traits.
//!
//! Post-processors run on a finished tree. Node processors are invoked once
//! per node of the types their factory declares interest in; document
//! processors see the whole tree once, after all node processors.
//!
//! Every structural edit must be reported to the [`NodeTracker`] right after
//! it is made.

use kumihan_ast::{Ast, NodeId, NodeType};

use crate::{NodeTracker, PostProcessError};

/// Processes one node of an interest type.
pub trait NodePostProcessor {
    /// Processes `node`, which is attached and has not been reported
    /// removed.
    fn process(
        &mut self,
        tracker: &mut NodeTracker,
        ast: &mut Ast,
        node: NodeId,
    ) -> Result<(), PostProcessError>;
}

/// Creates a [`NodePostProcessor`] per run.
///
/// # Example
///
/// ```rust
/// use kumihan_ast::{Ast, NodeId, NodeType};
/// use kumihan_core::{NodePostProcessor, NodePostProcessorFactory, NodeTracker, PostProcessError};
///
/// struct DropBreaks;
///
/// impl NodePostProcessor for DropBreaks {
///     fn process(
///         &mut self,
///         tracker: &mut NodeTracker,
///         ast: &mut Ast,
///         node: NodeId,
///     ) -> Result<(), PostProcessError> {
///         ast.unlink(node);
///         tracker.node_removed(ast, node)?;
///         Ok(())
///     }
/// }
///
/// struct DropBreaksFactory;
///
/// impl NodePostProcessorFactory for DropBreaksFactory {
///     fn name(&self) -> &str {
///         "drop-breaks"
///     }
///
///     fn interest(&self) -> &[NodeType] {
///         &[NodeType::Break]
///     }
///
///     fn create(&self, _ast: &Ast) -> Box<dyn NodePostProcessor> {
///         Box::new(DropBreaks)
///     }
/// }
/// ```
pub trait NodePostProcessorFactory: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Node types this processor is invoked for.
    fn interest(&self) -> &[NodeType];

    fn create(&self, ast: &Ast) -> Box<dyn NodePostProcessor>;
}

/// Processes the whole document at once.
pub trait DocumentPostProcessor {
    fn process(
        &mut self,
        tracker: &mut NodeTracker,
        ast: &mut Ast,
    ) -> Result<(), PostProcessError>;
}

/// Creates a [`DocumentPostProcessor`] per run.
pub trait DocumentPostProcessorFactory: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    fn create(&self, ast: &Ast) -> Box<dyn DocumentPostProcessor>;
}
