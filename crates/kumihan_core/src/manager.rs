//! Post-processor dispatch.

use std::collections::HashSet;
use std::sync::Arc;

use kumihan_ast::{Ast, NodeId, check_integrity};
use tracing::{debug, trace};

use crate::{
    DocumentPostProcessorFactory, NodePostProcessorFactory, NodeTracker, PostProcessError,
};

/// Runs registered post-processors over a tree and verifies the result.
///
/// Node processors run in registration order. Each one sees a fresh
/// pre-order snapshot of the nodes it is interested in, so it observes the
/// edits of the processors before it. Document processors run last.
#[derive(Clone, Default)]
pub struct PostProcessorManager {
    node_factories: Vec<Arc<dyn NodePostProcessorFactory>>,
    document_factories: Vec<Arc<dyn DocumentPostProcessorFactory>>,
}

impl std::fmt::Debug for PostProcessorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node: Vec<_> = self
            .node_factories
            .iter()
            .map(|factory| factory.name())
            .collect();
        let document: Vec<_> = self
            .document_factories
            .iter()
            .map(|factory| factory.name())
            .collect();
        f.debug_struct("PostProcessorManager")
            .field("node_factories", &node)
            .field("document_factories", &document)
            .finish()
    }
}

impl PostProcessorManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node_factory(&mut self, factory: Arc<dyn NodePostProcessorFactory>) {
        self.node_factories.push(factory);
    }

    pub fn add_document_factory(&mut self, factory: Arc<dyn DocumentPostProcessorFactory>) {
        self.document_factories.push(factory);
    }

    /// Builder-style [`Self::add_node_factory`].
    pub fn with_node_factory(mut self, factory: Arc<dyn NodePostProcessorFactory>) -> Self {
        self.add_node_factory(factory);
        self
    }

    /// Builder-style [`Self::add_document_factory`].
    pub fn with_document_factory(mut self, factory: Arc<dyn DocumentPostProcessorFactory>) -> Self {
        self.add_document_factory(factory);
        self
    }

    /// Number of registered factories of both kinds.
    pub fn len(&self) -> usize {
        self.node_factories.len() + self.document_factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every processor over `ast` and returns the change ledger.
    ///
    /// Fails if a processor breaks a tracker precondition, or if afterwards
    /// the tree is inconsistent with what was reported.
    pub fn run(&self, ast: &mut Ast) -> Result<NodeTracker, PostProcessError> {
        let initial = check_integrity(ast)?;
        let mut tracker = NodeTracker::new();

        for factory in &self.node_factories {
            let interest = factory.interest();
            let targets: Vec<NodeId> = ast
                .descendants(ast.root())
                .filter(|&id| interest.contains(&ast.node(id).node_type))
                .collect();
            if targets.is_empty() {
                trace!(processor = factory.name(), "No nodes of interest");
                continue;
            }

            let mut processor = factory.create(ast);
            let mut processed = 0usize;
            for node in targets {
                // An earlier call may have removed or detached it.
                if tracker.was_removed(node) || !ast.is_attached(node) {
                    continue;
                }
                processor.process(&mut tracker, ast, node)?;
                processed += 1;
            }
            debug!(
                processor = factory.name(),
                nodes = processed,
                "Ran node post-processor"
            );
        }

        for factory in &self.document_factories {
            let mut processor = factory.create(ast);
            processor.process(&mut tracker, ast)?;
            debug!(processor = factory.name(), "Ran document post-processor");
        }

        verify(ast, &initial, &tracker)?;
        Ok(tracker)
    }
}

/// Checks the tree against the tracker's ledger.
fn verify(
    ast: &Ast,
    initial: &HashSet<NodeId>,
    tracker: &NodeTracker,
) -> Result<(), PostProcessError> {
    let reachable = check_integrity(ast)?;

    let expected = ast
        .ids()
        .filter(|id| initial.contains(id))
        .chain(tracker.added());
    for node in expected {
        if !reachable.contains(&node) && !removed_with_ancestor(ast, tracker, node) {
            return Err(PostProcessError::Unreported { node });
        }
    }

    if let Some(node) = tracker.removed().find(|node| reachable.contains(node)) {
        return Err(PostProcessError::RemovedButReachable { node });
    }

    Ok(())
}

/// True if `node` or one of its ancestors was reported removed.
fn removed_with_ancestor(ast: &Ast, tracker: &NodeTracker, node: NodeId) -> bool {
    std::iter::once(node)
        .chain(ast.ancestors(node))
        .any(|id| tracker.was_removed(id))
}
