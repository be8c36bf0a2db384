//! Lupine Checkpoint
//!
//! The durable-state layer of the workflow engine. It persists the inputs,
//! outputs, and control metadata of individual steps into a hierarchical
//! key-value layout, and resolves how to recover an interrupted workflow
//! from whatever partial checkpoint state survived.
//!
//! [`WorkflowStorage`] is the single entry point, scoped to one workflow and
//! one backend handle, both injected explicitly:
//! - step artifacts: outputs (concrete or forwarding), function bodies,
//!   arguments, sub-workflow graphs, object records, actor class bodies
//! - dynamic-output shortcutting: the pointer protocol that keeps the
//!   workflow root one hop away from the deepest authoritative output
//! - step inspection: the four-way recoverability verdict the execution
//!   engine consumes when resuming
//! - workflow metadata, progress markers, and listing

mod artifacts;
mod error;
mod inspect;
mod keys;
mod registry;
mod resolver;
mod store;

pub use artifacts::{StepReturn, TaskOutput};
pub use error::CheckpointError;
pub use inspect::StepInspectResult;
pub use registry::list_workflow;
pub use store::CheckpointStore;

use std::sync::Arc;

use lupine_storage::Storage;

/// Checkpointed state of one workflow.
///
/// All operations address storage through the key-space builder and route
/// I/O through the [`CheckpointStore`] wrappers, which classify backend
/// failures into [`CheckpointError`] kinds.
pub struct WorkflowStorage {
  workflow_id: String,
  store: CheckpointStore,
}

impl WorkflowStorage {
  /// Create storage for a workflow over the given backend.
  pub fn new(workflow_id: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      store: CheckpointStore::new(storage),
    }
  }

  pub fn workflow_id(&self) -> &str {
    &self.workflow_id
  }
}
