//! Lupine Workflow
//!
//! Shared domain types for the checkpoint layer: step type tags, workflow
//! status, the metadata documents persisted per step, and the description of
//! a not-yet-executed sub-workflow graph.

mod object;
mod step;
mod workflow;

pub use object::ObjectHandle;
pub use step::{
  ROOT_DRIVER_STEP_ID, StepId, StepInputMetadata, StepOutputMetadata, StepSpec, StepType,
};
pub use workflow::{
  SubWorkflow, WorkflowMetadata, WorkflowProgress, WorkflowStatus, WorkflowSummary,
};
