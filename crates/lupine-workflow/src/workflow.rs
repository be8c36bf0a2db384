use serde::{Deserialize, Serialize};

use crate::step::{StepId, StepSpec};

/// Status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
  Running,
  Canceled,
  Successful,
  Failed,
  Resumable,
}

/// The workflow-level metadata document (`workflow_meta.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
  pub status: WorkflowStatus,
}

/// The progress marker document (`steps/progress.json`): the step that
/// produced the most recently observed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowProgress {
  pub step_id: StepId,
}

/// One entry of a workflow listing. `status` is `None` when the workflow's
/// metadata is missing or failed to load.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSummary {
  pub workflow_id: String,
  pub status: Option<WorkflowStatus>,
}

/// A nested workflow graph that has not been executed yet.
///
/// Steps are independent until execution starts, so their inputs can be
/// checkpointed concurrently.
#[derive(Debug, Clone)]
pub struct SubWorkflow {
  root_step_id: StepId,
  steps: Vec<StepSpec>,
  executed: bool,
}

impl SubWorkflow {
  pub fn new(root_step_id: impl Into<StepId>) -> Self {
    Self {
      root_step_id: root_step_id.into(),
      steps: Vec::new(),
      executed: false,
    }
  }

  /// Add a step to the graph.
  pub fn push_step(&mut self, step: StepSpec) {
    self.steps.push(step);
  }

  pub fn root_step_id(&self) -> &StepId {
    &self.root_step_id
  }

  pub fn steps(&self) -> &[StepSpec] {
    &self.steps
  }

  pub fn executed(&self) -> bool {
    self.executed
  }

  /// Mark the graph as handed to the execution engine. Checkpointing an
  /// executed graph is a contract violation.
  pub fn mark_executed(&mut self) {
    self.executed = true;
  }
}
