//! Step inspection: classifying a step's on-disk artifacts into the
//! recoverability verdict consumed by the execution engine's resume logic.

use std::collections::HashSet;

use lupine_workflow::{StepId, StepInputMetadata};
use tracing::warn;

use crate::WorkflowStorage;
use crate::error::CheckpointError;
use crate::keys;

/// The recoverability verdict for one step, in checking order: a concrete
/// output wins over output metadata, which wins over input-based
/// recoverability.
#[derive(Debug, Clone, PartialEq)]
pub enum StepInspectResult {
  /// A concrete output artifact exists; nothing needs to run.
  OutputAvailable,
  /// Output metadata exists: the authoritative output lives at
  /// `output_step_id` and the caller must recurse into it.
  OutputForwarded { output_step_id: StepId },
  /// Input metadata parsed; the step can be re-executed iff its arguments
  /// and function body were both checkpointed.
  InputsAvailable {
    args_exist: bool,
    func_body_exists: bool,
    metadata: StepInputMetadata,
  },
  /// Input metadata is absent or unparseable; only raw existence flags are
  /// known and the step cannot be recovered.
  Incomplete {
    args_exist: bool,
    func_body_exists: bool,
  },
}

impl StepInspectResult {
  /// Whether the step can be resumed without re-submitting the workflow:
  /// its output is readable, forwarded, or re-executable from complete
  /// inputs.
  pub fn is_recoverable(&self) -> bool {
    match self {
      StepInspectResult::OutputAvailable | StepInspectResult::OutputForwarded { .. } => true,
      StepInspectResult::InputsAvailable {
        args_exist,
        func_body_exists,
        ..
      } => *args_exist && *func_body_exists,
      StepInspectResult::Incomplete { .. } => false,
    }
  }
}

impl WorkflowStorage {
  /// Classify the checkpoint state of a step.
  ///
  /// Precedence is fixed: a concrete output short-circuits everything, then
  /// output metadata (resolved through the dynamic pointer), then input
  /// metadata. A missing or corrupt input metadata document degrades to the
  /// reduced [`StepInspectResult::Incomplete`] verdict rather than failing
  /// the inspection.
  pub async fn inspect_step(&self, step_id: &str) -> Result<StepInspectResult, CheckpointError> {
    let names = self
      .store
      .scan(&keys::step_prefix(&self.workflow_id, step_id))
      .await?;
    let names: HashSet<&str> = names.iter().map(String::as_str).collect();

    if names.contains(keys::STEP_OUTPUT) {
      return Ok(StepInspectResult::OutputAvailable);
    }
    if names.contains(keys::STEP_OUTPUTS_METADATA) {
      let output_step_id = self.locate_output_step_id(step_id).await?;
      return Ok(StepInspectResult::OutputForwarded { output_step_id });
    }

    let args_exist = names.contains(keys::STEP_ARGS);
    let func_body_exists = names.contains(keys::STEP_FUNC_BODY);
    let input_key = keys::step_input_metadata(&self.workflow_id, step_id);
    match self.store.get_doc::<StepInputMetadata>(&input_key).await {
      Ok(metadata) => Ok(StepInspectResult::InputsAvailable {
        args_exist,
        func_body_exists,
        metadata,
      }),
      Err(e) => {
        if !e.is_not_found() {
          warn!(
            workflow_id = %self.workflow_id,
            step_id,
            error = %e,
            "step input metadata unreadable; reporting reduced verdict"
          );
        }
        Ok(StepInspectResult::Incomplete {
          args_exist,
          func_body_exists,
        })
      }
    }
  }
}
