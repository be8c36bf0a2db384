use lupine_serialization::ArgsPayload;
use serde::{Deserialize, Serialize};

/// Identifier of a step, unique within its workflow.
pub type StepId = String;

/// Sentinel step id of the workflow driver itself. The driver's output
/// metadata lives directly under the workflow's steps directory and records
/// which step holds the workflow's live result.
pub const ROOT_DRIVER_STEP_ID: &str = "";

/// The kind of a workflow step.
///
/// This is a closed set: a metadata document carrying any other tag fails to
/// decode, which inspection reports as a non-recoverable step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
  Function,
  ActorMethod,
  ReadonlyActorMethod,
}

fn default_max_retries() -> u32 {
  1
}

/// The input metadata document of a step (`inputs.json`).
///
/// Lists the live handles embedded in the step's arguments plus the execution
/// policy the engine needs to re-run the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInputMetadata {
  /// Hex identities of the object references in the arguments.
  pub object_refs: Vec<String>,
  /// Root step ids of the nested workflows in the arguments.
  pub workflows: Vec<StepId>,
  /// Step ids of the dynamically bound workflow references in the arguments.
  pub workflow_refs: Vec<StepId>,
  /// How many times the engine retries the step on application exceptions.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Whether application exceptions are caught and returned instead of
  /// propagated.
  #[serde(default)]
  pub catch_exceptions: bool,
  /// Opaque backend execution options, interpreted by the engine only.
  #[serde(default)]
  pub task_options: serde_json::Value,
  pub step_type: StepType,
}

/// The output metadata document of a step (`outputs.json`).
///
/// Written instead of a concrete output when the step returned a nested
/// workflow. `output_step_id` is fixed at creation; `dynamic_output_step_id`,
/// once set, takes precedence and only ever advances to a deeper step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutputMetadata {
  pub output_step_id: StepId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dynamic_output_step_id: Option<StepId>,
}

impl StepOutputMetadata {
  pub fn new(output_step_id: StepId) -> Self {
    Self {
      output_step_id,
      dynamic_output_step_id: None,
    }
  }

  /// The step currently holding the authoritative output.
  pub fn resolved_step_id(&self) -> &StepId {
    self
      .dynamic_output_step_id
      .as_ref()
      .unwrap_or(&self.output_step_id)
  }

  /// Consuming form of [`resolved_step_id`](Self::resolved_step_id).
  pub fn into_resolved_step_id(self) -> StepId {
    self
      .dynamic_output_step_id
      .unwrap_or(self.output_step_id)
  }
}

/// Everything needed to checkpoint the inputs of one step of a sub-workflow:
/// its metadata document, opaque function body, and bound arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSpec {
  pub step_id: StepId,
  pub inputs: StepInputMetadata,
  pub func_body: Vec<u8>,
  pub args: ArgsPayload,
}
