//! The key-space builder: the sole mapping from (workflow, step, artifact)
//! to storage keys. No other module concatenates key strings.
//!
//! Layout:
//! ```text
//! workflow_id/steps/<step_id>/{inputs.json, outputs.json, args.bin,
//!                              output.bin, func_body.bin}
//! workflow_id/objects/<object_hex>
//! workflow_id/{class_body.bin, workflow_meta.json}
//! workflow_id/steps/progress.json
//! workflow_id/duplicate_name_counter/<step_name>
//! ```

use lupine_storage::StorageKey;

pub(crate) const STEPS_DIR: &str = "steps";
pub(crate) const OBJECTS_DIR: &str = "objects";
pub(crate) const DUPLICATE_NAME_COUNTER: &str = "duplicate_name_counter";

pub(crate) const STEP_INPUTS_METADATA: &str = "inputs.json";
pub(crate) const STEP_OUTPUTS_METADATA: &str = "outputs.json";
pub(crate) const STEP_ARGS: &str = "args.bin";
pub(crate) const STEP_OUTPUT: &str = "output.bin";
pub(crate) const STEP_FUNC_BODY: &str = "func_body.bin";
pub(crate) const CLASS_BODY: &str = "class_body.bin";
pub(crate) const WORKFLOW_META: &str = "workflow_meta.json";
pub(crate) const WORKFLOW_PROGRESS: &str = "progress.json";

fn step_dir(workflow_id: &str, step_id: &str) -> StorageKey {
  let key = StorageKey::root().child(workflow_id).child(STEPS_DIR);
  // the root driver's artifacts live directly under the steps directory
  if step_id.is_empty() { key } else { key.child(step_id) }
}

pub(crate) fn step_prefix(workflow_id: &str, step_id: &str) -> StorageKey {
  step_dir(workflow_id, step_id)
}

pub(crate) fn step_input_metadata(workflow_id: &str, step_id: &str) -> StorageKey {
  step_dir(workflow_id, step_id).child(STEP_INPUTS_METADATA)
}

pub(crate) fn step_output_metadata(workflow_id: &str, step_id: &str) -> StorageKey {
  step_dir(workflow_id, step_id).child(STEP_OUTPUTS_METADATA)
}

pub(crate) fn step_args(workflow_id: &str, step_id: &str) -> StorageKey {
  step_dir(workflow_id, step_id).child(STEP_ARGS)
}

pub(crate) fn step_output(workflow_id: &str, step_id: &str) -> StorageKey {
  step_dir(workflow_id, step_id).child(STEP_OUTPUT)
}

pub(crate) fn step_func_body(workflow_id: &str, step_id: &str) -> StorageKey {
  step_dir(workflow_id, step_id).child(STEP_FUNC_BODY)
}

pub(crate) fn object_record(workflow_id: &str, object_hex: &str) -> StorageKey {
  StorageKey::root()
    .child(workflow_id)
    .child(OBJECTS_DIR)
    .child(object_hex)
}

pub(crate) fn class_body(workflow_id: &str) -> StorageKey {
  StorageKey::root().child(workflow_id).child(CLASS_BODY)
}

pub(crate) fn workflow_metadata(workflow_id: &str) -> StorageKey {
  StorageKey::root().child(workflow_id).child(WORKFLOW_META)
}

pub(crate) fn workflow_progress(workflow_id: &str) -> StorageKey {
  StorageKey::root()
    .child(workflow_id)
    .child(STEPS_DIR)
    .child(WORKFLOW_PROGRESS)
}

pub(crate) fn duplicate_name_counter(workflow_id: &str, step_name: &str) -> StorageKey {
  StorageKey::root()
    .child(workflow_id)
    .child(DUPLICATE_NAME_COUNTER)
    .child(step_name)
}
