//! Integration tests for the checkpoint store and recovery resolver.

use std::collections::BTreeMap;
use std::sync::Arc;

use lupine_checkpoint::{
  CheckpointError, StepInspectResult, StepReturn, TaskOutput, WorkflowStorage, list_workflow,
};
use lupine_serialization::{ArgSlot, ArgsPayload, ResolvingContext};
use lupine_storage::{MemoryStorage, Storage, StorageKey};
use lupine_workflow::{
  ObjectHandle, StepInputMetadata, StepSpec, StepType, SubWorkflow, WorkflowMetadata,
  WorkflowStatus,
};
use serde_json::json;

const WORKFLOW_ID: &str = "wf-test";

fn create_storage() -> (Arc<MemoryStorage>, WorkflowStorage) {
  let backend = Arc::new(MemoryStorage::new());
  let storage = WorkflowStorage::new(WORKFLOW_ID, backend.clone());
  (backend, storage)
}

fn test_inputs() -> StepInputMetadata {
  StepInputMetadata {
    object_refs: vec!["deadbeef".to_string()],
    workflows: vec!["child".to_string()],
    workflow_refs: vec![],
    max_retries: 3,
    catch_exceptions: true,
    task_options: json!({"num_cpus": 1}),
    step_type: StepType::Function,
  }
}

fn test_step_spec(step_id: &str) -> StepSpec {
  StepSpec {
    step_id: step_id.to_string(),
    inputs: test_inputs(),
    func_body: format!("func body of {step_id}").into_bytes(),
    args: ArgsPayload {
      args: vec![
        ArgSlot::Literal { value: json!(42) },
        ArgSlot::ObjectRef { index: 0 },
        ArgSlot::Workflow { index: 0 },
      ],
      kwargs: BTreeMap::from([("key".to_string(), ArgSlot::Literal { value: json!("v") })]),
    },
  }
}

fn value_return(bytes: &[u8]) -> StepReturn {
  StepReturn::Value(TaskOutput::Inline(bytes.to_vec()))
}

#[tokio::test]
async fn concrete_output_round_trips() {
  let (_, storage) = create_storage();
  storage
    .save_step_output("a", value_return(b"result"), None)
    .await
    .unwrap();
  assert_eq!(storage.load_step_output("a").await.unwrap(), b"result");
}

#[tokio::test]
async fn object_backed_output_stores_resolved_payload() {
  let (_, storage) = create_storage();
  let handle = ObjectHandle::new("cafe", b"resolved".to_vec());
  storage
    .save_step_output("a", StepReturn::Value(TaskOutput::Object(handle)), None)
    .await
    .unwrap();
  assert_eq!(storage.load_step_output("a").await.unwrap(), b"resolved");
}

#[tokio::test]
async fn missing_output_is_not_found() {
  let (_, storage) = create_storage();
  let err = storage.load_step_output("ghost").await.unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn subworkflow_checkpoints_every_node() {
  let (_, storage) = create_storage();
  let mut workflow = SubWorkflow::new("root");
  workflow.push_step(test_step_spec("root"));
  workflow.push_step(test_step_spec("leaf"));
  storage.save_subworkflow(&workflow).await.unwrap();

  for step_id in ["root", "leaf"] {
    let verdict = storage.inspect_step(step_id).await.unwrap();
    assert!(verdict.is_recoverable(), "step {step_id} should be recoverable");
    assert_eq!(
      storage.load_step_func_body(step_id).await.unwrap(),
      format!("func body of {step_id}").into_bytes()
    );
  }
}

#[tokio::test]
async fn step_args_round_trip_with_live_substitutes() {
  let (_, storage) = create_storage();
  let mut workflow = SubWorkflow::new("root");
  workflow.push_step(test_step_spec("root"));
  storage.save_subworkflow(&workflow).await.unwrap();

  let ctx = ResolvingContext::new(
    vec![json!({"child": "output"})],
    vec![json!([1, 2])],
    vec![],
  );
  let resolved = storage.load_step_args("root", &ctx).await.unwrap();
  assert_eq!(
    resolved.args,
    vec![json!(42), json!([1, 2]), json!({"child": "output"})]
  );
  assert_eq!(resolved.kwargs["key"], json!("v"));
}

#[tokio::test]
async fn gen_step_id_counts_from_zero() {
  let (_, storage) = create_storage();
  for expected in 0u64..4 {
    assert_eq!(storage.gen_step_id("fetch").await.unwrap(), expected);
  }
  // an unrelated name has its own counter
  assert_eq!(storage.gen_step_id("compute").await.unwrap(), 0);
}

#[tokio::test]
async fn object_refs_are_independent_of_steps() {
  let (_, storage) = create_storage();
  let handle = ObjectHandle::new("deadbeef", b"shared value".to_vec());
  storage.save_object_ref(&handle).await.unwrap();

  let loaded = storage.load_object_ref("deadbeef").await.unwrap();
  assert_eq!(loaded.hex(), "deadbeef");
  assert_eq!(loaded.payload(), b"shared value");
}

#[tokio::test]
async fn actor_class_body_round_trips() {
  let (_, storage) = create_storage();
  storage
    .save_actor_class_body(b"class body".to_vec())
    .await
    .unwrap();
  assert_eq!(storage.load_actor_class_body().await.unwrap(), b"class body");
}

#[tokio::test]
async fn inspect_prefers_concrete_output_over_everything() {
  let (_, storage) = create_storage();
  let mut workflow = SubWorkflow::new("a");
  workflow.push_step(test_step_spec("a"));
  storage.save_subworkflow(&workflow).await.unwrap();
  // both an output metadata document and a concrete output on the same step
  storage
    .save_step_output("a", StepReturn::Workflow { root_step_id: "b".to_string() }, None)
    .await
    .unwrap();
  storage
    .save_step_output("a", value_return(b"final"), None)
    .await
    .unwrap();

  assert_eq!(
    storage.inspect_step("a").await.unwrap(),
    StepInspectResult::OutputAvailable
  );
}

#[tokio::test]
async fn inspect_forwarded_matches_locate() {
  let (_, storage) = create_storage();
  storage
    .save_step_output("a", StepReturn::Workflow { root_step_id: "b".to_string() }, None)
    .await
    .unwrap();
  storage.update_dynamic_output("a", "c").await.unwrap();

  let located = storage.locate_output_step_id("a").await.unwrap();
  assert_eq!(located, "c");
  assert_eq!(
    storage.inspect_step("a").await.unwrap(),
    StepInspectResult::OutputForwarded {
      output_step_id: located,
    }
  );
}

#[tokio::test]
async fn inspect_empty_step_is_incomplete() {
  let (_, storage) = create_storage();
  let verdict = storage.inspect_step("nothing").await.unwrap();
  assert_eq!(
    verdict,
    StepInspectResult::Incomplete {
      args_exist: false,
      func_body_exists: false,
    }
  );
  assert!(!verdict.is_recoverable());
}

#[tokio::test]
async fn inspect_full_inputs_is_reexecutable() {
  let (_, storage) = create_storage();
  let mut workflow = SubWorkflow::new("b");
  workflow.push_step(test_step_spec("b"));
  storage.save_subworkflow(&workflow).await.unwrap();

  let verdict = storage.inspect_step("b").await.unwrap();
  match &verdict {
    StepInspectResult::InputsAvailable {
      args_exist,
      func_body_exists,
      metadata,
    } => {
      assert!(*args_exist && *func_body_exists);
      assert_eq!(metadata.max_retries, 3);
      assert!(metadata.catch_exceptions);
      assert_eq!(metadata.step_type, StepType::Function);
      assert_eq!(metadata.object_refs, vec!["deadbeef"]);
    }
    other => panic!("unexpected verdict: {other:?}"),
  }
  assert!(verdict.is_recoverable());
}

#[tokio::test]
async fn inspect_degrades_on_unknown_step_type() {
  let (backend, storage) = create_storage();
  // a metadata document carrying a step type this engine does not know
  let doc = json!({
    "object_refs": [],
    "workflows": [],
    "workflow_refs": [],
    "step_type": "quantum_method",
  });
  backend
    .put(
      &StorageKey::from_segments([WORKFLOW_ID, "steps", "x", "inputs.json"]),
      serde_json::to_vec(&doc).unwrap(),
      true,
    )
    .await
    .unwrap();

  let verdict = storage.inspect_step("x").await.unwrap();
  assert_eq!(
    verdict,
    StepInspectResult::Incomplete {
      args_exist: false,
      func_body_exists: false,
    }
  );
  assert!(!verdict.is_recoverable());
}

#[tokio::test]
async fn update_dynamic_output_is_idempotent_and_advance_only() {
  let (backend, storage) = create_storage();
  storage
    .save_step_output("outer", StepReturn::Workflow { root_step_id: "direct".to_string() }, None)
    .await
    .unwrap();

  // a candidate equal to the direct pointer is a no-op
  storage.update_dynamic_output("outer", "direct").await.unwrap();
  let raw = backend
    .get(
      &StorageKey::from_segments([WORKFLOW_ID, "steps", "outer", "outputs.json"]),
      true,
    )
    .await
    .unwrap();
  assert!(!String::from_utf8(raw).unwrap().contains("dynamic_output_step_id"));

  storage.update_dynamic_output("outer", "deeper").await.unwrap();
  assert_eq!(storage.locate_output_step_id("outer").await.unwrap(), "deeper");

  // applying the same candidate again changes nothing
  storage.update_dynamic_output("outer", "deeper").await.unwrap();
  assert_eq!(storage.locate_output_step_id("outer").await.unwrap(), "deeper");

  storage.update_dynamic_output("outer", "deepest").await.unwrap();
  assert_eq!(storage.locate_output_step_id("outer").await.unwrap(), "deepest");
}

#[tokio::test]
async fn entrypoint_shortcuts_a_deep_nesting_chain() {
  let (_, storage) = create_storage();
  // the driver returns the first nested workflow
  storage
    .save_step_output("", StepReturn::Workflow { root_step_id: "s1".to_string() }, None)
    .await
    .unwrap();
  // each completion discovers one more nesting level; every one advances the
  // outermost step's pointer
  for depth in 2..=8 {
    let nested = format!("s{depth}");
    let parent = format!("s{}", depth - 1);
    storage
      .save_step_output(&parent, StepReturn::Workflow { root_step_id: nested }, Some("s1"))
      .await
      .unwrap();
  }
  storage
    .save_step_output("s8", value_return(b"deep result"), Some("s1"))
    .await
    .unwrap();

  assert_eq!(storage.get_entrypoint_step_id().await.unwrap(), "s8");
}

#[tokio::test]
async fn entrypoint_of_unstarted_workflow_names_the_workflow() {
  let (_, storage) = create_storage();
  let err = storage.get_entrypoint_step_id().await.unwrap_err();
  match err {
    CheckpointError::Entrypoint { workflow_id, .. } => assert_eq!(workflow_id, WORKFLOW_ID),
    other => panic!("unexpected error: {other:?}"),
  }
}

#[tokio::test]
async fn root_driver_sentinel_never_triggers_shortcut_updates() {
  let (_, storage) = create_storage();
  storage
    .save_step_output("", StepReturn::Workflow { root_step_id: "a".to_string() }, None)
    .await
    .unwrap();
  // outer_most_step_id equal to the sentinel must not rewrite the root
  storage
    .save_step_output("a", value_return(b"v"), Some(""))
    .await
    .unwrap();
  assert_eq!(storage.locate_output_step_id("").await.unwrap(), "a");
}

#[tokio::test]
async fn recovery_scenario_advances_the_outermost_pointer() {
  let (_, storage) = create_storage();
  // the driver's result is step A
  storage
    .save_step_output("", StepReturn::Workflow { root_step_id: "a".to_string() }, None)
    .await
    .unwrap();
  // A returned a nested workflow rooted at C
  storage
    .save_step_output("a", StepReturn::Workflow { root_step_id: "c".to_string() }, None)
    .await
    .unwrap();
  // C forwards to B
  storage
    .save_step_output("c", StepReturn::Workflow { root_step_id: "b".to_string() }, Some("a"))
    .await
    .unwrap();
  assert_eq!(
    storage.inspect_step("c").await.unwrap(),
    StepInspectResult::OutputForwarded {
      output_step_id: "b".to_string(),
    }
  );

  // B completes with a concrete output, naming A as the outermost step
  storage
    .save_step_output("b", value_return(b"done"), Some("a"))
    .await
    .unwrap();

  assert_eq!(storage.locate_output_step_id("a").await.unwrap(), "b");
  assert_eq!(storage.get_entrypoint_step_id().await.unwrap(), "b");
}

#[tokio::test]
async fn workflow_meta_absence_is_none() {
  let (_, storage) = create_storage();
  assert_eq!(storage.load_workflow_meta().await.unwrap(), None);

  storage
    .save_workflow_meta(&WorkflowMetadata {
      status: WorkflowStatus::Running,
    })
    .await
    .unwrap();
  assert_eq!(
    storage.load_workflow_meta().await.unwrap(),
    Some(WorkflowMetadata {
      status: WorkflowStatus::Running,
    })
  );
}

#[tokio::test]
async fn progress_marker_round_trips() {
  let (_, storage) = create_storage();
  assert!(storage.get_latest_progress().await.unwrap_err().is_not_found());

  storage.advance_progress("step-7").await.unwrap();
  assert_eq!(storage.get_latest_progress().await.unwrap(), "step-7");

  storage.advance_progress("step-8").await.unwrap();
  assert_eq!(storage.get_latest_progress().await.unwrap(), "step-8");
}

#[tokio::test]
async fn listing_tolerates_missing_and_broken_metadata() {
  let backend = Arc::new(MemoryStorage::new());

  let healthy = WorkflowStorage::new("wf-healthy", backend.clone());
  healthy
    .save_workflow_meta(&WorkflowMetadata {
      status: WorkflowStatus::Successful,
    })
    .await
    .unwrap();

  // a workflow with steps but no metadata record yet
  let unregistered = WorkflowStorage::new("wf-unregistered", backend.clone());
  unregistered
    .save_step_output("a", value_return(b"v"), None)
    .await
    .unwrap();

  // a workflow whose metadata document is corrupt
  backend
    .put(
      &StorageKey::from_segments(["wf-broken", "workflow_meta.json"]),
      b"not json".to_vec(),
      true,
    )
    .await
    .unwrap();

  let mut summaries = list_workflow(backend).await.unwrap();
  summaries.sort_by(|a, b| a.workflow_id.cmp(&b.workflow_id));
  let ids: Vec<_> = summaries.iter().map(|s| s.workflow_id.as_str()).collect();
  assert_eq!(ids, vec!["wf-broken", "wf-healthy", "wf-unregistered"]);
  assert_eq!(summaries[0].status, None);
  assert_eq!(summaries[1].status, Some(WorkflowStatus::Successful));
  assert_eq!(summaries[2].status, None);
}

#[tokio::test]
async fn partial_step_writes_report_as_non_recoverable() {
  let (backend, storage) = create_storage();
  // only the function body landed; metadata and args writes were lost
  backend
    .put(
      &StorageKey::from_segments([WORKFLOW_ID, "steps", "p", "func_body.bin"]),
      b"body".to_vec(),
      false,
    )
    .await
    .unwrap();

  let verdict = storage.inspect_step("p").await.unwrap();
  assert_eq!(
    verdict,
    StepInspectResult::Incomplete {
      args_exist: false,
      func_body_exists: true,
    }
  );
  assert!(!verdict.is_recoverable());
}
