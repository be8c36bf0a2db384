use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use lupine_checkpoint::{StepInspectResult, WorkflowStorage, list_workflow};
use lupine_storage::FsStorage;
use lupine_workflow::WorkflowStatus;

/// Lupine - checkpoint store and recovery resolver for workflows
#[derive(Parser)]
#[command(name = "lupine")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.lupine)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List known workflows and their statuses
  List,

  /// Inspect the recoverability of a single step
  Inspect {
    /// The workflow ID
    #[arg(long)]
    workflow: String,

    /// The step ID
    #[arg(long)]
    step: String,
  },

  /// Resolve the step currently holding a workflow's live result
  Entrypoint {
    /// The workflow ID
    #[arg(long)]
    workflow: String,
  },
}

fn status_label(status: Option<WorkflowStatus>) -> &'static str {
  match status {
    Some(WorkflowStatus::Running) => "running",
    Some(WorkflowStatus::Canceled) => "canceled",
    Some(WorkflowStatus::Successful) => "successful",
    Some(WorkflowStatus::Failed) => "failed",
    Some(WorkflowStatus::Resumable) => "resumable",
    None => "unknown",
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let data_dir = cli.data_dir.unwrap_or_else(|| {
    dirs::home_dir()
      .expect("could not determine home directory")
      .join(".lupine")
  });
  let backend = Arc::new(FsStorage::new(data_dir));

  match cli.command {
    Commands::List => {
      let summaries = list_workflow(backend)
        .await
        .context("failed to list workflows")?;
      if summaries.is_empty() {
        println!("no workflows found");
      }
      for summary in summaries {
        println!("{}\t{}", summary.workflow_id, status_label(summary.status));
      }
    }

    Commands::Inspect { workflow, step } => {
      let storage = WorkflowStorage::new(&workflow, backend);
      let verdict = storage
        .inspect_step(&step)
        .await
        .with_context(|| format!("failed to inspect step '{step}'"))?;
      match &verdict {
        StepInspectResult::OutputAvailable => println!("output: available"),
        StepInspectResult::OutputForwarded { output_step_id } => {
          println!("output: forwarded to step '{output_step_id}'");
        }
        StepInspectResult::InputsAvailable {
          args_exist,
          func_body_exists,
          metadata,
        } => {
          println!("inputs: metadata present");
          println!("  args checkpointed: {args_exist}");
          println!("  func body checkpointed: {func_body_exists}");
          println!("  step type: {:?}", metadata.step_type);
          println!("  max retries: {}", metadata.max_retries);
        }
        StepInspectResult::Incomplete {
          args_exist,
          func_body_exists,
        } => {
          println!("inputs: metadata missing or unreadable");
          println!("  args checkpointed: {args_exist}");
          println!("  func body checkpointed: {func_body_exists}");
        }
      }
      println!("recoverable: {}", verdict.is_recoverable());
    }

    Commands::Entrypoint { workflow } => {
      let storage = WorkflowStorage::new(&workflow, backend);
      let step_id = storage
        .get_entrypoint_step_id()
        .await
        .context("failed to resolve entrypoint")?;
      println!("{step_id}");
    }
  }

  Ok(())
}
