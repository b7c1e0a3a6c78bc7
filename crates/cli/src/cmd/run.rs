//! Implementation of the `tg run` command.
//!
//! Runs the requested targets (or the default targets) from the build file
//! and prints the build summary. Two request shapes do not run anything:
//! - no targets and no default targets prints the target listing
//! - `<target> help` prints help for that target

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::{OwoColorize, Stream};
use tracing::info;

use tgraph_lib::execute::{RunOptions, RunResult, Scheduler, TargetOutcome, UnknownTargetPolicy};

use super::describe::print_target_help;
use super::list::print_targets;
use super::load_project;
use crate::output::{
  OutputFormat, format_duration, print_error, print_json, print_stat, print_success, print_warning, symbols,
};

#[derive(Args, Debug)]
pub struct RunArgs {
  /// Targets to run (default targets if omitted)
  pub targets: Vec<String>,

  /// Run each requested target as its own concurrent unit
  #[arg(short, long)]
  pub parallel: bool,

  /// Maximum number of concurrent units (default: TGRAPH_PARALLELISM or CPU count)
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Warn about unknown targets and run the rest instead of failing
  #[arg(long)]
  pub warn_unknown: bool,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

pub fn cmd_run(file: &Path, args: RunArgs) -> Result<ExitCode> {
  let mut project = load_project(file)?;

  if let [name, help] = args.targets.as_slice()
    && help == "help"
  {
    print_target_help(&project.registry, name, args.output)?;
    return Ok(ExitCode::SUCCESS);
  }

  if args.targets.is_empty() && project.registry.default_target_names().is_empty() {
    print_targets(&project.registry, false, args.output)?;
    return Ok(ExitCode::SUCCESS);
  }

  if let Some(jobs) = args.jobs {
    project.config.parallelism = jobs.max(1);
  }

  let options = RunOptions {
    parallel: args.parallel,
    unknown_targets: if args.warn_unknown {
      UnknownTargetPolicy::Warn
    } else {
      UnknownTargetPolicy::Fail
    },
  };

  let scheduler = Scheduler::new(project.registry, project.context, project.config);

  info!(targets = ?args.targets, parallel = args.parallel, "running targets");
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt.block_on(scheduler.run_with(&args.targets, options));

  if args.output.is_json() {
    print_json(&run_json(&result))?;
  } else {
    print_run(&result);
  }

  Ok(exit_code(result.exit_code()))
}

fn print_run(result: &RunResult) {
  for name in &result.unknown_targets {
    print_warning(&format!("Target {} not found, skipped", name));
  }

  if !result.summary.entries.is_empty() {
    println!();
    println!("Build summary:");
    for entry in &result.summary.entries {
      let duration = format_duration(entry.duration());
      match &entry.outcome {
        TargetOutcome::Completed => println!(
          "  {} {} ({})",
          symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
          entry.target,
          duration
        ),
        TargetOutcome::Failed(message) => println!(
          "  {} {} ({}): {}",
          symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()),
          entry.target,
          duration,
          message
        ),
      }
    }
    println!();
  }

  print_stat("Build time", &format_duration(result.summary.duration()));

  if result.succeeded {
    print_success("Build succeeded");
  } else {
    for failure in &result.failures {
      print_error(&failure.to_string());
    }
    print_error("Build failed");
  }
}

fn run_json(result: &RunResult) -> serde_json::Value {
  let entries: Vec<_> = result
    .summary
    .entries
    .iter()
    .map(|e| {
      let (outcome, error) = match &e.outcome {
        TargetOutcome::Completed => ("completed", None),
        TargetOutcome::Failed(message) => ("failed", Some(message.as_str())),
      };
      serde_json::json!({
        "target": e.target,
        "outcome": outcome,
        "error": error,
        "duration_ms": e.duration().as_millis() as u64,
      })
    })
    .collect();

  serde_json::json!({
    "succeeded": result.succeeded,
    "exit_code": result.exit_code(),
    "executed": result.executed_order,
    "dependency_executions": result.dependency_executions,
    "unknown_targets": result.unknown_targets,
    "failures": result.failures.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
    "summary": { "duration_ms": result.summary.duration().as_millis() as u64, "entries": entries },
  })
}

/// Map a run exit code onto a process exit code.
pub fn exit_code(code: i32) -> ExitCode {
  match u8::try_from(code) {
    Ok(code) => ExitCode::from(code),
    Err(_) => ExitCode::FAILURE,
  }
}
