//! Types for target resolution and execution.
//!
//! This module defines the error taxonomy, run configuration and result
//! types shared by the resolver, tracker and scheduler.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::action::ActionFailure;

use super::summary::SummaryReport;

/// Environment variable overriding [`ExecuteConfig::parallelism`].
pub const PARALLELISM_ENV: &str = "TGRAPH_PARALLELISM";

/// Environment variable overriding [`ExecuteConfig::shell`].
pub const SHELL_ENV: &str = "TGRAPH_SHELL";

/// Errors that can occur while resolving or executing targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteError {
  /// Requested or declared target names are not registered.
  #[error("target {} not found", join_names(names))]
  TargetNotFound { names: Vec<String> },

  /// A dependency cycle was found while resolving `target`.
  #[error("cyclic dependency detected at target '{target}' ({})", path.join(" -> "))]
  CyclicDependency { target: String, path: Vec<String> },

  /// An action of `target` failed.
  #[error("target '{target}' failed: {failure}")]
  ActionFailed { target: String, failure: ActionFailure },

  /// `dependency` failed in another unit, so `target` could not run.
  #[error("target '{target}' skipped: dependency '{dependency}' failed")]
  DependencyFailed { target: String, dependency: String },

  /// Dependency-only executions disagree with the resolved graph.
  #[error("wrong number of target dependencies were run: expected {expected}, got {actual}")]
  ExecutionAccounting { expected: usize, actual: usize },

  /// A unit panicked or was aborted.
  #[error("unit for target '{target}' did not complete: {message}")]
  UnitPanicked { target: String, message: String },
}

impl ExecuteError {
  /// Process exit code an outermost caller should use for this error.
  pub fn exit_code(&self) -> i32 {
    match self {
      ExecuteError::TargetNotFound { .. } | ExecuteError::ExecutionAccounting { .. } => 3,
      ExecuteError::ActionFailed { failure, .. } if failure.exit_code != 0 => failure.exit_code,
      ExecuteError::UnitPanicked { .. } => 2,
      _ => 1,
    }
  }

  /// Whether the error is raised before any action runs.
  pub fn is_resolution_error(&self) -> bool {
    matches!(
      self,
      ExecuteError::TargetNotFound { .. } | ExecuteError::CyclicDependency { .. }
    )
  }
}

fn join_names(names: &[String]) -> String {
  names.join(" and ")
}

/// Lifecycle of a target within one run.
///
/// The resolver marks a target `Resolving` while it expands the target's
/// dependencies; reaching a `Resolving` target again is a cycle. The tracker
/// records `Running` and the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
  Pending,
  Resolving,
  Running,
  Completed,
  Failed,
}

impl TargetState {
  pub fn is_terminal(self) -> bool {
    matches!(self, TargetState::Completed | TargetState::Failed)
  }
}

impl fmt::Display for TargetState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      TargetState::Pending => "pending",
      TargetState::Resolving => "resolving",
      TargetState::Running => "running",
      TargetState::Completed => "completed",
      TargetState::Failed => "failed",
    };
    f.write_str(s)
  }
}

/// What to do with requested names that are not registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTargetPolicy {
  /// Fail the run before any action executes.
  #[default]
  Fail,
  /// Log a warning, drop the unknown names and run the rest.
  Warn,
}

/// Per-invocation run options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
  /// Dispatch each requested target as its own concurrent unit.
  pub parallel: bool,
  pub unknown_targets: UnknownTargetPolicy,
}

impl RunOptions {
  pub fn sequential() -> Self {
    Self::default()
  }

  pub fn parallel() -> Self {
    Self {
      parallel: true,
      ..Self::default()
    }
  }
}

/// Configuration for target execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteConfig {
  /// Maximum number of concurrently running units.
  pub parallelism: usize,

  /// Shell for command actions.
  /// If None, uses /bin/sh (Unix) or powershell.exe (Windows).
  pub shell: Option<String>,

  /// Project root; defaults to the process working directory.
  pub working_dir: Option<PathBuf>,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      shell: None,
      working_dir: None,
    }
  }
}

impl ExecuteConfig {
  /// Defaults overlaid with `TGRAPH_PARALLELISM` and `TGRAPH_SHELL`.
  ///
  /// Unparseable or zero parallelism values are ignored.
  pub fn from_env() -> Self {
    let mut config = Self::default();

    if let Ok(value) = std::env::var(PARALLELISM_ENV) {
      match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => config.parallelism = n,
        _ => tracing::warn!(value = %value, "ignoring invalid {}", PARALLELISM_ENV),
      }
    }

    if let Ok(shell) = std::env::var(SHELL_ENV)
      && !shell.trim().is_empty()
    {
      config.shell = Some(shell);
    }

    config
  }
}

fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// Outcome of one call to [`Scheduler::run`](super::Scheduler::run).
#[derive(Debug, Clone)]
pub struct RunResult {
  /// True when every unit completed and the post-run check passed.
  pub succeeded: bool,

  /// Names of targets that actually executed, in the order they started.
  pub executed_order: Vec<String>,

  /// Every failure collected from every unit.
  pub failures: Vec<ExecuteError>,

  /// Requested names dropped under [`UnknownTargetPolicy::Warn`].
  pub unknown_targets: Vec<String>,

  /// Executions triggered because another target depended on them.
  pub dependency_executions: usize,

  pub summary: SummaryReport,
}

impl RunResult {
  /// The first collected failure, if any.
  pub fn failure(&self) -> Option<&ExecuteError> {
    self.failures.first()
  }

  /// Exit code for the run: 0 on success, otherwise the first failure's code.
  pub fn exit_code(&self) -> i32 {
    self.failure().map(ExecuteError::exit_code).unwrap_or(0)
  }

  /// Whether `name` executed during the run.
  pub fn executed(&self, name: &str) -> bool {
    self.executed_order.iter().any(|n| n == name)
  }
}
