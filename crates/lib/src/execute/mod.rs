//! Target resolution and execution.
//!
//! This module provides the [`Scheduler`], the single entry point for running
//! targets. A run:
//! - Picks the requested names (or the registry's default targets)
//! - Validates them against the registry
//! - Resolves every requested target before any action runs
//! - Executes each resolved sequence, sequentially or one concurrent unit per
//!   requested target, running every target at most once
//! - Checks dependency-execution accounting and reports a [`RunResult`]
//!
//! [`RunHooks`] are notified around each of these steps.

pub mod dag;
pub mod hooks;
pub mod resolver;
pub mod summary;
pub mod tracker;
pub mod types;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::context::BuildContext;
use crate::target::{Target, TargetRegistry};

pub use dag::TargetGraph;
pub use hooks::{NoHooks, RunHooks};
pub use resolver::DependencyResolver;
pub use summary::{BuildSummary, SummaryEntry, SummaryReport, TargetOutcome};
pub use tracker::{Claim, ExecutionTracker};
pub use types::{
  ExecuteConfig, ExecuteError, PARALLELISM_ENV, RunOptions, RunResult, SHELL_ENV, TargetState, UnknownTargetPolicy,
};

/// Runs requested targets of a registry against a shared build context.
///
/// The scheduler holds no per-run state; every call to [`run`](Self::run)
/// starts with a fresh tracker and summary, so one scheduler can serve many
/// runs.
pub struct Scheduler {
  registry: Arc<TargetRegistry>,
  context: Arc<BuildContext>,
  config: ExecuteConfig,
  hooks: Arc<dyn RunHooks>,
}

impl Scheduler {
  pub fn new(registry: Arc<TargetRegistry>, context: Arc<BuildContext>, config: ExecuteConfig) -> Self {
    Self {
      registry,
      context,
      config,
      hooks: Arc::new(NoHooks),
    }
  }

  /// Notify `hooks` around every run of this scheduler.
  pub fn with_hooks(mut self, hooks: Arc<dyn RunHooks>) -> Self {
    self.hooks = hooks;
    self
  }

  pub fn registry(&self) -> &TargetRegistry {
    &self.registry
  }

  pub fn context(&self) -> &BuildContext {
    &self.context
  }

  pub fn config(&self) -> &ExecuteConfig {
    &self.config
  }

  /// Run the requested targets, failing on unknown names.
  ///
  /// An empty request runs the registry's default targets.
  pub async fn run<S: AsRef<str>>(&self, requested: &[S], parallel: bool) -> RunResult {
    let options = RunOptions {
      parallel,
      ..RunOptions::default()
    };
    self.run_with(requested, options).await
  }

  /// Run the requested targets with explicit options.
  pub async fn run_with<S: AsRef<str>>(&self, requested: &[S], options: RunOptions) -> RunResult {
    self.hooks.before_build(&self.context).await;

    let requested: Vec<String> = requested.iter().map(|s| s.as_ref().to_string()).collect();
    let result = self.execute(requested, options).await;

    if !result.succeeded {
      self.hooks.on_build_failed(&self.context, &result.failures).await;
    }
    self.hooks.after_build(&self.context, &result).await;

    info!(
      executed = result.executed_order.len(),
      failed = result.failures.len(),
      succeeded = result.succeeded,
      "run complete"
    );

    result
  }

  async fn execute(&self, mut requested: Vec<String>, options: RunOptions) -> RunResult {
    if requested.is_empty() {
      requested = self.registry.default_target_names().to_vec();
      debug!(defaults = ?requested, "no targets requested, using default targets");
    }

    let mut unknown_targets = Vec::new();
    let (all_found, not_found) = self.registry.has_all_targets(&requested);
    if !all_found {
      match options.unknown_targets {
        UnknownTargetPolicy::Fail => {
          error!(targets = ?not_found, "requested targets not found");
          return RunResult::aborted(ExecuteError::TargetNotFound { names: not_found }, Vec::new());
        }
        UnknownTargetPolicy::Warn => {
          warn!(targets = ?not_found, "ignoring unknown targets");
          requested.retain(|name| !not_found.contains(name));
          unknown_targets = not_found;
        }
      }
    }

    let plans = match DependencyResolver::new(&self.registry).resolve_all(&requested) {
      Ok(plans) => plans,
      Err(e) => {
        error!(error = %e, "dependency resolution failed");
        return RunResult::aborted(e, unknown_targets);
      }
    };

    let concurrent = options.parallel && requested.len() > 1;
    info!(requested = ?requested, parallel = concurrent, "starting run");
    self.hooks.before_execution(&self.context, &requested).await;

    let run = Arc::new(Run {
      registry: self.registry.clone(),
      context: self.context.clone(),
      tracker: ExecutionTracker::new(),
      summary: BuildSummary::new(),
      requested: requested.iter().cloned().collect(),
    });

    let mut failures = if concurrent {
      execute_concurrent(&run, &plans, self.config.parallelism).await
    } else {
      execute_sequential(&run, &plans).await
    };

    if failures.is_empty() {
      self.hooks.after_execution(&self.context).await;

      if requested.len() > 1 {
        let expected = expected_dependency_executions(&self.registry, &run.requested);
        let actual = run.tracker.dependency_execution_count();
        failures.extend(accounting_failure(expected, actual));
      }
    }

    RunResult {
      succeeded: failures.is_empty(),
      executed_order: run.tracker.executed(),
      failures,
      unknown_targets,
      dependency_executions: run.tracker.dependency_execution_count(),
      summary: run.summary.report(),
    }
  }
}

impl RunResult {
  /// A run that stopped before any action executed.
  fn aborted(error: ExecuteError, unknown_targets: Vec<String>) -> Self {
    Self {
      succeeded: false,
      executed_order: Vec::new(),
      failures: vec![error],
      unknown_targets,
      dependency_executions: 0,
      summary: SummaryReport::empty(),
    }
  }
}

/// Number of distinct targets reachable from the requested targets through
/// dependency edges, not counting the requested targets themselves.
///
/// Counted from the registry, independently of the resolved plans. After a
/// successful run every such target must have been claimed exactly once as a
/// dependency, so a mismatch means the tracker skipped or repeated a claim.
fn expected_dependency_executions(registry: &TargetRegistry, requested: &HashSet<String>) -> usize {
  let mut seen: HashSet<&str> = HashSet::new();
  let mut pending: Vec<&str> = requested.iter().map(String::as_str).collect();

  while let Some(name) = pending.pop() {
    let Some(target) = registry.get(name) else {
      continue;
    };
    for dep in target.dependencies() {
      if !requested.contains(dep) && seen.insert(dep.as_str()) {
        pending.push(dep.as_str());
      }
    }
  }

  seen.len()
}

fn accounting_failure(expected: usize, actual: usize) -> Option<ExecuteError> {
  if expected == actual {
    return None;
  }
  error!(expected, actual, "dependency execution accounting mismatch");
  Some(ExecuteError::ExecutionAccounting { expected, actual })
}

fn unit_panicked(target: String, e: JoinError) -> ExecuteError {
  error!(unit = %target, error = %e, "unit panicked");
  ExecuteError::UnitPanicked {
    target,
    message: e.to_string(),
  }
}

/// Run every plan in request order, stopping at the first failing unit.
///
/// Each unit runs as its own task so a panicking action is reported like in
/// concurrent runs instead of unwinding through the caller.
async fn execute_sequential(run: &Arc<Run>, plans: &[Vec<String>]) -> Vec<ExecuteError> {
  for plan in plans {
    let Some(unit) = plan.last().cloned() else {
      continue;
    };
    let unit_run = run.clone();
    let unit_plan = plan.clone();

    let failure = match tokio::spawn(async move { unit_run.execute_unit(&unit_plan).await }).await {
      Ok(Ok(())) => continue,
      Ok(Err(e)) => e,
      Err(e) => unit_panicked(unit, e),
    };

    error!(error = %failure, "target failed, stopping run");
    return vec![failure];
  }
  Vec::new()
}

/// Run one unit per plan, at most `parallelism` at a time, and join them all.
async fn execute_concurrent(run: &Arc<Run>, plans: &[Vec<String>], parallelism: usize) -> Vec<ExecuteError> {
  let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
  let mut join_set = JoinSet::new();
  let mut unit_names = HashMap::new();

  for plan in plans {
    let Some(unit) = plan.last().cloned() else {
      continue;
    };
    let plan = plan.clone();
    let run = run.clone();
    let semaphore = semaphore.clone();

    let handle = join_set.spawn(async move {
      // The semaphore is never closed
      let _permit = semaphore.acquire().await.ok();
      run.execute_unit(&plan).await
    });
    debug!(unit = %unit, "dispatched unit");
    unit_names.insert(handle.id(), unit);
  }

  let mut failures = Vec::new();
  while let Some(joined) = join_set.join_next_with_id().await {
    match joined {
      Ok((_, Ok(()))) => {}
      Ok((id, Err(e))) => {
        error!(unit = ?unit_names.get(&id), error = %e, "unit failed");
        failures.push(e);
      }
      Err(e) => {
        let target = unit_names.get(&e.id()).cloned().unwrap_or_default();
        failures.push(unit_panicked(target, e));
      }
    }
  }

  failures
}

/// Per-run state shared by every unit.
struct Run {
  registry: Arc<TargetRegistry>,
  context: Arc<BuildContext>,
  tracker: ExecutionTracker,
  summary: BuildSummary,
  requested: HashSet<String>,
}

impl Run {
  /// Execute one resolved sequence, skipping targets already claimed.
  ///
  /// A target claimed by another unit is waited on so it finishes before its
  /// dependents start.
  async fn execute_unit(&self, plan: &[String]) -> Result<(), ExecuteError> {
    let Some(unit) = plan.last() else {
      return Ok(());
    };

    for name in plan {
      let target = self
        .registry
        .get(name)
        .ok_or_else(|| ExecuteError::TargetNotFound {
          names: vec![name.clone()],
        })?;

      let as_dependency = !self.requested.contains(name);
      match self.tracker.claim(name, as_dependency) {
        Claim::Run => self.execute_target(target).await?,
        Claim::Claimed(rx) => {
          let state = ExecutionTracker::wait(rx).await;
          debug!(target_name = %name, state = %state, "target already executed, skipping");
          if state == TargetState::Failed && name != unit {
            return Err(ExecuteError::DependencyFailed {
              target: unit.clone(),
              dependency: name.clone(),
            });
          }
        }
      }
    }

    Ok(())
  }

  /// Run a claimed target's actions in order, stopping at the first failure.
  async fn execute_target(&self, target: &Target) -> Result<(), ExecuteError> {
    let name = target.name();
    let mut guard = FinishGuard {
      tracker: &self.tracker,
      name,
      finished: false,
    };

    info!(target_name = %name, "executing target");
    let started_at = SystemTime::now();

    let mut outcome = Ok(());
    for action in target.actions() {
      debug!(target_name = %name, action = %action.describe(), "running action");
      if let Err(failure) = action.execute(&self.context).await {
        error!(target_name = %name, action = %action.describe(), error = %failure, "action failed");
        outcome = Err(failure);
        break;
      }
    }

    let finished_at = SystemTime::now();
    let (state, summary_outcome) = match &outcome {
      Ok(()) => (TargetState::Completed, TargetOutcome::Completed),
      Err(failure) => (TargetState::Failed, TargetOutcome::Failed(failure.to_string())),
    };

    self.summary.record(SummaryEntry {
      target: name.to_string(),
      started_at,
      finished_at,
      outcome: summary_outcome,
    });
    guard.finish(state);

    match outcome {
      Ok(()) => {
        info!(target_name = %name, "target completed");
        Ok(())
      }
      Err(failure) => Err(ExecuteError::ActionFailed {
        target: name.to_string(),
        failure,
      }),
    }
  }
}

/// Marks a claimed target `Failed` if its execution is dropped before
/// finishing, so units waiting on it are released.
struct FinishGuard<'a> {
  tracker: &'a ExecutionTracker,
  name: &'a str,
  finished: bool,
}

impl FinishGuard<'_> {
  fn finish(&mut self, state: TargetState) {
    self.tracker.finish(self.name, state);
    self.finished = true;
  }
}

impl Drop for FinishGuard<'_> {
  fn drop(&mut self) {
    if !self.finished {
      self.tracker.finish(self.name, TargetState::Failed);
    }
  }
}
