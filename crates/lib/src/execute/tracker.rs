//! Per-run execution tracking.
//!
//! The tracker is the only state shared and mutated by concurrent units. Its
//! check-and-mark primitive, [`ExecutionTracker::claim`], decides under a
//! single lock whether the caller owns a target's execution, so a target
//! reachable from several units runs exactly once. Each claimed target gets a
//! `watch` channel so other units can wait for it to reach a terminal state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::trace;

use super::types::TargetState;

/// Result of [`ExecutionTracker::claim`].
#[derive(Debug)]
pub enum Claim {
  /// The caller owns the target and must call [`ExecutionTracker::finish`].
  Run,
  /// Another caller already claimed the target.
  Claimed(watch::Receiver<TargetState>),
}

#[derive(Debug, Default)]
struct TrackerState {
  targets: HashMap<String, watch::Sender<TargetState>>,
  order: Vec<String>,
  dependency_executions: usize,
}

/// Executed-set, execution order and dependency-execution count of one run.
#[derive(Debug, Default)]
pub struct ExecutionTracker {
  state: Mutex<TrackerState>,
}

impl ExecutionTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Atomically check whether `name` has been claimed and, if not, mark it
  /// `Running` for the caller.
  ///
  /// `as_dependency` records that the execution happens because another
  /// target depends on `name` rather than because it was requested.
  pub fn claim(&self, name: &str, as_dependency: bool) -> Claim {
    let mut state = self.lock();

    if let Some(tx) = state.targets.get(name) {
      return Claim::Claimed(tx.subscribe());
    }

    let (tx, _) = watch::channel(TargetState::Running);
    state.targets.insert(name.to_string(), tx);
    state.order.push(name.to_string());
    if as_dependency {
      state.dependency_executions += 1;
    }

    trace!(target_name = %name, as_dependency, "claimed target");
    Claim::Run
  }

  /// Record the terminal state of a target claimed with [`claim`](Self::claim).
  pub fn finish(&self, name: &str, outcome: TargetState) {
    debug_assert!(outcome.is_terminal());

    let state = self.lock();
    if let Some(tx) = state.targets.get(name) {
      tx.send_replace(outcome);
    }
  }

  /// Wait until a target claimed elsewhere reaches a terminal state.
  pub async fn wait(mut rx: watch::Receiver<TargetState>) -> TargetState {
    match rx.wait_for(|s| s.is_terminal()).await {
      Ok(state) => *state,
      // The sender lives as long as the tracker
      Err(_) => TargetState::Failed,
    }
  }

  /// Current state of `name`; `Pending` if it was never claimed.
  pub fn state(&self, name: &str) -> TargetState {
    self
      .lock()
      .targets
      .get(name)
      .map(|tx| *tx.borrow())
      .unwrap_or(TargetState::Pending)
  }

  /// Whether `name` has been claimed in this run.
  pub fn is_executed(&self, name: &str) -> bool {
    self.lock().targets.contains_key(name)
  }

  /// Claimed targets in claim order.
  pub fn executed(&self) -> Vec<String> {
    self.lock().order.clone()
  }

  pub fn dependency_execution_count(&self) -> usize {
    self.lock().dependency_executions
  }

  fn lock(&self) -> MutexGuard<'_, TrackerState> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
