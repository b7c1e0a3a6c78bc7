//! Build summary.
//!
//! Every target execution appends one entry. Appends come from concurrent
//! units, so the live summary is behind a mutex; [`BuildSummary::report`]
//! produces the read-only [`SummaryReport`] attached to the run result.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

/// How a target execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
  Completed,
  Failed(String),
}

impl TargetOutcome {
  pub fn is_success(&self) -> bool {
    matches!(self, TargetOutcome::Completed)
  }
}

/// One executed target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
  pub target: String,
  pub started_at: SystemTime,
  pub finished_at: SystemTime,
  pub outcome: TargetOutcome,
}

impl SummaryEntry {
  pub fn duration(&self) -> Duration {
    self.finished_at.duration_since(self.started_at).unwrap_or_default()
  }
}

/// Append-only summary of one run.
#[derive(Debug)]
pub struct BuildSummary {
  started_at: SystemTime,
  entries: Mutex<Vec<SummaryEntry>>,
}

impl Default for BuildSummary {
  fn default() -> Self {
    Self::new()
  }
}

impl BuildSummary {
  /// Start a summary; the run's start time is now.
  pub fn new() -> Self {
    Self {
      started_at: SystemTime::now(),
      entries: Mutex::new(Vec::new()),
    }
  }

  pub fn record(&self, entry: SummaryEntry) {
    self.lock().push(entry);
  }

  /// Number of entries recorded so far.
  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  /// Freeze the summary; the run's end time is now.
  pub fn report(&self) -> SummaryReport {
    SummaryReport {
      started_at: self.started_at,
      finished_at: SystemTime::now(),
      entries: self.lock().clone(),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Vec<SummaryEntry>> {
    self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

/// Read-only summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryReport {
  pub started_at: SystemTime,
  pub finished_at: SystemTime,
  /// Entries in the order their targets finished.
  pub entries: Vec<SummaryEntry>,
}

impl SummaryReport {
  /// An empty report for runs that never reached execution.
  pub fn empty() -> Self {
    let now = SystemTime::now();
    Self {
      started_at: now,
      finished_at: now,
      entries: Vec::new(),
    }
  }

  pub fn duration(&self) -> Duration {
    self.finished_at.duration_since(self.started_at).unwrap_or_default()
  }

  pub fn entry(&self, target: &str) -> Option<&SummaryEntry> {
    self.entries.iter().find(|e| e.target == target)
  }

  pub fn failed(&self) -> impl Iterator<Item = &SummaryEntry> {
    self.entries.iter().filter(|e| !e.outcome.is_success())
  }
}

impl fmt::Display for SummaryReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.entries.is_empty() {
      writeln!(f, "No targets executed.")?;
    } else {
      let width = self.entries.iter().map(|e| e.target.len()).max().unwrap_or(0);
      writeln!(f, "Target{:pad$}  Duration  Result", "", pad = width.saturating_sub(6))?;
      for entry in &self.entries {
        let result = match &entry.outcome {
          TargetOutcome::Completed => "Done".to_string(),
          TargetOutcome::Failed(msg) => format!("Failed: {msg}"),
        };
        writeln!(
          f,
          "{:width$}  {:>8}  {}",
          entry.target,
          format!("{}ms", entry.duration().as_millis()),
          result,
          width = width.max(6)
        )?;
      }
    }
    write!(f, "Build time: {}ms", self.duration().as_millis())
  }
}
