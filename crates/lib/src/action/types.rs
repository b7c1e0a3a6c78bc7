use thiserror::Error;

/// Failure reported by a single action.
///
/// Carries a human-readable message and an exit-code-like integer so the
/// outermost caller can choose a process exit status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (exit code {exit_code})")]
pub struct ActionFailure {
  pub message: String,
  pub exit_code: i32,
}

impl ActionFailure {
  /// A failure with exit code 1.
  pub fn new(message: impl Into<String>) -> Self {
    Self::with_code(message, 1)
  }

  pub fn with_code(message: impl Into<String>, exit_code: i32) -> Self {
    Self {
      message: message.into(),
      exit_code,
    }
  }
}

/// Outcome of running one action.
pub type ActionOutcome = Result<(), ActionFailure>;
