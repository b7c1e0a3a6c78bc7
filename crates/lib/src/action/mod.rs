//! Target actions.
//!
//! An action is the unit of work a target performs. The engine treats every
//! action uniformly through the [`Action`] capability: given the shared
//! [`BuildContext`], run and report success or an [`ActionFailure`]. Tool
//! wrappers adapt to this one trait rather than being special-cased.
//!
//! # Action Types
//!
//! - [`FnAction`] - arbitrary logic supplied as a closure
//! - [`CmdAction`] - a shell command, with `$${prop:KEY}` placeholders
//! - [`SetPropertyAction`] - write a build property

pub mod actions;
mod types;

pub use types::*;

use async_trait::async_trait;

use crate::context::BuildContext;
use crate::placeholder::PlaceholderError;

pub use actions::cmd::CmdAction;
pub use actions::property::SetPropertyAction;

#[async_trait]
pub trait Action: Send + Sync {
  /// Run the action against the shared build context.
  async fn execute(&self, ctx: &BuildContext) -> ActionOutcome;

  /// Short human-readable label for logs and help output.
  fn describe(&self) -> String {
    "action".to_string()
  }
}

/// An action backed by a closure.
pub struct FnAction<F> {
  label: String,
  f: F,
}

impl<F> FnAction<F>
where
  F: Fn(&BuildContext) -> ActionOutcome + Send + Sync,
{
  pub fn new(label: impl Into<String>, f: F) -> Self {
    Self { label: label.into(), f }
  }
}

#[async_trait]
impl<F> Action for FnAction<F>
where
  F: Fn(&BuildContext) -> ActionOutcome + Send + Sync,
{
  async fn execute(&self, ctx: &BuildContext) -> ActionOutcome {
    (self.f)(ctx)
  }

  fn describe(&self) -> String {
    self.label.clone()
  }
}

impl From<PlaceholderError> for ActionFailure {
  fn from(err: PlaceholderError) -> Self {
    ActionFailure::new(format!("placeholder error: {err}"))
  }
}
