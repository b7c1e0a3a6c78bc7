use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::action::{Action, ActionOutcome, FnAction};
use crate::context::BuildContext;

/// Errors raised by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  /// Two targets were registered under the same name.
  #[error("target '{0}' is already defined")]
  DuplicateTarget(String),

  /// A queried target does not exist.
  #[error("target '{0}' not found")]
  TargetNotFound(String),
}

impl RegistryError {
  /// Process exit code for the error, matching an unknown target in a run.
  pub fn exit_code(&self) -> i32 {
    match self {
      RegistryError::TargetNotFound(_) => 3,
      RegistryError::DuplicateTarget(_) => 1,
    }
  }
}

/// A named unit of work with dependencies and an ordered list of actions.
///
/// Dependencies are stored by name and only checked against the registry at
/// resolution time, so targets may be declared in any order.
pub struct Target {
  name: String,
  description: Option<String>,
  hidden: bool,
  actions: Vec<Arc<dyn Action>>,
  dependencies: Vec<String>,
}

impl Target {
  pub(crate) fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      description: None,
      hidden: false,
      actions: Vec::new(),
      dependencies: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn is_hidden(&self) -> bool {
    self.hidden
  }

  pub fn actions(&self) -> &[Arc<dyn Action>] {
    &self.actions
  }

  /// Declared dependency names, in declaration order.
  pub fn dependencies(&self) -> &[String] {
    &self.dependencies
  }

  pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
    self.description = Some(description.into());
    self
  }

  /// Exclude the target from the default help listing.
  pub fn set_as_hidden(&mut self) -> &mut Self {
    self.hidden = true;
    self
  }

  /// Declare dependencies on other targets by name.
  ///
  /// Repeated names are ignored; the first declaration keeps its position.
  pub fn depends_on<I, S>(&mut self, names: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    for name in names {
      let name = name.into();
      if !self.dependencies.contains(&name) {
        self.dependencies.push(name);
      }
    }
    self
  }

  pub fn add_action(&mut self, action: impl Action + 'static) -> &mut Self {
    self.actions.push(Arc::new(action));
    self
  }

  /// Add an already shared action.
  pub fn add_shared_action(&mut self, action: Arc<dyn Action>) -> &mut Self {
    self.actions.push(action);
    self
  }

  /// Add arbitrary logic as an action.
  pub fn do_fn<F>(&mut self, label: impl Into<String>, f: F) -> &mut Self
  where
    F: Fn(&BuildContext) -> ActionOutcome + Send + Sync + 'static,
  {
    self.add_action(FnAction::new(label, f))
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("name", &self.name)
      .field("description", &self.description)
      .field("hidden", &self.hidden)
      .field("actions", &self.actions.iter().map(|a| a.describe()).collect::<Vec<_>>())
      .field("dependencies", &self.dependencies)
      .finish()
  }
}
