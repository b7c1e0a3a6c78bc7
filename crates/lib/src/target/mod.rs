//! Target registry.
//!
//! The registry owns every [`Target`] of a build, keyed by unique name and
//! kept in registration order. It is built once during configuration and
//! handed to the scheduler by reference; starting a fresh logical run means
//! calling [`TargetRegistry::reset`] or building a new registry.

mod help;
mod types;

use std::collections::HashMap;

pub use help::{TargetHelp, TargetInfo};
pub use types::{RegistryError, Target};

#[derive(Debug, Default)]
pub struct TargetRegistry {
  targets: Vec<Target>,
  index: HashMap<String, usize>,
  default_targets: Vec<String>,
}

impl TargetRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create and register a new target.
  ///
  /// # Errors
  ///
  /// Returns `DuplicateTarget` if a target with the same name exists.
  pub fn add_target(&mut self, name: impl Into<String>) -> Result<&mut Target, RegistryError> {
    let name = name.into();
    if self.index.contains_key(&name) {
      return Err(RegistryError::DuplicateTarget(name));
    }

    let idx = self.targets.len();
    self.index.insert(name.clone(), idx);
    self.targets.push(Target::new(name));
    Ok(&mut self.targets[idx])
  }

  pub fn get(&self, name: &str) -> Option<&Target> {
    self.index.get(name).map(|&idx| &self.targets[idx])
  }

  pub fn get_mut(&mut self, name: &str) -> Option<&mut Target> {
    self.index.get(name).map(|&idx| &mut self.targets[idx])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  /// Check that every name is registered.
  ///
  /// Returns whether all were found, plus the missing names in request order
  /// (without repeats).
  pub fn has_all_targets<S: AsRef<str>>(&self, names: &[S]) -> (bool, Vec<String>) {
    let mut not_found: Vec<String> = Vec::new();
    for name in names {
      let name = name.as_ref();
      if !self.contains(name) && !not_found.iter().any(|n| n == name) {
        not_found.push(name.to_string());
      }
    }
    (not_found.is_empty(), not_found)
  }

  /// Drop every target and default target.
  pub fn reset(&mut self) {
    self.targets.clear();
    self.index.clear();
    self.default_targets.clear();
  }

  /// Declare the targets run when the caller requests none.
  pub fn set_default_targets<I, S>(&mut self, names: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.default_targets = names.into_iter().map(Into::into).collect();
  }

  pub fn default_target_names(&self) -> &[String] {
    &self.default_targets
  }

  /// Registered default targets, in declaration order.
  ///
  /// Names that were declared as defaults but never registered are skipped;
  /// the scheduler reports them through [`default_target_names`](Self::default_target_names).
  pub fn default_targets(&self) -> Vec<&Target> {
    self.default_targets.iter().filter_map(|name| self.get(name)).collect()
  }

  /// All targets in registration order.
  pub fn iter(&self) -> impl Iterator<Item = &Target> {
    self.targets.iter()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }
}
