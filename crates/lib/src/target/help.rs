//! Read-only help queries over the registry.

use serde::Serialize;

use super::{RegistryError, TargetRegistry};

/// One row of the target listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
  pub name: String,
  pub description: Option<String>,
  pub hidden: bool,
}

/// Detailed help for a single target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetHelp {
  pub name: String,
  pub description: Option<String>,
  pub dependencies: Vec<String>,
  pub actions: Vec<String>,
  pub hidden: bool,
}

impl TargetRegistry {
  /// Non-hidden targets in registration order.
  pub fn list_targets(&self) -> Vec<TargetInfo> {
    self.list_all_targets(false)
  }

  /// Targets in registration order, optionally including hidden ones.
  pub fn list_all_targets(&self, include_hidden: bool) -> Vec<TargetInfo> {
    self
      .iter()
      .filter(|t| include_hidden || !t.is_hidden())
      .map(|t| TargetInfo {
        name: t.name().to_string(),
        description: t.description().map(str::to_string),
        hidden: t.is_hidden(),
      })
      .collect()
  }

  /// Description and direct dependencies of one target.
  ///
  /// # Errors
  ///
  /// Returns `TargetNotFound` if no target has that name.
  pub fn describe_target(&self, name: &str) -> Result<TargetHelp, RegistryError> {
    let target = self
      .get(name)
      .ok_or_else(|| RegistryError::TargetNotFound(name.to_string()))?;

    Ok(TargetHelp {
      name: target.name().to_string(),
      description: target.description().map(str::to_string),
      dependencies: target.dependencies().to_vec(),
      actions: target.actions().iter().map(|a| a.describe()).collect(),
      hidden: target.is_hidden(),
    })
  }
}
