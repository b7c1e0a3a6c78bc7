//! JSON build files.
//!
//! A build file declares targets, their dependencies and built-in actions,
//! plus default targets and initial properties. Loading it populates a
//! [`TargetRegistry`] and seeds a [`BuildContext`].

mod types;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::context::BuildContext;
use crate::target::{RegistryError, TargetRegistry};

pub use types::{ActionDef, BuildFile, TargetDef};

/// Build file looked up in the working directory when none is given.
pub const DEFAULT_BUILD_FILE: &str = "tgraph.json";

#[derive(Debug, Error)]
pub enum BuildFileError {
  #[error("failed to read build file {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse build file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error(transparent)]
  Registry(#[from] RegistryError),
}

impl BuildFileError {
  /// Whether the build file does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(self, BuildFileError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
  }
}

/// Read and parse a build file.
pub fn load(path: &Path) -> Result<BuildFile, BuildFileError> {
  let content = fs::read_to_string(path).map_err(|source| BuildFileError::Io {
    path: path.to_path_buf(),
    source,
  })?;

  let file: BuildFile = serde_json::from_str(&content).map_err(|source| BuildFileError::Parse {
    path: path.to_path_buf(),
    source,
  })?;

  debug!(path = ?path, targets = file.targets.len(), "loaded build file");
  Ok(file)
}

impl BuildFile {
  /// Parse a build file from a JSON string.
  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }

  /// Register every declared target and default target.
  ///
  /// Dependencies are not checked here; unknown names surface at resolution.
  ///
  /// # Errors
  ///
  /// Returns `DuplicateTarget` if a name is declared twice or already exists
  /// in `registry`.
  pub fn configure_registry(&self, registry: &mut TargetRegistry) -> Result<(), BuildFileError> {
    for def in &self.targets {
      let target = registry.add_target(def.name.clone())?;
      if let Some(description) = &def.description {
        target.set_description(description.clone());
      }
      if def.hidden {
        target.set_as_hidden();
      }
      target.depends_on(def.depends_on.iter().cloned());
      for action in &def.actions {
        target.add_shared_action(action.to_action());
      }
    }

    if !self.default_targets.is_empty() {
      registry.set_default_targets(self.default_targets.iter().cloned());
    }
    Ok(())
  }

  /// Write the declared properties into the context, overriding defaults.
  pub fn apply_properties(&self, ctx: &BuildContext) {
    for (key, value) in &self.properties {
      ctx.set(key.clone(), value.clone());
    }
  }

  /// Build a fresh registry from this file.
  pub fn to_registry(&self) -> Result<TargetRegistry, BuildFileError> {
    let mut registry = TargetRegistry::new();
    self.configure_registry(&mut registry)?;
    Ok(registry)
  }
}
