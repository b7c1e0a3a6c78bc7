//! Shared build context handed to every action.
//!
//! The context carries the key-value property store that actions read and
//! write, plus the execution settings (working directory, shell override)
//! that built-in actions need. A single context is shared by every unit of a
//! run, so all access goes through interior locking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::execute::ExecuteConfig;

/// Well-known property keys seeded by [`BuildContext::with_defaults`].
pub mod props {
  /// Absolute path of the project root.
  pub const PRODUCT_ROOT_DIR: &str = "product_root_dir";
  /// Build directory, relative to the project root unless absolute.
  pub const BUILD_DIR: &str = "build_dir";
  /// Output directory, relative to the project root unless absolute.
  pub const OUTPUT_DIR: &str = "output_dir";
  /// Operating system family (`linux`, `macos`, `windows`, ...).
  pub const OS_PLATFORM: &str = "os_platform";
}

/// Property store and execution settings for one build.
#[derive(Debug)]
pub struct BuildContext {
  properties: RwLock<BTreeMap<String, String>>,
  working_dir: PathBuf,
  shell: Option<String>,
}

impl BuildContext {
  /// Create an empty context rooted at `working_dir`.
  pub fn new(working_dir: impl Into<PathBuf>) -> Self {
    Self {
      properties: RwLock::new(BTreeMap::new()),
      working_dir: working_dir.into(),
      shell: None,
    }
  }

  /// Create a context with the default build properties already set.
  pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    let ctx = Self::new(root.clone());
    ctx.set(props::PRODUCT_ROOT_DIR, root.to_string_lossy());
    ctx.set(props::BUILD_DIR, "build");
    ctx.set(props::OUTPUT_DIR, "output");
    ctx.set(props::OS_PLATFORM, std::env::consts::OS);
    ctx
  }

  /// Create a context from an execution config.
  ///
  /// Uses the config's working directory (or the process working directory)
  /// as the project root and carries over the shell override.
  pub fn from_config(config: &ExecuteConfig) -> Self {
    let root = config
      .working_dir
      .clone()
      .or_else(|| std::env::current_dir().ok())
      .unwrap_or_else(|| PathBuf::from("."));
    Self::with_defaults(root).with_shell(config.shell.clone())
  }

  /// Override the shell used by command actions.
  pub fn with_shell(mut self, shell: Option<String>) -> Self {
    self.shell = shell;
    self
  }

  pub fn get(&self, key: &str) -> Option<String> {
    self.read().get(key).cloned()
  }

  pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
    self.write().insert(key.into(), value.into());
  }

  pub fn contains(&self, key: &str) -> bool {
    self.read().contains_key(key)
  }

  /// Remove a property, returning its previous value.
  pub fn remove(&self, key: &str) -> Option<String> {
    self.write().remove(key)
  }

  /// Copy of every property, sorted by key.
  pub fn snapshot(&self) -> BTreeMap<String, String> {
    self.read().clone()
  }

  pub fn working_dir(&self) -> &Path {
    &self.working_dir
  }

  pub fn shell(&self) -> Option<&str> {
    self.shell.as_deref()
  }

  /// Resolve a property holding a path against the working directory.
  pub fn resolve_path_property(&self, key: &str) -> Option<PathBuf> {
    let value = self.get(key)?;
    let path = PathBuf::from(value);
    if path.is_absolute() {
      Some(path)
    } else {
      Some(self.working_dir.join(path))
    }
  }

  fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, String>> {
    self.properties.read().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>> {
    self.properties.write().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
