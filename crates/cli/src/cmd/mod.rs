mod check;
mod describe;
mod list;
mod run;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use tgraph_lib::buildfile;
use tgraph_lib::context::BuildContext;
use tgraph_lib::execute::ExecuteConfig;
use tgraph_lib::target::TargetRegistry;

pub use check::cmd_check;
pub use describe::cmd_describe;
pub use list::cmd_list;
pub use run::{RunArgs, cmd_run, exit_code};

/// A loaded build file: the populated registry and its build context.
pub struct Project {
  pub registry: Arc<TargetRegistry>,
  pub context: Arc<BuildContext>,
  pub config: ExecuteConfig,
}

/// Load a build file and prepare the registry and context.
///
/// The project root is the directory holding the build file.
pub fn load_project(file: &Path) -> Result<Project> {
  let build_file = buildfile::load(file).with_context(|| format!("Failed to load build file: {}", file.display()))?;

  let mut config = ExecuteConfig::from_env();
  config.working_dir = Some(project_root(file)?);

  let registry = build_file.to_registry().context("Invalid build file")?;
  let context = BuildContext::from_config(&config);
  build_file.apply_properties(&context);

  debug!(file = %file.display(), targets = registry.len(), "loaded project");

  Ok(Project {
    registry: Arc::new(registry),
    context: Arc::new(context),
    config,
  })
}

fn project_root(file: &Path) -> Result<PathBuf> {
  let parent = match file.parent() {
    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
    _ => PathBuf::from("."),
  };
  parent
    .canonicalize()
    .with_context(|| format!("Failed to resolve project directory: {}", parent.display()))
}
