//! Implementation of the `tg check` command.
//!
//! Validates the whole build file at once: every dependency name must be
//! registered and the dependency graph must be acyclic.

use std::path::Path;

use anyhow::{Context, Result};

use tgraph_lib::execute::TargetGraph;

use super::load_project;
use crate::output::{print_info, print_success};

pub fn cmd_check(file: &Path, verbose: bool) -> Result<()> {
  let project = load_project(file)?;

  let graph = TargetGraph::from_registry(&project.registry).context("Build file check failed")?;

  let (all_found, missing) = project.registry.has_all_targets(project.registry.default_target_names());
  if !all_found {
    anyhow::bail!("Default targets not defined: {}", missing.join(", "));
  }

  print_success(&format!("{} targets, no unknown dependencies or cycles", graph.len()));

  if verbose {
    for (idx, wave) in graph.waves().iter().enumerate() {
      print_info(&format!("wave {}: {}", idx + 1, wave.join(", ")));
    }
  }

  Ok(())
}
