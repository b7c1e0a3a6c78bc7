//! Implementation of the `tg describe` command.

use std::path::Path;

use anyhow::Result;

use tgraph_lib::target::TargetRegistry;

use super::load_project;
use crate::output::{OutputFormat, print_json, print_stat, print_success, symbols};

pub fn cmd_describe(file: &Path, name: &str, output: OutputFormat) -> Result<()> {
  let project = load_project(file)?;
  print_target_help(&project.registry, name, output)
}

/// Print a target's description, dependencies and actions.
pub fn print_target_help(registry: &TargetRegistry, name: &str, output: OutputFormat) -> Result<()> {
  let help = registry.describe_target(name)?;

  if output.is_json() {
    return print_json(&help);
  }

  print_success(&format!("Target: {}", help.name));
  print_stat("Description", help.description.as_deref().unwrap_or("(none)"));
  if help.hidden {
    print_stat("Hidden", "yes");
  }

  let deps = if help.dependencies.is_empty() {
    "(none)".to_string()
  } else {
    help.dependencies.join(", ")
  };
  print_stat("Depends on", &deps);

  if !help.actions.is_empty() {
    println!();
    println!("Actions:");
    for action in &help.actions {
      println!("  {} {}", symbols::ARROW, action);
    }
  }

  Ok(())
}
