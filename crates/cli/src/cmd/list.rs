//! Implementation of the `tg list` command.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use tgraph_lib::target::{TargetInfo, TargetRegistry};

use super::load_project;
use crate::output::{OutputFormat, print_info, print_json};

pub fn cmd_list(file: &Path, all: bool, output: OutputFormat) -> Result<()> {
  let project = load_project(file)?;
  print_targets(&project.registry, all, output)
}

/// Print the target listing; also used when a run has nothing to do.
pub fn print_targets(registry: &TargetRegistry, all: bool, output: OutputFormat) -> Result<()> {
  let targets = registry.list_all_targets(all);

  if output.is_json() {
    let json_output = serde_json::json!({
      "targets": targets,
      "default_targets": registry.default_target_names(),
    });
    return print_json(&json_output);
  }

  if targets.is_empty() {
    print_info("No targets defined.");
    return Ok(());
  }

  println!("Targets:");
  print_rows(&targets);

  if !registry.default_target_names().is_empty() {
    println!();
    println!("Default targets: {}", registry.default_target_names().join(", "));
  }

  Ok(())
}

fn print_rows(targets: &[TargetInfo]) {
  let width = targets.iter().map(|t| t.name.len()).max().unwrap_or(0);
  for target in targets {
    let description = target.description.as_deref().unwrap_or("");
    let hidden = if target.hidden { " (hidden)" } else { "" };
    let name = format!("{:width$}", target.name, width = width);
    println!(
      "  {}  {}{}",
      name.if_supports_color(Stream::Stdout, |s| s.bold()),
      description,
      hidden.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}
